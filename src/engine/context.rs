// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::{Evaluation, NodeResult};
use crate::identifier::Identifier;
use crate::value::Value;

/// Values supplied by the caller for one evaluation pass.
pub type RawInputs = BTreeMap<Identifier, Value>;

/// Whether results may be carried across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Every pass starts from an empty cache.
    #[default]
    PerPass,
    /// A pass whose raw inputs and registry generation equal the previous
    /// pass returns the previous results through a [`PassMemo`].
    ReuseIdenticalInputs,
}

/// Per-pass state: the caller's raw inputs and the results computed so far.
///
/// Created fresh for every evaluation and dropped at the end of it.
#[derive(Debug)]
pub struct ExecutionContext<'a> {
    raw_inputs: &'a RawInputs,
    cache: BTreeMap<Identifier, NodeResult>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(raw_inputs: &'a RawInputs) -> Self {
        Self {
            raw_inputs,
            cache: BTreeMap::new(),
        }
    }

    /// Looks an input up in the raw inputs first, then in the results of
    /// nodes already executed in this pass.
    pub fn resolve(&self, id: &Identifier) -> Option<Value> {
        self.raw_inputs
            .get(id)
            .or_else(|| self.cache.get(id).map(|r| &r.value))
            .cloned()
    }

    pub fn raw_input(&self, id: &Identifier) -> Option<&Value> {
        self.raw_inputs.get(id)
    }

    pub fn record(&mut self, id: Identifier, result: NodeResult) {
        self.cache.insert(id, result);
    }

    pub fn into_results(self) -> BTreeMap<Identifier, NodeResult> {
        self.cache
    }
}

/// Caller-owned memo of the last pass, used with
/// [`CachePolicy::ReuseIdenticalInputs`].
#[derive(Debug, Default)]
pub struct PassMemo {
    last: Option<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    generation: u64,
    raw_inputs: RawInputs,
    evaluation: Evaluation,
}

impl PassMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized evaluation, if it was produced for this generation and
    /// exactly these raw inputs.
    pub fn lookup(&self, generation: u64, raw_inputs: &RawInputs) -> Option<&Evaluation> {
        self.last
            .as_ref()
            .filter(|entry| entry.generation == generation && &entry.raw_inputs == raw_inputs)
            .map(|entry| &entry.evaluation)
    }

    pub fn store(&mut self, generation: u64, raw_inputs: RawInputs, evaluation: Evaluation) {
        self.last = Some(MemoEntry {
            generation,
            raw_inputs,
            evaluation,
        });
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    #[test]
    fn test_resolve_prefers_raw_inputs() {
        let raw = RawInputs::from([(id("110^0-000"), Value::Integer(7))]);
        let mut ctx = ExecutionContext::new(&raw);
        ctx.record(id("110^0-000"), NodeResult::success(Value::Integer(1)));
        ctx.record(id("110^1-000"), NodeResult::success(Value::Integer(2)));

        assert_eq!(ctx.resolve(&id("110^0-000")), Some(Value::Integer(7)));
        assert_eq!(ctx.resolve(&id("110^1-000")), Some(Value::Integer(2)));
        assert_eq!(ctx.resolve(&id("110^2-000")), None);
    }

    #[test]
    fn test_memo_matches_generation_and_inputs() {
        let raw = RawInputs::from([(id("110^0-000"), Value::Integer(7))]);
        let mut memo = PassMemo::new();
        assert!(memo.lookup(1, &raw).is_none());

        memo.store(1, raw.clone(), Evaluation::default());
        assert!(memo.lookup(1, &raw).is_some());
        assert!(memo.lookup(2, &raw).is_none());

        let changed = RawInputs::from([(id("110^0-000"), Value::Integer(8))]);
        assert!(memo.lookup(1, &changed).is_none());

        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn test_memo_never_matches_nan_inputs() {
        let raw = RawInputs::from([
            (id("110^0-000"), Value::Integer(7)),
            (id("110^0-001"), Value::Number(f64::NAN)),
        ]);
        let mut memo = PassMemo::new();
        memo.store(1, raw.clone(), Evaluation::default());

        assert!(!memo.is_empty());
        assert!(memo.lookup(1, &raw).is_none());
    }

    #[test]
    fn test_cache_policy_serde_names() {
        let policy: CachePolicy = serde_yaml::from_str("reuse_identical_inputs").unwrap();
        assert_eq!(policy, CachePolicy::ReuseIdenticalInputs);
        assert_eq!(CachePolicy::default(), CachePolicy::PerPass);
    }
}
