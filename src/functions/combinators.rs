// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The fixed combinator set used as node bodies.
//!
//! Every combinator is a pure function over an ordered slice of input values.
//! A call with fewer inputs than the declared arity returns
//! [`SHORT_CALL_DEFAULT`] instead of failing; inputs beyond the arity are
//! ignored.
//!
//! ```
//! use pkg_dag::functions::Combinator;
//! use pkg_dag::value::Value;
//!
//! let max = Combinator::MaxSelect { arity: 2 };
//! let out = max.apply(&[Value::Integer(1), Value::Integer(3)]).unwrap();
//! assert_eq!(out, Value::Integer(3));
//! ```

use crate::errors::FunctionError;
use crate::value::Value;

/// Result of any combinator called with fewer inputs than its arity.
pub const SHORT_CALL_DEFAULT: Value = Value::Integer(0);

#[derive(Debug, Clone, PartialEq)]
pub enum Combinator {
    /// Largest input wins. Returns the winning input unchanged; the first
    /// maximal input wins ties.
    MaxSelect { arity: usize },
    /// Smallest input wins.
    MinSelect { arity: usize },
    /// `(condition, if_true, if_false)`.
    ConditionalSelect,
    LogicalOr { arity: usize },
    LogicalAnd { arity: usize },
    /// Number of inputs numerically equal to `target`.
    CountEquals { arity: usize, target: f64 },
    Sign,
    Sum { arity: usize },
}

impl Combinator {
    pub fn arity(&self) -> usize {
        match self {
            Combinator::MaxSelect { arity }
            | Combinator::MinSelect { arity }
            | Combinator::LogicalOr { arity }
            | Combinator::LogicalAnd { arity }
            | Combinator::CountEquals { arity, .. }
            | Combinator::Sum { arity } => *arity,
            Combinator::ConditionalSelect => 3,
            Combinator::Sign => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Combinator::MaxSelect { .. } => "max_select",
            Combinator::MinSelect { .. } => "min_select",
            Combinator::ConditionalSelect => "conditional_select",
            Combinator::LogicalOr { .. } => "logical_or",
            Combinator::LogicalAnd { .. } => "logical_and",
            Combinator::CountEquals { .. } => "count_equals",
            Combinator::Sign => "sign",
            Combinator::Sum { .. } => "sum",
        }
    }

    pub fn apply(&self, inputs: &[Value]) -> Result<Value, FunctionError> {
        let arity = self.arity();
        if inputs.len() < arity {
            return Ok(SHORT_CALL_DEFAULT);
        }
        let inputs = &inputs[..arity];

        match self {
            Combinator::MaxSelect { .. } => select(inputs, |candidate, best| candidate > best),
            Combinator::MinSelect { .. } => select(inputs, |candidate, best| candidate < best),
            Combinator::ConditionalSelect => {
                numeric(0, &inputs[0])?;
                if inputs[0].is_truthy() {
                    Ok(inputs[1].clone())
                } else {
                    Ok(inputs[2].clone())
                }
            }
            Combinator::LogicalOr { .. } => {
                let numbers = numbers(inputs)?;
                Ok(flag(numbers.iter().any(|n| is_set(*n))))
            }
            Combinator::LogicalAnd { .. } => {
                let numbers = numbers(inputs)?;
                Ok(flag(!numbers.is_empty() && numbers.iter().all(|n| is_set(*n))))
            }
            Combinator::CountEquals { target, .. } => {
                let numbers = numbers(inputs)?;
                let count = numbers.iter().filter(|n| **n == *target).count();
                Ok(Value::Integer(count as i64))
            }
            Combinator::Sign => {
                let n = numeric(0, &inputs[0])?;
                let sign = if n > 0.0 {
                    1
                } else if n < 0.0 {
                    -1
                } else {
                    0
                };
                Ok(Value::Integer(sign))
            }
            Combinator::Sum { .. } => sum(inputs),
        }
    }
}

fn numeric(index: usize, value: &Value) -> Result<f64, FunctionError> {
    value.as_f64().ok_or_else(|| FunctionError::NonNumericInput {
        index,
        found: value.type_name(),
        value: value.to_string(),
    })
}

fn numbers(inputs: &[Value]) -> Result<Vec<f64>, FunctionError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, value)| numeric(index, value))
        .collect()
}

fn is_set(n: f64) -> bool {
    n != 0.0 && !n.is_nan()
}

fn flag(set: bool) -> Value {
    Value::Integer(if set { 1 } else { 0 })
}

fn select(inputs: &[Value], wins: impl Fn(f64, f64) -> bool) -> Result<Value, FunctionError> {
    let mut best: Option<(f64, &Value)> = None;
    for (index, value) in inputs.iter().enumerate() {
        let n = numeric(index, value)?;
        if n.is_nan() {
            continue;
        }
        best = match best {
            Some((current, _)) if !wins(n, current) => best,
            _ => Some((n, value)),
        };
    }
    Ok(best.map(|(_, v)| v.clone()).unwrap_or(SHORT_CALL_DEFAULT))
}

fn sum(inputs: &[Value]) -> Result<Value, FunctionError> {
    let all_integers = inputs.iter().all(|v| matches!(v, Value::Integer(_)));
    if all_integers {
        let total = inputs.iter().try_fold(0i64, |acc, v| match v {
            Value::Integer(i) => acc.checked_add(*i),
            _ => None,
        });
        if let Some(total) = total {
            return Ok(Value::Integer(total));
        }
    }
    Ok(Value::Number(numbers(inputs)?.iter().sum()))
}
