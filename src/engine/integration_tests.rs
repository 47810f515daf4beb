use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::aggregator::MultiTimeframeEngine;
use crate::config::{
    build_definitions, load_graph_config, load_raw_inputs, load_strategy_config, NodeDefinition,
    NodeRegistry, RawSources,
};
use crate::engine::{
    compile, evaluate, CachePolicy, EngineWarning, ExecutionEngine, GraphRuntime, NodeErrorKind,
    NodeResult, RawInputs,
};
use crate::errors::FunctionError;
use crate::functions::{Combinator, FunctionCatalog, FunctionKind, Parameters};
use crate::identifier::Identifier;
use crate::traits::NodeFunction;
use crate::value::Value;

fn id(s: &str) -> Identifier {
    s.parse().unwrap()
}

fn config_path(name: &str) -> String {
    format!("{}/configs/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn diamond_runtime() -> GraphRuntime {
    let config = load_graph_config(config_path("diamond.yaml")).unwrap();
    GraphRuntime::from_config(&config, &FunctionCatalog::new()).unwrap()
}

struct Explode;

impl NodeFunction for Explode {
    fn call(&self, _inputs: &[Value], _parameters: &Parameters) -> Result<Value, FunctionError> {
        panic!("feed disconnected")
    }

    fn name(&self) -> &str {
        "explode"
    }
}

struct Reject;

impl NodeFunction for Reject {
    fn call(&self, _inputs: &[Value], _parameters: &Parameters) -> Result<Value, FunctionError> {
        Err(FunctionError::Failed("threshold table missing".into()))
    }

    fn name(&self) -> &str {
        "reject"
    }
}

/// Test the four-node diamond: raw 5 fans out to two signs, combined by AND
#[test]
fn test_diamond_end_to_end() {
    let runtime = diamond_runtime();
    let raw = RawInputs::from([(id("110^0-000"), Value::Integer(5))]);

    let evaluation = runtime.evaluate(&raw).unwrap();
    assert_eq!(evaluation.value(&id("110^0-000")), Some(&Value::Integer(5)));
    assert_eq!(evaluation.value(&id("110^1-000")), Some(&Value::Integer(1)));
    assert_eq!(evaluation.value(&id("110^1-001")), Some(&Value::Integer(1)));
    assert_eq!(evaluation.value(&id("110^2-000")), Some(&Value::Integer(1)));
    assert_eq!(evaluation.failed_count(), 0);
    assert!(evaluation.metrics.warnings.is_empty());
    assert_eq!(evaluation.metrics.node_timings.len(), 4);

    let negative = RawInputs::from([(id("110^0-000"), Value::Integer(-5))]);
    let evaluation = runtime.evaluate(&negative).unwrap();
    assert_eq!(evaluation.value(&id("110^2-000")), Some(&Value::Integer(1)));

    let flat = RawInputs::from([(id("110^0-000"), Value::Integer(0))]);
    let evaluation = runtime.evaluate(&flat).unwrap();
    assert_eq!(evaluation.value(&id("110^2-000")), Some(&Value::Integer(0)));
}

/// Test that failing nodes only affect their own dependents
#[test]
fn test_failure_isolation() {
    let catalog = FunctionCatalog::new()
        .with(Arc::new(Explode))
        .with(Arc::new(Reject));
    let definitions = vec![
        NodeDefinition::new(id("110^1-000"), FunctionKind::Combinator(Combinator::Sign))
            .with_inputs(vec![id("110^0-900")]),
        NodeDefinition::new(id("110^1-001"), FunctionKind::External(catalog.get("explode").unwrap().clone()))
            .with_inputs(vec![id("110^0-900")])
            .with_default(Value::Integer(-9)),
        NodeDefinition::new(id("110^1-002"), FunctionKind::External(catalog.get("reject").unwrap().clone()))
            .with_inputs(vec![id("110^0-900")]),
        NodeDefinition::new(id("110^2-000"), FunctionKind::Combinator(Combinator::Sign))
            .with_inputs(vec![id("110^1-000")]),
        NodeDefinition::new(id("110^2-001"), FunctionKind::Combinator(Combinator::Sign))
            .with_inputs(vec![id("110^1-001")]),
    ];
    let registry =
        NodeRegistry::from_definitions(definitions, RawSources::from(vec![id("110^0-900")])).unwrap();
    let order = compile(&registry).unwrap();
    let raw = RawInputs::from([(id("110^0-900"), Value::Number(2.5))]);

    let evaluation = evaluate(&registry, &order, &raw).unwrap();

    assert_eq!(
        evaluation.results[&id("110^1-001")],
        NodeResult::failed(Value::Integer(-9), NodeErrorKind::Panicked)
    );
    assert_eq!(
        evaluation.results[&id("110^1-002")],
        NodeResult::failed(Value::Integer(0), NodeErrorKind::ExecutionFailed)
    );
    // independent branch is untouched
    assert_eq!(evaluation.results[&id("110^2-000")], NodeResult::success(Value::Integer(1)));
    // dependent of the panicking node computes from the fallback value
    assert_eq!(evaluation.results[&id("110^2-001")], NodeResult::success(Value::Integer(-1)));

    let causes: Vec<&str> = evaluation
        .metrics
        .warnings
        .iter()
        .filter_map(|w| match w {
            EngineWarning::NodeExecutionFailed { cause, .. } => Some(cause.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(causes, vec!["panicked: feed disconnected", "threshold table missing"]);
}

/// Test that identical inputs on an unchanged registry give identical results
#[test]
fn test_evaluation_is_reproducible() {
    let config = load_graph_config(config_path("signal-1m.yaml")).unwrap();
    let (definitions, raw_sources) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
    let registry = NodeRegistry::from_definitions(definitions, raw_sources).unwrap();
    let order = compile(&registry).unwrap();
    let raw = load_raw_inputs(config_path("inputs-sample.json")).unwrap();

    let first = evaluate(&registry, &order, &raw).unwrap();
    let second = evaluate(&registry, &order, &raw).unwrap();
    assert_eq!(first.results, second.results);
    assert_eq!(first.value(&id("110^3-000")), Some(&Value::Integer(1)));
    assert_eq!(first.value(&id("110^2-000")), Some(&Value::Integer(2)));
    assert_eq!(first.value(&id("110^3-001")), Some(&Value::Integer(2)));
    assert_eq!(compile(&registry).unwrap(), order);
}

/// Test that a zero latency budget is flagged without failing the pass
#[test]
fn test_budget_exceeded_is_advisory() {
    let config = load_graph_config(config_path("diamond.yaml")).unwrap();
    let (definitions, raw_sources) = build_definitions(&config, &FunctionCatalog::new()).unwrap();
    let runtime = GraphRuntime::new(
        "diamond",
        ExecutionEngine::new().with_budget(Duration::ZERO),
        definitions,
        raw_sources,
    )
    .unwrap();

    let raw = RawInputs::from([(id("110^0-000"), Value::Integer(5))]);
    let evaluation = runtime.evaluate(&raw).unwrap();
    assert!(evaluation.metrics.budget_exceeded);
    assert_eq!(evaluation.value(&id("110^2-000")), Some(&Value::Integer(1)));
}

/// Test that passes running during a reload always see a complete graph
#[test]
fn test_concurrent_passes_during_reload() {
    let runtime = Arc::new(diamond_runtime());
    let raw = RawInputs::from([(id("110^0-000"), Value::Integer(5))]);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let raw = raw.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let evaluation = runtime.evaluate(&raw).unwrap();
                    let node_count = evaluation.results.len();
                    assert!(node_count == 4 || node_count == 1, "saw {node_count} nodes");
                }
            })
        })
        .collect();

    for round in 0..10 {
        let definitions = if round % 2 == 0 {
            vec![NodeDefinition::new(id("110^0-000"), FunctionKind::RawInput)]
        } else {
            let config = load_graph_config(config_path("diamond.yaml")).unwrap();
            build_definitions(&config, &FunctionCatalog::new()).unwrap().0
        };
        runtime.reload_registry(definitions, RawSources::new()).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

/// Test the sample strategy end to end across both timeframes
#[test]
fn test_strategy_vote_from_sample_configs() {
    let strategy = load_strategy_config(config_path("strategy.yaml")).unwrap();
    let engine = MultiTimeframeEngine::from_strategy(&strategy, &FunctionCatalog::new()).unwrap();
    let raw = load_raw_inputs(config_path("inputs-sample.json")).unwrap();

    let outcome = engine.evaluate(&raw).unwrap();
    let timeframes: Vec<u8> = outcome.evaluations.keys().copied().collect();
    assert_eq!(timeframes, vec![1, 2]);

    // 1m votes +1 with weight 1, 5m votes -1 with weight 2
    assert_eq!(outcome.signal.dominant_value, Value::Integer(-1));
    assert_eq!(outcome.signal.contributing_timeframe, 2);
    assert_eq!(outcome.signal.confidence, 2.0 / 3.0);

    let labels: BTreeMap<u8, usize> = engine
        .aggregator()
        .sources()
        .iter()
        .map(|s| (s.timeframe, s.extensions.len()))
        .collect();
    assert_eq!(labels, BTreeMap::from([(1, 0), (2, 1)]));
}

/// Test that a graph document asking for reuse gets it through the runtime
#[test]
fn test_reuse_policy_from_graph_document() {
    let config = load_graph_config(config_path("signal-5m.yaml")).unwrap();
    let runtime = GraphRuntime::from_config(&config, &FunctionCatalog::new()).unwrap();
    assert_eq!(runtime.engine().cache_policy(), CachePolicy::ReuseIdenticalInputs);
    let raw = load_raw_inputs(config_path("inputs-sample.json")).unwrap();

    let first = runtime.evaluate(&raw).unwrap();
    let second = runtime.evaluate(&raw).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.metrics.node_timings, second.metrics.node_timings);
}
