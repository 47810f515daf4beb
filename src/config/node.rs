// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::functions::{FunctionKind, Parameters};
use crate::identifier::Identifier;
use crate::value::{Value, ValueType};

/// Named output schema of a node.
pub type OutputSchema = BTreeMap<String, ValueType>;

/// Definition of one node in the graph.
///
/// Owned by the [`NodeRegistry`](crate::config::NodeRegistry). Definitions are
/// never mutated after registration; a configuration reload replaces the whole
/// registry.
///
/// # Example
/// ```
/// use pkg_dag::config::NodeDefinition;
/// use pkg_dag::functions::{Combinator, FunctionKind};
/// use pkg_dag::value::Value;
///
/// let node = NodeDefinition::new(
///     "110^1-000".parse().unwrap(),
///     FunctionKind::Combinator(Combinator::Sign),
/// )
/// .with_inputs(vec!["110^0-000".parse().unwrap()])
/// .with_default(Value::Integer(0));
///
/// assert_eq!(node.layer, 1);
/// ```
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub id: Identifier,
    /// Must equal `id.layer()`; checked on registration.
    pub layer: u32,
    pub function: FunctionKind,
    /// Ordered inputs, passed positionally to the function.
    pub inputs: Vec<Identifier>,
    pub outputs: OutputSchema,
    pub parameters: Parameters,
    /// Substituted for missing inputs and used as the result when the
    /// function fails.
    pub default_value: Value,
}

impl NodeDefinition {
    pub fn new(id: Identifier, function: FunctionKind) -> Self {
        Self {
            id,
            layer: id.layer(),
            function,
            inputs: Vec::new(),
            outputs: OutputSchema::new(),
            parameters: Parameters::new(),
            default_value: Value::default(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Identifier>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_default(mut self, default_value: Value) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_outputs(mut self, outputs: OutputSchema) -> Self {
        self.outputs = outputs;
        self
    }

    /// Overrides the declared layer. Only useful for exercising the registry's
    /// layer check.
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn is_raw_input(&self) -> bool {
        matches!(self.function, FunctionKind::RawInput)
    }
}
