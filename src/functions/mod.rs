// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node function bodies.
//!
//! Dispatch is closed: a node runs either a built-in [`Combinator`], reads a
//! raw input, or calls a business function registered in a
//! [`FunctionCatalog`]. Function names from configuration are resolved once,
//! by [`FunctionFactory`], when definitions are built. Nothing is looked up by
//! string during an evaluation pass.

mod combinators;
mod factory;

pub use combinators::{Combinator, SHORT_CALL_DEFAULT};
pub use factory::FunctionFactory;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::errors::FunctionError;
use crate::traits::NodeFunction;
use crate::value::Value;

/// Free-form node parameters as written in configuration.
pub type Parameters = BTreeMap<String, serde_yaml::Value>;

/// The body of a node, resolved at registry-build time.
#[derive(Clone)]
pub enum FunctionKind {
    /// Layer-0 node whose value is the raw input stored under its own id.
    RawInput,
    Combinator(Combinator),
    External(Arc<dyn NodeFunction>),
}

impl FunctionKind {
    pub fn name(&self) -> &str {
        match self {
            FunctionKind::RawInput => factory::RAW_INPUT,
            FunctionKind::Combinator(c) => c.name(),
            FunctionKind::External(f) => f.name(),
        }
    }

    /// Runs the body over already-resolved inputs.
    ///
    /// Raw-input nodes are satisfied by the engine before this is reached; a
    /// direct call passes the first input through.
    pub fn invoke(&self, inputs: &[Value], parameters: &Parameters) -> Result<Value, FunctionError> {
        match self {
            FunctionKind::RawInput => inputs
                .first()
                .cloned()
                .ok_or_else(|| FunctionError::Failed("raw input node has no value".into())),
            FunctionKind::Combinator(c) => c.apply(inputs),
            FunctionKind::External(f) => f.call(inputs, parameters),
        }
    }
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::RawInput => write!(f, "RawInput"),
            FunctionKind::Combinator(c) => f.debug_tuple("Combinator").field(c).finish(),
            FunctionKind::External(func) => f.debug_tuple("External").field(&func.name()).finish(),
        }
    }
}

/// Business functions available to configuration by name.
#[derive(Clone, Default)]
pub struct FunctionCatalog(HashMap<String, Arc<dyn NodeFunction>>);

impl FunctionCatalog {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registers a function under its own name, replacing any previous entry.
    pub fn register(&mut self, function: Arc<dyn NodeFunction>) {
        self.0.insert(function.name().to_string(), function);
    }

    pub fn with(mut self, function: Arc<dyn NodeFunction>) -> Self {
        self.register(function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NodeFunction>> {
        self.0.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCatalog")
            .field("functions", &self.names())
            .finish()
    }
}
