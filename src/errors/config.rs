// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::HierarchyViolation;
use crate::errors::{AggregationError, CompileError, IdentifierError};
use crate::identifier::Identifier;

/// Errors raised while registering or looking up node definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A node with this identifier is already registered.
    #[error("duplicate node identifier '{id}'")]
    DuplicateIdentifier { id: Identifier },

    /// The textual identifier of a node record failed codec validation.
    #[error("invalid identifier format for node '{raw}': {source}")]
    InvalidIdentifierFormat {
        raw: String,
        #[source]
        source: IdentifierError,
    },

    /// The declared `layer` field disagrees with the layer embedded in the id.
    #[error("node '{id}' declares layer {declared} but its identifier encodes layer {encoded}")]
    LayerFieldMismatch {
        id: Identifier,
        declared: u32,
        encoded: u32,
    },

    /// No node with this identifier is registered.
    #[error("node '{id}' not found")]
    NotFound { id: Identifier },
}

/// Errors raised while reading graph or strategy documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported configuration format '{extension}' (expected yaml, yml, toml or json)")]
    UnsupportedFormat { extension: String },

    #[error("node '{node}' references unknown function '{function}'")]
    UnknownFunction { node: String, function: String },

    #[error("node '{node}' has invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        node: String,
        parameter: String,
        reason: String,
    },

    #[error("invalid identifier '{raw}' in {context}: {source}")]
    InvalidIdentifier {
        raw: String,
        context: &'static str,
        #[source]
        source: IdentifierError,
    },

    /// One or more node records could not be turned into definitions.
    #[error("graph '{graph}' has {} invalid records", .errors.len())]
    InvalidRecords {
        graph: String,
        errors: Vec<ConfigError>,
    },

    /// The records were well formed but the graph was rejected.
    #[error(transparent)]
    Rejected(#[from] ReloadError),

    /// The strategy's timeframe sources are unusable.
    #[error("invalid strategy: {0}")]
    Strategy(#[from] AggregationError),

    #[error("{0}")]
    Invalid(String),
}

/// A rejected hot reload. The previously active graph stays in place.
///
/// Every problem found is reported: all registration errors, all hierarchy
/// violations and, when the graph was otherwise well formed, the cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReloadError {
    pub registration: Vec<RegistryError>,
    pub violations: Vec<HierarchyViolation>,
    pub cycle: Option<CompileError>,
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "registry reload rejected: {} registration errors, {} hierarchy violations",
            self.registration.len(),
            self.violations.len()
        )?;
        if self.cycle.is_some() {
            write!(f, ", cyclic dependency")?;
        }
        Ok(())
    }
}

impl std::error::Error for ReloadError {}

impl ReloadError {
    pub fn is_empty(&self) -> bool {
        self.registration.is_empty() && self.violations.is_empty() && self.cycle.is_none()
    }

    /// Human readable lines, one per problem.
    pub fn messages(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.registration.iter().map(|e| e.to_string()).collect();
        lines.extend(self.violations.iter().map(|v| v.to_string()));
        if let Some(cycle) = &self.cycle {
            lines.push(cycle.to_string());
        }
        lines
    }
}
