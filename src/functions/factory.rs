// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use crate::functions::{Combinator, FunctionCatalog, FunctionKind, Parameters};
use crate::value::Value;

pub(crate) const RAW_INPUT: &str = "raw_input";

/// Resolves configured function names into [`FunctionKind`]s.
pub struct FunctionFactory;

impl FunctionFactory {
    /// Builds the body for one node.
    ///
    /// Built-in names are matched case-insensitively with underscores ignored,
    /// so `max_select`, `MaxSelect` and `maxselect` are the same function.
    /// Anything else must be registered in `catalog`.
    ///
    /// Arity comes from the `arity` parameter when present, otherwise from the
    /// number of declared inputs. `count_equals` requires a numeric `target`.
    pub fn create_function(
        node: &str,
        function: &str,
        parameters: &Parameters,
        input_count: usize,
        catalog: &FunctionCatalog,
    ) -> Result<FunctionKind, ConfigError> {
        let arity = || declared_arity(node, parameters, input_count);

        let kind = match normalize(function).as_str() {
            "rawinput" => FunctionKind::RawInput,
            "maxselect" => FunctionKind::Combinator(Combinator::MaxSelect { arity: arity()? }),
            "minselect" => FunctionKind::Combinator(Combinator::MinSelect { arity: arity()? }),
            "conditionalselect" => FunctionKind::Combinator(Combinator::ConditionalSelect),
            "logicalor" => FunctionKind::Combinator(Combinator::LogicalOr { arity: arity()? }),
            "logicaland" => FunctionKind::Combinator(Combinator::LogicalAnd { arity: arity()? }),
            "countequals" => FunctionKind::Combinator(Combinator::CountEquals {
                arity: arity()?,
                target: target(node, parameters)?,
            }),
            "sign" => FunctionKind::Combinator(Combinator::Sign),
            "sum" => FunctionKind::Combinator(Combinator::Sum { arity: arity()? }),
            _ => match catalog.get(function) {
                Some(external) => FunctionKind::External(external.clone()),
                None => {
                    return Err(ConfigError::UnknownFunction {
                        node: node.to_string(),
                        function: function.to_string(),
                    })
                }
            },
        };
        Ok(kind)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn declared_arity(node: &str, parameters: &Parameters, input_count: usize) -> Result<usize, ConfigError> {
    match parameters.get("arity") {
        None => Ok(input_count),
        Some(raw) => raw
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| ConfigError::InvalidParameter {
                node: node.to_string(),
                parameter: "arity".to_string(),
                reason: "must be a non-negative integer".to_string(),
            }),
    }
}

fn target(node: &str, parameters: &Parameters) -> Result<f64, ConfigError> {
    parameters
        .get("target")
        .and_then(Value::from_yaml)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ConfigError::InvalidParameter {
            node: node.to_string(),
            parameter: "target".to_string(),
            reason: "count_equals requires a numeric target".to_string(),
        })
}
