// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Values flowing between nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value produced by a node or supplied as raw input.
///
/// Serialized untagged so configuration and input documents can write plain
/// scalars (`1`, `0.5`, `true`, `"wait"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value. Booleans map to 0/1; text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Non-zero numbers and `true` are truthy. `NaN` and text are not.
    pub fn is_truthy(&self) -> bool {
        match self.as_f64() {
            Some(n) => n != 0.0 && !n.is_nan(),
            None => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Converts a YAML scalar from a parameter map.
    pub fn from_yaml(value: &serde_yaml::Value) -> Option<Self> {
        match value {
            serde_yaml::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_yaml::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Number)),
            serde_yaml::Value::String(s) => Some(Value::Text(s.clone())),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Declared type of a named node output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    Integer,
    Number,
    Text,
    /// Signal codes: integers whose ordinal meaning lives in configuration.
    Code,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Code => "code",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ValueType::Boolean, Value::Boolean(_))
                | (ValueType::Integer, Value::Integer(_))
                | (ValueType::Code, Value::Integer(_))
                | (ValueType::Number, Value::Number(_))
                | (ValueType::Number, Value::Integer(_))
                | (ValueType::Text, Value::Text(_))
        )
    }
}
