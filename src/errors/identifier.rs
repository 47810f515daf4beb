// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the identifier codec.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or constructing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The string does not match the `TPI^L-SSS` grammar.
    #[error("malformed identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: &'static str },

    /// The caller expected one layer but the string encodes another.
    #[error("identifier '{input}' encodes layer {actual} but layer {expected} was expected")]
    LayerMismatch {
        input: String,
        expected: u32,
        actual: u32,
    },

    /// A field is outside the range the fixed-width encoding can represent.
    #[error("identifier field '{field}' value {value} exceeds maximum {max}")]
    FieldOutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}
