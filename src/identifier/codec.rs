// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::IdentifierError;
use crate::identifier::{Identifier, SEQUENCE_WIDTH};

/// Encodes an identifier into its `TPI^L-SSS` string form.
pub fn encode(id: &Identifier) -> String {
    id.to_string()
}

/// Decodes a `TPI^L-SSS` string.
///
/// The grammar is strict so that `encode(decode(s)) == s` for every accepted
/// string: the layer has no leading zeros and the sequence is exactly
/// three digits.
pub fn decode(input: &str) -> Result<Identifier, IdentifierError> {
    let malformed = |reason: &'static str| IdentifierError::MalformedIdentifier {
        input: input.to_string(),
        reason,
    };

    let (prefix, rest) = input
        .split_once('^')
        .ok_or_else(|| malformed("missing '^' separator"))?;
    let (layer_part, sequence_part) = rest
        .split_once('-')
        .ok_or_else(|| malformed("missing '-' separator"))?;

    let codes = prefix.as_bytes();
    if codes.len() != 3 {
        return Err(malformed("prefix must be exactly three digits"));
    }
    if !codes.iter().all(u8::is_ascii_digit) {
        return Err(malformed("prefix must be digits"));
    }

    if layer_part.is_empty() || !layer_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("layer must be one or more digits"));
    }
    if layer_part.len() > 1 && layer_part.starts_with('0') {
        return Err(malformed("layer must not have leading zeros"));
    }
    let layer: u32 = layer_part
        .parse()
        .map_err(|_| malformed("layer does not fit in 32 bits"))?;

    if sequence_part.len() != SEQUENCE_WIDTH
        || !sequence_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed("sequence must be exactly three digits"));
    }
    let sequence: u16 = sequence_part
        .parse()
        .map_err(|_| malformed("sequence is not a number"))?;

    Identifier::new(
        codes[0] - b'0',
        codes[1] - b'0',
        codes[2] - b'0',
        layer,
        sequence,
    )
}

/// Decodes a string and checks that it encodes `expected_layer`.
pub fn decode_expecting(input: &str, expected_layer: u32) -> Result<Identifier, IdentifierError> {
    let id = decode(input)?;
    if id.layer() != expected_layer {
        return Err(IdentifierError::LayerMismatch {
            input: input.to_string(),
            expected: expected_layer,
            actual: id.layer(),
        });
    }
    Ok(id)
}
