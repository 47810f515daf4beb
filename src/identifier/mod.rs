// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! PKG identifiers: the primary key of every node and raw input.
//!
//! An identifier bundles five fields into one compact token of the form
//! `TPI^L-SSS`:
//!
//! * `T` - timeframe code, one digit
//! * `P` - aggregation period code, one digit
//! * `I` - instrument code, one digit
//! * `L` - layer, one or more digits without leading zeros
//! * `SSS` - sequence number, exactly three zero-padded digits
//!
//! ```
//! use pkg_dag::identifier::Identifier;
//!
//! let id: Identifier = "110^2-007".parse().unwrap();
//! assert_eq!(id.layer(), 2);
//! assert_eq!(id.sequence(), 7);
//! assert_eq!(id.to_string(), "110^2-007");
//! ```

mod codec;

pub use codec::{decode, decode_expecting, encode};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::IdentifierError;

/// Largest value of the single-digit timeframe, period and instrument codes.
pub const MAX_CODE: u8 = 9;
/// Largest sequence number representable in the three digit field.
pub const MAX_SEQUENCE: u16 = 999;
/// Width of the zero-padded sequence field.
pub const SEQUENCE_WIDTH: usize = 3;

/// Immutable node identifier.
///
/// Fields are private so every instance has passed range validation, either in
/// [`Identifier::new`] or in the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    timeframe: u8,
    period: u8,
    instrument: u8,
    layer: u32,
    sequence: u16,
}

impl Identifier {
    pub fn new(
        timeframe: u8,
        period: u8,
        instrument: u8,
        layer: u32,
        sequence: u16,
    ) -> Result<Self, IdentifierError> {
        check_code("timeframe", timeframe)?;
        check_code("period", period)?;
        check_code("instrument", instrument)?;
        if sequence > MAX_SEQUENCE {
            return Err(IdentifierError::FieldOutOfRange {
                field: "sequence",
                value: u64::from(sequence),
                max: u64::from(MAX_SEQUENCE),
            });
        }
        Ok(Self {
            timeframe,
            period,
            instrument,
            layer,
            sequence,
        })
    }

    pub fn timeframe(&self) -> u8 {
        self.timeframe
    }

    pub fn period(&self) -> u8 {
        self.period
    }

    pub fn instrument(&self) -> u8 {
        self.instrument
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Re-checks field ranges; used by the registry as a guard on definitions
    /// that were built outside the codec.
    pub fn validate(&self) -> Result<(), IdentifierError> {
        Self::new(
            self.timeframe,
            self.period,
            self.instrument,
            self.layer,
            self.sequence,
        )
        .map(|_| ())
    }

    pub fn encode(&self) -> String {
        encode(self)
    }

    /// Key used wherever a deterministic order is required: layer first, then
    /// the encoded string.
    pub fn order_key(&self) -> (u32, String) {
        (self.layer, self.encode())
    }
}

fn check_code(field: &'static str, value: u8) -> Result<(), IdentifierError> {
    if value > MAX_CODE {
        return Err(IdentifierError::FieldOutOfRange {
            field,
            value: u64::from(value),
            max: u64::from(MAX_CODE),
        });
    }
    Ok(())
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}^{}-{:0width$}",
            self.timeframe,
            self.period,
            self.instrument,
            self.layer,
            self.sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        decode(value)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode(&raw).map_err(serde::de::Error::custom)
    }
}
