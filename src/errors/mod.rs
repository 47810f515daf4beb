// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod aggregation;
mod config;
mod execution;
mod identifier;

pub use aggregation::AggregationError;
pub use config::{ConfigError, RegistryError, ReloadError};
pub use execution::{CompileError, ExecutionError, FunctionError};
pub use identifier::IdentifierError;
