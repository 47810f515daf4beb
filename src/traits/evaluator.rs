use crate::engine::{Evaluation, RawInputs};
use crate::errors::ExecutionError;

/// Anything that can run one evaluation pass over a set of raw inputs.
///
/// Implemented by [`crate::engine::GraphRuntime`]. The multi-timeframe engine
/// only depends on this trait so each timeframe can be backed by its own
/// runtime.
pub trait GraphEvaluator: Send + Sync {
    fn evaluate(&self, raw_inputs: &RawInputs) -> Result<Evaluation, ExecutionError>;

    /// Display name used in logs.
    fn name(&self) -> &str;
}
