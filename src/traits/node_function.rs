use crate::errors::FunctionError;
use crate::functions::Parameters;
use crate::value::Value;

/// Extension point for business-specific node bodies.
///
/// Implementations must be pure: the same inputs and parameters always give
/// the same value. Errors and panics are both contained by the engine and
/// replaced with the node's declared default.
pub trait NodeFunction: Send + Sync {
    fn call(&self, inputs: &[Value], parameters: &Parameters) -> Result<Value, FunctionError>;

    fn name(&self) -> &str;
}
