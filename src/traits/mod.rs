pub mod evaluator;
pub mod node_function;

pub use evaluator::GraphEvaluator;
pub use node_function::NodeFunction;
