/// Default latency budget for one evaluation pass, in milliseconds.
pub const DEFAULT_BUDGET_MS: u64 = 30;
/// Name given to graph documents that do not declare one.
pub const DEFAULT_GRAPH_NAME: &str = "graph";
/// Node parameter holding the declared default value.
pub const DEFAULT_VALUE_PARAMETER: &str = "default";
