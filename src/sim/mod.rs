/// Monthly billing comparison with and without the battery.
pub mod billing;
pub mod engine;
/// Capacity/power sizing sweep.
pub mod optimizer;
pub mod types;

pub use engine::{EngineError, FinancialEngine, calculate_financial_metrics};
pub use optimizer::{Objective, OptimizationResult, OptimizerConfig, optimize};
pub use types::{FinancialMetrics, YearlyCashFlowRow};
