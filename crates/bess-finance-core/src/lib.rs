pub mod assumptions;
pub mod capital;
pub mod cash_flow;
pub mod debt;
pub mod error;
pub mod metrics;
pub mod model;
pub mod time_value;
pub mod types;
pub mod validation;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use assumptions::AssumptionSet;
pub use error::BessFinanceError;
pub use model::{
    compute_financials, compute_financials_with, model_bess_project, model_bess_project_with, EngineOptions,
    ProjectFinancials,
};
pub use types::*;

/// Standard result type for all bess-finance operations
pub type BessFinanceResult<T> = Result<T, BessFinanceError>;
