pub mod optimizer;
pub mod portfolio;
pub mod presets;
pub mod sensitivity;

pub use optimizer::{optimize_debt_fraction, DebtSweep};
pub use portfolio::{rank_portfolio, PortfolioEntry, ProjectSummary, ReturnRating};
pub use presets::ScenarioPreset;
pub use sensitivity::{evaluate_grid, run_revenue_capex_grid, run_tornado, SensitivityDriver, SensitivityMetric};
