use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use bess_finance_core::scenarios::optimizer::{optimize_debt_fraction, DebtSweep};
use bess_finance_core::scenarios::portfolio::{rank_portfolio, PortfolioEntry};
use bess_finance_core::scenarios::sensitivity::{run_revenue_capex_grid, run_tornado, SensitivityMetric};
use bess_finance_core::scenarios::ScenarioPreset;
use bess_finance_core::validation::validate_assumptions;
use bess_finance_core::{model_bess_project, AssumptionSet};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_assumptions(input_json: &str) -> NapiResult<AssumptionSet> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Single project
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_financials(input_json: String) -> NapiResult<String> {
    let assumptions = parse_assumptions(&input_json)?;
    let output = model_bess_project(&assumptions).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi(js_name = "validateAssumptions")]
pub fn validate_assumptions_json(input_json: String) -> NapiResult<String> {
    let assumptions = parse_assumptions(&input_json)?;
    serde_json::to_string(&validate_assumptions(&assumptions)).map_err(to_napi_error)
}

#[napi]
pub fn apply_preset(preset: String, input_json: String) -> NapiResult<String> {
    let preset: ScenarioPreset = preset.parse().map_err(to_napi_error)?;
    let assumptions = parse_assumptions(&input_json)?;
    serde_json::to_string(&preset.apply(&assumptions)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TornadoRequest {
    #[serde(default)]
    assumptions: AssumptionSet,
    #[serde(default)]
    changes_pct: Vec<Decimal>,
}

#[napi(js_name = "runTornado")]
pub fn tornado(input_json: String) -> NapiResult<String> {
    let req: TornadoRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = run_tornado(&req.assumptions, &req.changes_pct).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct GridRequest {
    #[serde(default)]
    assumptions: AssumptionSet,
    span_pct: Option<Decimal>,
    step_pct: Option<Decimal>,
    #[serde(default)]
    metric: SensitivityMetric,
}

#[napi(js_name = "revenueCapexGrid")]
pub fn revenue_capex_grid(input_json: String) -> NapiResult<String> {
    let req: GridRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = run_revenue_capex_grid(
        &req.assumptions,
        req.span_pct.unwrap_or(dec!(20)),
        req.step_pct.unwrap_or(dec!(10)),
        req.metric,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct OptimizeRequest {
    #[serde(default)]
    assumptions: AssumptionSet,
    #[serde(default)]
    sweep: DebtSweep,
}

#[napi]
pub fn optimize_debt(input_json: String) -> NapiResult<String> {
    let req: OptimizeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = optimize_debt_fraction(&req.assumptions, &req.sweep).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi(js_name = "rankPortfolio")]
pub fn rank_projects(input_json: String) -> NapiResult<String> {
    let entries: Vec<PortfolioEntry> = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rank_portfolio(&entries).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
