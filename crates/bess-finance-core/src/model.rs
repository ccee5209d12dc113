use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::AssumptionSet;
use crate::capital::size_capital_structure;
use crate::cash_flow::{build_cash_flows, CashFlowYear};
use crate::debt::DebtSchedule;
use crate::metrics::{compute_return_metrics, MetricsInputs};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Multiple, Percent, MILLION};
use crate::validation::validate_assumptions;
use crate::BessFinanceResult;

pub use crate::metrics::IrrStrategy;

/// Knobs that change how results are derived, not what is modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub irr_strategy: IrrStrategy,
}

/// Complete result of one engine run. Money in £m.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFinancials {
    pub total_capex: Money,
    pub debt_amount: Money,
    pub equity_amount: Money,
    /// Level annuity sized from the initial rate
    pub annual_debt_service: Money,
    pub years: Vec<CashFlowYear>,
    /// Equity NPV at the discount rate, net of the equity outlay
    pub npv: Money,
    /// Equity IRR (%); 0 when the scan finds no crossing
    pub irr_pct: Percent,
    pub average_dscr: Multiple,
    pub min_dscr: Option<Multiple>,
    pub total_cash_flows: Money,
    pub simple_payback_year: u32,
    pub discounted_payback_year: u32,
    pub moic: Option<Multiple>,
    /// Total capex per MW of nameplate capacity (£m/MW)
    pub ev_per_mw: Option<Money>,
}

/// Run the engine with default options.
pub fn compute_financials(assumptions: &AssumptionSet) -> BessFinanceResult<ProjectFinancials> {
    compute_financials_with(assumptions, &EngineOptions::default())
}

/// Size the capital structure, project every operating year and derive the
/// return metrics. Pure: identical inputs give identical outputs.
pub fn compute_financials_with(
    assumptions: &AssumptionSet,
    options: &EngineOptions,
) -> BessFinanceResult<ProjectFinancials> {
    let capital = size_capital_structure(assumptions);
    let mut debt = DebtSchedule::new(capital.debt_amount, &assumptions.financing)?;
    let years = build_cash_flows(assumptions, &capital, &mut debt)?;

    let equity_m = capital.equity_amount / MILLION;
    let debt_m = capital.debt_amount / MILLION;
    let total_capex_m = capital.total_capex / MILLION;
    let metrics = compute_return_metrics(
        &years,
        &MetricsInputs {
            equity_amount: equity_m,
            total_capex: total_capex_m,
            discount_rate: pct_to_rate(assumptions.financing.discount_rate_pct),
            debt_tenor_years: assumptions.financing.debt_tenor_years,
            capacity_mw: assumptions.technical.capacity_mw,
            irr_strategy: options.irr_strategy,
        },
    )?;

    tracing::debug!(
        project = %assumptions.project_name,
        years = years.len(),
        irr_pct = %metrics.irr_pct,
        npv = %metrics.npv,
        "engine run complete"
    );

    Ok(ProjectFinancials {
        total_capex: total_capex_m,
        debt_amount: debt_m,
        equity_amount: equity_m,
        annual_debt_service: debt.annuity() / MILLION,
        years,
        npv: metrics.npv,
        irr_pct: metrics.irr_pct,
        average_dscr: metrics.average_dscr,
        min_dscr: metrics.min_dscr,
        total_cash_flows: metrics.total_cash_flows,
        simple_payback_year: metrics.simple_payback_year,
        discounted_payback_year: metrics.discounted_payback_year,
        moic: metrics.moic,
        ev_per_mw: metrics.ev_per_mw,
    })
}

/// Run the engine and wrap the result in the standard output envelope, with
/// advisory validation findings and result warnings attached.
pub fn model_bess_project(
    assumptions: &AssumptionSet,
) -> BessFinanceResult<ComputationOutput<ProjectFinancials>> {
    model_bess_project_with(assumptions, &EngineOptions::default())
}

pub fn model_bess_project_with(
    assumptions: &AssumptionSet,
    options: &EngineOptions,
) -> BessFinanceResult<ComputationOutput<ProjectFinancials>> {
    let start = Instant::now();

    let mut warnings: Vec<String> = validate_assumptions(assumptions)
        .iter()
        .map(ToString::to_string)
        .collect();

    let result = compute_financials_with(assumptions, options)?;
    warnings.extend(result_warnings(assumptions, &result));

    let financing = &assumptions.financing;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "BESS Project Finance Model (levered equity, annuity debt)",
        &serde_json::json!({
            "project_name": assumptions.project_name,
            "capacity_mw": assumptions.technical.capacity_mw.to_string(),
            "duration_hours": assumptions.technical.duration_hours.to_string(),
            "debt_pct": financing.debt_pct.to_string(),
            "all_in_rate_pct": financing.all_in_rate_pct().to_string(),
            "debt_tenor_years": financing.debt_tenor_years,
            "refinancing": financing.refinancing,
            "discount_rate_pct": financing.discount_rate_pct.to_string(),
            "project_life_years": financing.project_life_years,
            "cod_date": financing.cod_date,
            "irr_strategy": options.irr_strategy,
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Findings about the computed outcome against the lender and investor targets.
pub fn result_warnings(assumptions: &AssumptionSet, result: &ProjectFinancials) -> Vec<String> {
    let targets = &assumptions.targets;
    let mut warnings = Vec::new();

    if let Some(min) = result.min_dscr {
        if min < targets.dscr_covenant {
            warnings.push(format!(
                "Minimum DSCR {:.2}x is below the {:.2}x covenant",
                min, targets.dscr_covenant
            ));
        }
    }

    // A zero IRR with cash flows exceeding the outlay means the scan ran off
    // its ceiling without crossing
    if result.irr_pct.is_zero() && result.total_cash_flows > result.equity_amount {
        warnings.push("Equity IRR exceeds the 50% scan ceiling; reported as 0".to_string());
    } else if result.irr_pct < targets.target_equity_irr_pct {
        warnings.push(format!(
            "Equity IRR {:.1}% is below the {:.1}% target",
            result.irr_pct, targets.target_equity_irr_pct
        ));
    }

    if result.simple_payback_year == 0 && result.equity_amount > Decimal::ZERO {
        warnings.push(format!(
            "Equity is not paid back within the {}-year project life",
            assumptions.financing.project_life_years
        ));
    }

    warnings
}
