use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::assumptions::AssumptionSet;
use crate::error::BessFinanceError;
use crate::model::{compute_financials, ProjectFinancials};
use crate::types::*;
use crate::BessFinanceResult;

/// Default tornado perturbations (% change from the base case).
pub const DEFAULT_TORNADO_CHANGES: [Decimal; 4] = [dec!(-20), dec!(-10), dec!(10), dec!(20)];

// ---------------------------------------------------------------------------
// Drivers and metrics
// ---------------------------------------------------------------------------

/// An input group that a sensitivity run scales by a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    /// All four revenue streams and the contract floor
    Revenue,
    /// Every operating cost line
    Opex,
    /// Every per-MW capex component
    Capex,
    CapacityMarket,
    EnergyTrading,
    DegradationRate,
}

impl SensitivityDriver {
    /// Drivers shown on the tornado chart, in display order.
    pub const TORNADO: [SensitivityDriver; 6] = [
        Self::Revenue,
        Self::Opex,
        Self::Capex,
        Self::CapacityMarket,
        Self::EnergyTrading,
        Self::DegradationRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::Opex => "OPEX",
            Self::Capex => "CAPEX",
            Self::CapacityMarket => "Capacity Market Price",
            Self::EnergyTrading => "Energy Trading",
            Self::DegradationRate => "Degradation Rate",
        }
    }

    /// Copy of `base` with this driver moved by `change_pct` percent.
    pub fn apply(&self, base: &AssumptionSet, change_pct: Decimal) -> AssumptionSet {
        let factor = Decimal::ONE + pct_to_rate(change_pct);
        let mut set = base.clone();
        match self {
            Self::Revenue => set.commercial.scale(factor),
            Self::Opex => set.costs.scale_opex(factor),
            Self::Capex => set.costs.scale_capex(factor),
            Self::CapacityMarket => set.commercial.capacity_market_k *= factor,
            Self::EnergyTrading => set.commercial.energy_trading_k *= factor,
            Self::DegradationRate => set.technical.degradation_rate_pct *= factor,
        }
        set
    }
}

impl fmt::Display for SensitivityDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SensitivityDriver {
    type Err = BessFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "revenue" => Ok(Self::Revenue),
            "opex" => Ok(Self::Opex),
            "capex" => Ok(Self::Capex),
            "capacity_market" => Ok(Self::CapacityMarket),
            "energy_trading" => Ok(Self::EnergyTrading),
            "degradation" | "degradation_rate" => Ok(Self::DegradationRate),
            other => Err(BessFinanceError::InvalidInput {
                field: "driver".into(),
                reason: format!("Unknown sensitivity driver '{other}'"),
            }),
        }
    }
}

/// Scalar read off a run for a sensitivity cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    #[default]
    IrrPct,
    Npv,
    MinDscr,
    AverageDscr,
    Moic,
}

impl SensitivityMetric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::IrrPct => "Equity IRR (%)",
            Self::Npv => "NPV (£m)",
            Self::MinDscr => "Minimum DSCR (x)",
            Self::AverageDscr => "Average DSCR (x)",
            Self::Moic => "MOIC (x)",
        }
    }

    /// Unbounded or undefined values read as zero.
    pub fn extract(&self, result: &ProjectFinancials) -> Decimal {
        match self {
            Self::IrrPct => result.irr_pct,
            Self::Npv => result.npv,
            Self::MinDscr => result.min_dscr.unwrap_or(Decimal::ZERO),
            Self::AverageDscr => result.average_dscr,
            Self::Moic => result.moic.unwrap_or(Decimal::ZERO),
        }
    }
}

impl FromStr for SensitivityMetric {
    type Err = BessFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "irr" | "irr_pct" => Ok(Self::IrrPct),
            "npv" => Ok(Self::Npv),
            "min_dscr" => Ok(Self::MinDscr),
            "average_dscr" | "avg_dscr" => Ok(Self::AverageDscr),
            "moic" => Ok(Self::Moic),
            other => Err(BessFinanceError::InvalidInput {
                field: "metric".into(),
                reason: format!("Unknown sensitivity metric '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tornado
// ---------------------------------------------------------------------------

/// Outcome of one perturbation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoPoint {
    pub change_pct: Decimal,
    pub irr_pct: Percent,
    pub npv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoRow {
    pub driver: SensitivityDriver,
    pub label: String,
    /// Points in the order the changes were requested
    pub points: Vec<TornadoPoint>,
    /// Widest minus narrowest IRR across the points (percentage points)
    pub irr_swing: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TornadoOutput {
    pub base_irr_pct: Percent,
    pub base_npv: Money,
    /// Rows ordered by IRR swing, widest first
    pub rows: Vec<TornadoRow>,
}

/// One-at-a-time sensitivity of IRR and NPV to each tornado driver.
///
/// An empty `changes_pct` uses ±10% and ±20%. Every perturbed run is
/// independent and they are evaluated in parallel.
pub fn run_tornado(
    base: &AssumptionSet,
    changes_pct: &[Decimal],
) -> BessFinanceResult<ComputationOutput<TornadoOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let changes: Vec<Decimal> = if changes_pct.is_empty() {
        DEFAULT_TORNADO_CHANGES.to_vec()
    } else {
        changes_pct.to_vec()
    };
    if let Some(bad) = changes.iter().find(|c| **c <= dec!(-100)) {
        return Err(BessFinanceError::InvalidInput {
            field: "changes_pct".into(),
            reason: format!("A change of {bad}% would remove the driver entirely"),
        });
    }

    let base_result = compute_financials(base)?;

    let cells: Vec<(SensitivityDriver, Decimal)> = SensitivityDriver::TORNADO
        .iter()
        .flat_map(|d| changes.iter().map(move |c| (*d, *c)))
        .collect();

    let evaluated: Vec<BessFinanceResult<TornadoPoint>> = cells
        .par_iter()
        .map(|(driver, change)| {
            let r = compute_financials(&driver.apply(base, *change))?;
            Ok(TornadoPoint {
                change_pct: *change,
                irr_pct: r.irr_pct,
                npv: r.npv,
            })
        })
        .collect();

    let mut rows = Vec::with_capacity(SensitivityDriver::TORNADO.len());
    let mut evaluated = evaluated.into_iter();
    for driver in SensitivityDriver::TORNADO {
        let points = evaluated
            .by_ref()
            .take(changes.len())
            .collect::<BessFinanceResult<Vec<_>>>()?;

        let irr_swing = match (
            points.iter().map(|p| p.irr_pct).max(),
            points.iter().map(|p| p.irr_pct).min(),
        ) {
            (Some(hi), Some(lo)) => hi - lo,
            _ => Decimal::ZERO,
        };
        if points.iter().any(|p| p.irr_pct.is_zero()) {
            warnings.push(format!(
                "{}: some perturbations report 0% IRR (no crossing within the 0-50% scan)",
                driver.label()
            ));
        }

        rows.push(TornadoRow {
            driver,
            label: driver.label().to_string(),
            points,
            irr_swing,
        });
    }
    rows.sort_by(|a, b| b.irr_swing.cmp(&a.irr_swing));

    tracing::debug!(runs = cells.len(), "tornado sweep complete");

    let output = TornadoOutput {
        base_irr_pct: base_result.irr_pct,
        base_npv: base_result.npv,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time Sensitivity (Tornado)",
        &serde_json::json!({
            "project_name": base.project_name,
            "changes_pct": changes.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            "drivers": SensitivityDriver::TORNADO.iter().map(|d| d.label()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Two-way grids
// ---------------------------------------------------------------------------

/// Output of a two-way sensitivity grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: String,
    /// Matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Decimal>>,
    pub base_case_value: Decimal,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Symmetric percentage band, e.g. -20..=20 in steps of 10.
pub fn percent_band(name: &str, span_pct: Decimal, step_pct: Decimal) -> SensitivityVariable {
    SensitivityVariable {
        name: name.to_string(),
        min: -span_pct,
        max: span_pct,
        step: step_pct,
    }
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
pub(crate) fn generate_sweep_values(var: &SensitivityVariable) -> BessFinanceResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(BessFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(BessFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // Step may overshoot the max; keep the end point
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate a two-way grid with an arbitrary cell function.
///
/// `eval_fn` receives (variable_1_value, variable_2_value). Cells run in
/// parallel; a failing cell is recorded as zero with a warning rather than
/// aborting the grid. The base case is the cell nearest the midpoint of
/// both ranges.
pub fn evaluate_grid<F>(
    variable_1: &SensitivityVariable,
    variable_2: &SensitivityVariable,
    output_metric: &str,
    eval_fn: F,
) -> BessFinanceResult<ComputationOutput<SensitivityGrid>>
where
    F: Fn(Decimal, Decimal) -> BessFinanceResult<Decimal> + Sync,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let v1_values = generate_sweep_values(variable_1)?;
    let v2_values = generate_sweep_values(variable_2)?;

    let cells: Vec<(Decimal, Decimal)> = v1_values
        .iter()
        .flat_map(|a| v2_values.iter().map(move |b| (*a, *b)))
        .collect();
    let evaluated: Vec<BessFinanceResult<Decimal>> =
        cells.par_iter().map(|(a, b)| eval_fn(*a, *b)).collect();

    let mut flat = Vec::with_capacity(cells.len());
    for ((v1, v2), value) in cells.iter().zip(evaluated) {
        match value {
            Ok(val) => flat.push(val),
            Err(e) => {
                warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                flat.push(Decimal::ZERO);
            }
        }
    }
    let matrix: Vec<Vec<Decimal>> = flat.chunks(v2_values.len()).map(<[Decimal]>::to_vec).collect();

    let mid1 = (variable_1.min + variable_1.max) / dec!(2);
    let mid2 = (variable_2.min + variable_2.max) / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    tracing::debug!(cells = cells.len(), metric = output_metric, "grid evaluated");

    let output = SensitivityGrid {
        variable_1_name: variable_1.name.clone(),
        variable_2_name: variable_2.name.clone(),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        output_metric: output_metric.to_string(),
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-Way Sensitivity Grid",
        &serde_json::json!({
            "variable_1": variable_1.name,
            "variable_2": variable_2.name,
            "output_metric": output_metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Two-way grid over any pair of drivers; values are % changes.
pub fn run_driver_grid(
    base: &AssumptionSet,
    rows: (SensitivityDriver, &SensitivityVariable),
    cols: (SensitivityDriver, &SensitivityVariable),
    metric: SensitivityMetric,
) -> BessFinanceResult<ComputationOutput<SensitivityGrid>> {
    let (row_driver, row_var) = rows;
    let (col_driver, col_var) = cols;
    evaluate_grid(row_var, col_var, metric.label(), |r, c| {
        let set = col_driver.apply(&row_driver.apply(base, r), c);
        Ok(metric.extract(&compute_financials(&set)?))
    })
}

/// Capex changes down the rows, revenue changes across the columns.
pub fn run_revenue_capex_grid(
    base: &AssumptionSet,
    span_pct: Decimal,
    step_pct: Decimal,
    metric: SensitivityMetric,
) -> BessFinanceResult<ComputationOutput<SensitivityGrid>> {
    let capex = percent_band("CAPEX change (%)", span_pct, step_pct);
    let revenue = percent_band("Revenue change (%)", span_pct, step_pct);
    run_driver_grid(
        base,
        (SensitivityDriver::Capex, &capex),
        (SensitivityDriver::Revenue, &revenue),
        metric,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_set() -> AssumptionSet {
        let mut set = AssumptionSet::default();
        set.technical.capacity_mw = dec!(100);
        set.financing.project_life_years = 20;
        set
    }

    #[test]
    fn test_sweep_values_include_endpoint() {
        let var = SensitivityVariable {
            name: "x".into(),
            min: dec!(0),
            max: dec!(25),
            step: dec!(10),
        };
        assert_eq!(
            generate_sweep_values(&var).unwrap(),
            vec![dec!(0), dec!(10), dec!(20), dec!(25)]
        );
    }

    #[test]
    fn test_sweep_rejects_bad_step() {
        let var = percent_band("x", dec!(20), Decimal::ZERO);
        assert!(generate_sweep_values(&var).is_err());
    }

    #[test]
    fn test_evaluate_grid_with_closure() {
        let v1 = percent_band("a", dec!(2), dec!(1));
        let v2 = percent_band("b", dec!(1), dec!(1));
        let out = evaluate_grid(&v1, &v2, "sum", |a, b| {
            if a == dec!(2) && b == dec!(1) {
                return Err(BessFinanceError::DivisionByZero {
                    context: "test".into(),
                });
            }
            Ok(a + b)
        })
        .unwrap();
        let grid = &out.result;
        assert_eq!(grid.matrix.len(), 5);
        assert_eq!(grid.matrix[0].len(), 3);
        assert_eq!(grid.matrix[0][0], dec!(-3));
        assert_eq!(grid.base_case_position, (2, 1));
        assert_eq!(grid.base_case_value, Decimal::ZERO);
        assert_eq!(grid.matrix[4][2], Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_driver_apply() {
        let set = AssumptionSet::default();
        let up = SensitivityDriver::Revenue.apply(&set, dec!(10));
        assert_eq!(up.commercial.year_one_revenue_k(), dec!(143.0));
        let down = SensitivityDriver::Capex.apply(&set, dec!(-10));
        assert_eq!(down.costs.capex_per_mw_k(), dec!(531.9));
        let opex = SensitivityDriver::Opex.apply(&set, dec!(20));
        assert_eq!(opex.costs.fixed_om_k, dec!(18.0));
    }

    #[test]
    fn test_tornado_directions() {
        let out = run_tornado(&small_set(), &[]).unwrap().result;
        assert_eq!(out.rows.len(), SensitivityDriver::TORNADO.len());

        let row = |d: SensitivityDriver| out.rows.iter().find(|r| r.driver == d).unwrap();
        let revenue = row(SensitivityDriver::Revenue);
        assert_eq!(revenue.points.len(), 4);
        // -20% revenue is worse than +20%
        assert!(revenue.points[0].npv < revenue.points[3].npv);
        let opex = row(SensitivityDriver::Opex);
        assert!(opex.points[0].npv > opex.points[3].npv);

        for pair in out.rows.windows(2) {
            assert!(pair[0].irr_swing >= pair[1].irr_swing);
        }
    }

    #[test]
    fn test_tornado_rejects_full_removal() {
        assert!(run_tornado(&small_set(), &[dec!(-100)]).is_err());
    }

    #[test]
    fn test_revenue_capex_grid_base_matches_model() {
        let set = small_set();
        let out = run_revenue_capex_grid(&set, dec!(20), dec!(10), SensitivityMetric::Npv).unwrap();
        let grid = out.result;
        assert_eq!(grid.variable_1_values.len(), 5);
        assert_eq!(grid.base_case_position, (2, 2));
        let npv = compute_financials(&set).unwrap().npv;
        assert!(
            (grid.base_case_value - npv).abs() < dec!(0.000001),
            "grid base {} vs model {}",
            grid.base_case_value,
            npv
        );
        // more capex lowers NPV, more revenue raises it
        assert!(grid.matrix[0][2] > grid.matrix[4][2]);
        assert!(grid.matrix[2][4] > grid.matrix[2][0]);
    }
}
