use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::AssumptionSet;
use crate::model::compute_financials;
use crate::scenarios::sensitivity::generate_sweep_values;
use crate::types::*;
use crate::BessFinanceResult;

/// Range of gearing levels to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtSweep {
    pub min_pct: Percent,
    pub max_pct: Percent,
    pub step_pct: Percent,
    /// DSCR floor each candidate must clear; `None` uses `targets.min_dscr`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_dscr: Option<Multiple>,
}

impl Default for DebtSweep {
    fn default() -> Self {
        Self {
            min_pct: dec!(50),
            max_pct: dec!(90),
            step_pct: dec!(5),
            min_dscr: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtOptimizationRow {
    pub debt_pct: Percent,
    pub irr_pct: Percent,
    pub npv: Money,
    pub min_dscr: Option<Multiple>,
    pub average_dscr: Multiple,
    /// Clears the DSCR floor (no debt service at all counts as clearing)
    pub feasible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtOptimizationOutput {
    pub dscr_floor: Multiple,
    pub gearing_cap_pct: Percent,
    /// Every candidate evaluated, lowest gearing first
    pub rows: Vec<DebtOptimizationRow>,
    /// Highest-IRR feasible candidate; ties go to the lower gearing
    pub optimal: Option<DebtOptimizationRow>,
}

/// Sweep the debt fraction and pick the gearing that maximises equity IRR
/// while the minimum DSCR stays at or above the floor.
///
/// Candidates above `targets.max_gearing_pct` are dropped. If that leaves
/// nothing, the cap itself is evaluated.
pub fn optimize_debt_fraction(
    base: &AssumptionSet,
    sweep: &DebtSweep,
) -> BessFinanceResult<ComputationOutput<DebtOptimizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let dscr_floor = sweep.min_dscr.unwrap_or(base.targets.min_dscr);
    let cap = base.targets.max_gearing_pct;

    let mut candidates: Vec<Percent> = generate_sweep_values(&SensitivityVariable {
        name: "debt_pct".into(),
        min: sweep.min_pct,
        max: sweep.max_pct,
        step: sweep.step_pct,
    })?
    .into_iter()
    .filter(|pct| *pct <= cap)
    .collect();
    if candidates.is_empty() {
        warnings.push(format!(
            "Sweep range lies entirely above the {cap}% gearing cap; evaluating the cap only"
        ));
        candidates.push(cap);
    }

    let rows = candidates
        .par_iter()
        .map(|pct| {
            let mut set = base.clone();
            set.financing.debt_pct = *pct;
            let r = compute_financials(&set)?;
            Ok(DebtOptimizationRow {
                debt_pct: *pct,
                irr_pct: r.irr_pct,
                npv: r.npv,
                min_dscr: r.min_dscr,
                average_dscr: r.average_dscr,
                feasible: r.min_dscr.map_or(true, |d| d >= dscr_floor),
            })
        })
        .collect::<BessFinanceResult<Vec<_>>>()?;

    let mut optimal: Option<&DebtOptimizationRow> = None;
    for row in rows.iter().filter(|r| r.feasible) {
        if optimal.map_or(true, |best| row.irr_pct > best.irr_pct) {
            optimal = Some(row);
        }
    }
    let optimal = optimal.cloned();

    match &optimal {
        None => warnings.push(format!(
            "No gearing in the sweep keeps minimum DSCR at or above {dscr_floor}x"
        )),
        Some(best) if best.irr_pct.is_zero() => warnings.push(
            "Optimal candidate reports 0% IRR; returns may exceed the 50% scan ceiling".to_string(),
        ),
        _ => {}
    }

    tracing::debug!(
        candidates = rows.len(),
        optimal = ?optimal.as_ref().map(|r| r.debt_pct),
        "debt sweep complete"
    );

    let output = DebtOptimizationOutput {
        dscr_floor,
        gearing_cap_pct: cap,
        rows,
        optimal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt Fraction Optimisation (IRR subject to DSCR floor)",
        &serde_json::json!({
            "project_name": base.project_name,
            "sweep": sweep,
            "dscr_floor": dscr_floor.to_string(),
            "max_gearing_pct": cap.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> AssumptionSet {
        let mut set = AssumptionSet::default();
        set.technical.capacity_mw = dec!(100);
        set.financing.project_life_years = 20;
        set
    }

    #[test]
    fn test_default_sweep_capped_at_max_gearing() {
        let out = optimize_debt_fraction(&project(), &DebtSweep::default()).unwrap().result;
        let pcts: Vec<Decimal> = out.rows.iter().map(|r| r.debt_pct).collect();
        assert_eq!(pcts.first(), Some(&dec!(50)));
        assert_eq!(pcts.last(), Some(&dec!(85)));
        assert_eq!(pcts.len(), 8);
    }

    #[test]
    fn test_optimal_is_feasible_and_best() {
        let out = optimize_debt_fraction(&project(), &DebtSweep::default()).unwrap().result;
        let best = out.optimal.expect("some gearing should be feasible");
        assert!(best.feasible);
        for row in out.rows.iter().filter(|r| r.feasible) {
            assert!(row.irr_pct <= best.irr_pct, "{} beats optimum", row.debt_pct);
        }
    }

    #[test]
    fn test_unreachable_floor_has_no_optimum() {
        let sweep = DebtSweep {
            min_dscr: Some(dec!(100)),
            ..DebtSweep::default()
        };
        let out = optimize_debt_fraction(&project(), &sweep).unwrap();
        assert!(out.result.optimal.is_none());
        assert!(out.result.rows.iter().all(|r| !r.feasible));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_range_above_cap_evaluates_cap() {
        let mut set = project();
        set.targets.max_gearing_pct = dec!(40);
        let out = optimize_debt_fraction(&set, &DebtSweep::default()).unwrap();
        assert_eq!(out.result.rows.len(), 1);
        assert_eq!(out.result.rows[0].debt_pct, dec!(40));
    }

    #[test]
    fn test_higher_gearing_lowers_min_dscr() {
        let out = optimize_debt_fraction(&project(), &DebtSweep::default()).unwrap().result;
        for pair in out.rows.windows(2) {
            assert!(pair[0].min_dscr >= pair[1].min_dscr);
        }
    }
}
