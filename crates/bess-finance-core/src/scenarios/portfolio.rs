use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::AssumptionSet;
use crate::model::compute_financials;
use crate::types::*;
use crate::BessFinanceResult;

/// A named project in a portfolio batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub name: String,
    #[serde(default)]
    pub assumptions: AssumptionSet,
}

/// Return band used to colour the portfolio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnRating {
    /// IRR above 15%
    Excellent,
    /// IRR above 12%
    Good,
    /// IRR above 8%
    Marginal,
    Poor,
}

impl ReturnRating {
    pub fn from_irr_pct(irr_pct: Percent) -> Self {
        if irr_pct > dec!(15) {
            Self::Excellent
        } else if irr_pct > dec!(12) {
            Self::Good
        } else if irr_pct > dec!(8) {
            Self::Marginal
        } else {
            Self::Poor
        }
    }
}

/// One row of the portfolio table. Money in £m.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub capacity_mw: Decimal,
    pub duration_hours: Decimal,
    pub total_capex: Money,
    pub irr_pct: Percent,
    pub npv: Money,
    pub moic: Option<Multiple>,
    pub average_dscr: Multiple,
    pub min_dscr: Option<Multiple>,
    pub simple_payback_year: u32,
    pub rating: ReturnRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    /// Sorted by IRR, highest first; ties keep input order
    pub projects: Vec<ProjectSummary>,
    pub total_capacity_mw: Decimal,
    pub total_capex: Money,
    pub total_npv: Money,
    /// IRR weighted by nameplate MW; zero for an empty or zero-MW portfolio
    pub capacity_weighted_irr_pct: Percent,
}

/// Evaluate every project and rank them by equity IRR.
pub fn rank_portfolio(entries: &[PortfolioEntry]) -> BessFinanceResult<ComputationOutput<PortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut projects = entries
        .par_iter()
        .map(|entry| {
            let a = &entry.assumptions;
            let r = compute_financials(a)?;
            Ok(ProjectSummary {
                name: entry.name.clone(),
                capacity_mw: a.technical.capacity_mw,
                duration_hours: a.technical.duration_hours,
                total_capex: r.total_capex,
                irr_pct: r.irr_pct,
                npv: r.npv,
                moic: r.moic,
                average_dscr: r.average_dscr,
                min_dscr: r.min_dscr,
                simple_payback_year: r.simple_payback_year,
                rating: ReturnRating::from_irr_pct(r.irr_pct),
            })
        })
        .collect::<BessFinanceResult<Vec<_>>>()?;

    projects.sort_by(|a, b| b.irr_pct.cmp(&a.irr_pct));

    for p in projects.iter().filter(|p| p.irr_pct.is_zero()) {
        warnings.push(format!("{}: IRR reported as 0% (no crossing within the 0-50% scan)", p.name));
    }

    let total_capacity_mw: Decimal = projects.iter().map(|p| p.capacity_mw).sum();
    let total_capex: Money = projects.iter().map(|p| p.total_capex).sum();
    let total_npv: Money = projects.iter().map(|p| p.npv).sum();
    let capacity_weighted_irr_pct = if total_capacity_mw.is_zero() {
        Decimal::ZERO
    } else {
        projects.iter().map(|p| p.irr_pct * p.capacity_mw).sum::<Decimal>() / total_capacity_mw
    };

    tracing::debug!(projects = projects.len(), "portfolio ranked");

    let output = PortfolioOutput {
        projects,
        total_capacity_mw,
        total_capex,
        total_npv,
        capacity_weighted_irr_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "BESS Portfolio Ranking",
        &serde_json::json!({
            "projects": entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, revenue_factor: Decimal, mw: Decimal) -> PortfolioEntry {
        let mut assumptions = AssumptionSet::default();
        assumptions.project_name = name.to_string();
        assumptions.technical.capacity_mw = mw;
        assumptions.commercial.scale(revenue_factor);
        PortfolioEntry {
            name: name.to_string(),
            assumptions,
        }
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(ReturnRating::from_irr_pct(dec!(15.1)), ReturnRating::Excellent);
        assert_eq!(ReturnRating::from_irr_pct(dec!(15)), ReturnRating::Good);
        assert_eq!(ReturnRating::from_irr_pct(dec!(9)), ReturnRating::Marginal);
        assert_eq!(ReturnRating::from_irr_pct(dec!(8)), ReturnRating::Poor);
    }

    #[test]
    fn test_sorted_by_irr_descending() {
        let entries = vec![
            entry("Low", dec!(0.5), dec!(50)),
            entry("High", dec!(0.9), dec!(100)),
            entry("Mid", dec!(0.7), dec!(200)),
        ];
        let out = rank_portfolio(&entries).unwrap().result;
        let names: Vec<&str> = out.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid", "Low"]);
        assert_eq!(out.total_capacity_mw, dec!(350));
    }

    #[test]
    fn test_weighted_irr_between_extremes() {
        let entries = vec![entry("A", dec!(0.6), dec!(100)), entry("B", dec!(0.9), dec!(300))];
        let out = rank_portfolio(&entries).unwrap().result;
        let hi = out.projects[0].irr_pct;
        let lo = out.projects[1].irr_pct;
        assert!(out.capacity_weighted_irr_pct <= hi && out.capacity_weighted_irr_pct >= lo);
    }

    #[test]
    fn test_empty_portfolio() {
        let out = rank_portfolio(&[]).unwrap().result;
        assert!(out.projects.is_empty());
        assert_eq!(out.capacity_weighted_irr_pct, Decimal::ZERO);
    }
}
