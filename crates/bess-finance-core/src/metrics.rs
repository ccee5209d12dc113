use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cash_flow::CashFlowYear;
use crate::error::BessFinanceError;
use crate::time_value::{self, equity_npv, scan_irr};
use crate::types::{Money, Multiple, Percent, Rate};
use crate::BessFinanceResult;

/// How the equity IRR is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrStrategy {
    /// First 0.1% step from 0% to 50% at which NPV ≤ 0 (dashboard-compatible)
    #[default]
    LinearScan,
    /// Newton-Raphson root of the same equity cash flows; falls back to the
    /// scan when it does not converge
    NewtonRaphson,
}

/// Run-level inputs to the metrics pass. Money in £m.
#[derive(Debug, Clone)]
pub struct MetricsInputs {
    pub equity_amount: Money,
    /// Capex including contingency
    pub total_capex: Money,
    pub discount_rate: Rate,
    /// Contractual tenor; bounds the DSCR averaging window
    pub debt_tenor_years: u32,
    pub capacity_mw: Decimal,
    pub irr_strategy: IrrStrategy,
}

/// Summary investment metrics derived from the year records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub npv: Money,
    pub irr_pct: Percent,
    pub average_dscr: Multiple,
    pub min_dscr: Option<Multiple>,
    pub total_cash_flows: Money,
    pub simple_payback_year: u32,
    pub discounted_payback_year: u32,
    pub moic: Option<Multiple>,
    pub ev_per_mw: Option<Money>,
}

pub fn compute_return_metrics(
    years: &[CashFlowYear],
    inputs: &MetricsInputs,
) -> BessFinanceResult<ReturnMetrics> {
    let flows: Vec<Money> = years.iter().map(|y| y.free_cash_flow).collect();
    let equity = inputs.equity_amount;

    let npv = equity_npv(inputs.discount_rate, &flows, equity)?;
    let irr_pct = equity_irr_pct(&flows, equity, inputs.irr_strategy)?;
    let (average_dscr, min_dscr) = dscr_statistics(years, inputs.debt_tenor_years);
    let (simple_payback_year, discounted_payback_year) =
        payback_years(years, equity, inputs.discount_rate)?;

    let total_cash_flows: Money = flows.iter().sum();
    let moic = if equity.is_zero() {
        None
    } else {
        Some(total_cash_flows / equity)
    };

    let ev_per_mw = if inputs.capacity_mw.is_zero() {
        None
    } else {
        Some(inputs.total_capex / inputs.capacity_mw)
    };

    Ok(ReturnMetrics {
        npv,
        irr_pct,
        average_dscr,
        min_dscr,
        total_cash_flows,
        simple_payback_year,
        discounted_payback_year,
        moic,
        ev_per_mw,
    })
}

/// Equity IRR in percent. A scan with no crossing reports 0.
pub fn equity_irr_pct(flows: &[Money], equity: Money, strategy: IrrStrategy) -> BessFinanceResult<Percent> {
    let scanned = || -> BessFinanceResult<Percent> {
        Ok(scan_irr(flows, equity)?.unwrap_or(Decimal::ZERO) * dec!(100))
    };

    match strategy {
        IrrStrategy::LinearScan => scanned(),
        IrrStrategy::NewtonRaphson => {
            match time_value::newton_irr(flows, equity, dec!(0.10)) {
                Ok(rate) => Ok(rate * dec!(100)),
                Err(e @ BessFinanceError::ConvergenceFailure { .. })
                | Err(e @ BessFinanceError::InsufficientData(_)) => {
                    tracing::warn!(error = %e, "newton IRR failed, falling back to linear scan");
                    scanned()
                }
                Err(e) => Err(e),
            }
        }
    }
}

/// Average and minimum DSCR over years `1..=min(len, tenor)`.
///
/// Unbounded cover (`None`) counts as zero in the average but is ignored by
/// the minimum; the minimum is `None` when no year in the window has finite
/// cover.
pub fn dscr_statistics(years: &[CashFlowYear], debt_tenor_years: u32) -> (Multiple, Option<Multiple>) {
    let window = years.len().min(debt_tenor_years as usize);
    if window == 0 {
        return (Decimal::ZERO, None);
    }

    let in_window = &years[..window];
    let sum: Decimal = in_window.iter().map(|y| y.dscr.unwrap_or(Decimal::ZERO)).sum();
    let min = in_window.iter().filter_map(|y| y.dscr).min();

    (sum / Decimal::from(window as u64), min)
}

/// First year (1-based) at which cumulative FCF, starting from `-equity`,
/// reaches zero: undiscounted and discounted. 0 means never within the life.
pub fn payback_years(years: &[CashFlowYear], equity: Money, discount_rate: Rate) -> BessFinanceResult<(u32, u32)> {
    if discount_rate <= dec!(-1) {
        return Err(BessFinanceError::InvalidInput {
            field: "discount_rate_pct".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + discount_rate;
    let mut cumulative = -equity;
    let mut cumulative_discounted = -equity;
    let mut discount = Decimal::ONE;
    let mut simple = 0;
    let mut discounted = 0;

    for y in years {
        discount *= one_plus_r;
        cumulative += y.free_cash_flow;
        cumulative_discounted += y.free_cash_flow / discount;
        if simple == 0 && cumulative >= Decimal::ZERO {
            simple = y.year_index;
        }
        if discounted == 0 && cumulative_discounted >= Decimal::ZERO {
            discounted = y.year_index;
        }
    }

    Ok((simple, discounted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(index: u32, fcf: Money, dscr: Option<Multiple>) -> CashFlowYear {
        CashFlowYear {
            year: 2027 + index as i32,
            year_index: index,
            effective_capacity_mw: dec!(100),
            revenue_per_mw_k: dec!(100),
            revenue: Decimal::ZERO,
            opex: Decimal::ZERO,
            ebitda: Decimal::ZERO,
            interest_rate_pct: Decimal::ZERO,
            interest: Decimal::ZERO,
            principal: Decimal::ZERO,
            debt_service: Decimal::ZERO,
            outstanding_debt: Decimal::ZERO,
            augmentation: Decimal::ZERO,
            ebt: Decimal::ZERO,
            tax: Decimal::ZERO,
            net_income: Decimal::ZERO,
            free_cash_flow: fcf,
            cumulative_free_cash_flow: Decimal::ZERO,
            dscr,
        }
    }

    fn inputs(equity: Money) -> MetricsInputs {
        MetricsInputs {
            equity_amount: equity,
            total_capex: dec!(30),
            discount_rate: dec!(0.10),
            debt_tenor_years: 3,
            capacity_mw: dec!(100),
            irr_strategy: IrrStrategy::LinearScan,
        }
    }

    #[test]
    fn test_average_dscr_counts_unbounded_as_zero() {
        let years = vec![
            year(1, dec!(1), Some(dec!(1.5))),
            year(2, dec!(1), None),
            year(3, dec!(1), Some(dec!(1.2))),
            year(4, dec!(1), Some(dec!(0.1))),
        ];
        let (avg, min) = dscr_statistics(&years, 3);
        // (1.5 + 0 + 1.2) / 3; year 4 sits outside the tenor window
        assert_eq!(avg, dec!(0.9));
        assert_eq!(min, Some(dec!(1.2)));
    }

    #[test]
    fn test_min_dscr_none_when_all_unbounded() {
        let years = vec![year(1, dec!(1), None), year(2, dec!(1), None)];
        let (avg, min) = dscr_statistics(&years, 5);
        assert_eq!(avg, Decimal::ZERO);
        assert_eq!(min, None);
    }

    #[test]
    fn test_empty_window() {
        let (avg, min) = dscr_statistics(&[], 10);
        assert_eq!(avg, Decimal::ZERO);
        assert_eq!(min, None);
    }

    #[test]
    fn test_payback_years() {
        let years = vec![
            year(1, dec!(4), None),
            year(2, dec!(4), None),
            year(3, dec!(4), None),
            year(4, dec!(4), None),
        ];
        let (simple, discounted) = payback_years(&years, dec!(10), dec!(0.10)).unwrap();
        assert_eq!(simple, 3);
        // Discounted: 3.636 + 3.306 + 3.005 = 9.947 < 10; year 4 adds 2.732
        assert_eq!(discounted, 4);
    }

    #[test]
    fn test_payback_never_reached_is_zero() {
        let years = vec![year(1, dec!(1), None), year(2, dec!(1), None)];
        assert_eq!(payback_years(&years, dec!(10), dec!(0.05)).unwrap(), (0, 0));
    }

    #[test]
    fn test_metrics_known_answer() {
        let years = vec![year(1, dec!(11), None)];
        let m = compute_return_metrics(&years, &inputs(dec!(10))).unwrap();
        // 11 / 1.1 - 10 = 0
        assert_eq!(m.npv, Decimal::ZERO);
        assert_eq!(m.irr_pct, dec!(10.0));
        assert_eq!(m.total_cash_flows, dec!(11));
        assert_eq!(m.moic, Some(dec!(1.1)));
        // 30 capex over 100 MW
        assert_eq!(m.ev_per_mw, Some(dec!(0.3)));
    }

    #[test]
    fn test_zero_equity_and_capacity_give_none() {
        let years = vec![year(1, dec!(5), None)];
        let mut i = inputs(Decimal::ZERO);
        i.capacity_mw = Decimal::ZERO;
        let m = compute_return_metrics(&years, &i).unwrap();
        assert_eq!(m.moic, None);
        assert_eq!(m.ev_per_mw, None);
    }

    #[test]
    fn test_newton_strategy_close_to_scan() {
        let flows = vec![dec!(4), dec!(4), dec!(4)];
        let scan = equity_irr_pct(&flows, dec!(10), IrrStrategy::LinearScan).unwrap();
        let newton = equity_irr_pct(&flows, dec!(10), IrrStrategy::NewtonRaphson).unwrap();
        assert!(newton <= scan, "newton {newton} should not exceed scan {scan}");
        assert!(scan - newton < dec!(0.1), "scan {scan} newton {newton}");
    }
}
