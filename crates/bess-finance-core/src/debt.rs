use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::FinancingAssumptions;
use crate::time_value::pmt;
use crate::types::{pct_to_rate, Money, Rate};
use crate::BessFinanceResult;

/// Rounding residue below this (in £) is treated as a fully repaid loan.
const BALANCE_TOLERANCE: Money = dec!(0.000001);

/// Debt service falling due in one operating year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtServiceYear {
    pub year_index: u32,
    /// Rate applied to the opening balance this year
    pub rate: Rate,
    /// Scheduled payment (the annuity while inside the tenor)
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Fixed-payment senior loan with an optional one-time rate reset.
///
/// The annuity is sized once from the initial rate and is not re-sized at
/// refinancing: after the reset the same payment splits differently between
/// interest and principal, so amortisation speeds up (or slows down) from
/// the refinance year onwards.
#[derive(Debug, Clone)]
pub struct DebtSchedule {
    principal: Money,
    annuity: Money,
    initial_rate: Rate,
    effective_tenor: u32,
    refinancing: Option<(u32, Rate)>,
    outstanding: Money,
}

impl DebtSchedule {
    pub fn new(principal: Money, financing: &FinancingAssumptions) -> BessFinanceResult<Self> {
        let effective_tenor =
            effective_tenor(financing.debt_tenor_years, financing.project_life_years);
        let initial_rate = pct_to_rate(financing.all_in_rate_pct());
        let annuity = annuity_payment(principal, initial_rate, effective_tenor)?;

        Ok(Self {
            principal,
            annuity,
            initial_rate,
            effective_tenor,
            refinancing: financing
                .refinancing
                .as_ref()
                .map(|refi| (refi.after_cod_years, pct_to_rate(refi.rate_pct))),
            outstanding: principal,
        })
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annuity(&self) -> Money {
        self.annuity
    }

    pub fn effective_tenor(&self) -> u32 {
        self.effective_tenor
    }

    pub fn outstanding(&self) -> Money {
        self.outstanding
    }

    /// Interest rate applicable in operating year `year_index`.
    pub fn rate_for_year(&self, year_index: u32) -> Rate {
        match self.refinancing {
            Some((after, rate)) if year_index > after => rate,
            _ => self.initial_rate,
        }
    }

    /// Service the loan for `year_index` and advance the outstanding balance.
    /// Years must be serviced in order.
    pub fn service_year(&mut self, year_index: u32) -> DebtServiceYear {
        let rate = self.rate_for_year(year_index);

        if year_index > self.effective_tenor {
            return DebtServiceYear {
                year_index,
                rate,
                payment: Decimal::ZERO,
                interest: Decimal::ZERO,
                principal: Decimal::ZERO,
                closing_balance: self.outstanding,
            };
        }

        let interest = self.outstanding * rate;
        let principal = (self.annuity - interest).max(Decimal::ZERO);
        let closing = self.outstanding - principal;
        self.outstanding = if closing < BALANCE_TOLERANCE {
            Decimal::ZERO
        } else {
            closing
        };

        DebtServiceYear {
            year_index,
            rate,
            payment: self.annuity,
            interest,
            principal,
            closing_balance: self.outstanding,
        }
    }
}

/// Amortisation period: the tenor capped at the project life, at least one year.
pub fn effective_tenor(tenor_years: u32, project_life_years: u32) -> u32 {
    tenor_years.min(project_life_years).max(1)
}

/// Level annual payment that repays `principal` over `periods` at `rate`.
/// A zero rate repays in equal principal instalments.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> BessFinanceResult<Money> {
    if principal.is_zero() {
        return Ok(Decimal::ZERO);
    }
    Ok(-pmt(rate, periods, principal, Decimal::ZERO)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::RefinancingTerms;
    use rust_decimal_macros::dec;

    fn financing(tenor: u32, life: u32, refi: Option<RefinancingTerms>) -> FinancingAssumptions {
        FinancingAssumptions {
            debt_pct: dec!(60),
            base_rate_pct: dec!(4),
            margin_pct: dec!(5),
            debt_tenor_years: tenor,
            refinancing: refi,
            project_life_years: life,
            ..FinancingAssumptions::default()
        }
    }

    #[test]
    fn test_effective_tenor_bounds() {
        assert_eq!(effective_tenor(15, 20), 15);
        assert_eq!(effective_tenor(25, 20), 20);
        assert_eq!(effective_tenor(0, 20), 1);
        assert_eq!(effective_tenor(10, 0), 1);
    }

    #[test]
    fn test_annuity_formula() {
        // 19.8m at 9% over 15 years ≈ 2,456,366
        let a = annuity_payment(dec!(19_800_000), dec!(0.09), 15).unwrap();
        assert!((a - dec!(2_456_366)).abs() < dec!(1), "annuity {a}");
    }

    #[test]
    fn test_zero_rate_annuity_is_straight_line() {
        let a = annuity_payment(dec!(1_000_000), Decimal::ZERO, 10).unwrap();
        assert_eq!(a, dec!(100_000));
    }

    #[test]
    fn test_balance_amortises_to_zero_at_tenor() {
        let mut schedule = DebtSchedule::new(dec!(19_800_000), &financing(15, 20, None)).unwrap();
        let mut previous = schedule.outstanding();
        for y in 1..=20 {
            let ds = schedule.service_year(y);
            assert!(ds.closing_balance <= previous, "year {y} balance increased");
            assert!(ds.closing_balance >= Decimal::ZERO);
            previous = ds.closing_balance;
            if y > 15 {
                assert_eq!(ds.payment, Decimal::ZERO);
                assert_eq!(ds.closing_balance, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_first_year_interest_principal_split() {
        let mut schedule = DebtSchedule::new(dec!(1_000_000), &financing(10, 20, None)).unwrap();
        let ds = schedule.service_year(1);
        assert_eq!(ds.interest, dec!(90_000));
        assert_eq!(ds.principal, schedule.annuity() - dec!(90_000));
        assert_eq!(ds.payment, ds.interest + ds.principal);
    }

    #[test]
    fn test_refinancing_keeps_annuity_and_changes_split() {
        let refi = RefinancingTerms {
            after_cod_years: 2,
            rate_pct: dec!(3),
        };
        let mut with_refi =
            DebtSchedule::new(dec!(1_000_000), &financing(10, 20, Some(refi))).unwrap();
        let mut without = DebtSchedule::new(dec!(1_000_000), &financing(10, 20, None)).unwrap();
        assert_eq!(with_refi.annuity(), without.annuity());

        for y in 1..=2 {
            assert_eq!(with_refi.service_year(y), without.service_year(y));
        }

        let refi_y3 = with_refi.service_year(3);
        let base_y3 = without.service_year(3);
        assert_eq!(refi_y3.rate, dec!(0.03));
        assert_eq!(refi_y3.payment, base_y3.payment);
        assert!(refi_y3.interest < base_y3.interest);
        assert!(refi_y3.principal > base_y3.principal);
    }

    #[test]
    fn test_lower_refinance_rate_repays_early_but_payment_continues() {
        let refi = RefinancingTerms {
            after_cod_years: 1,
            rate_pct: dec!(0),
        };
        let mut schedule =
            DebtSchedule::new(dec!(1_000_000), &financing(10, 20, Some(refi))).unwrap();
        let mut last = None;
        for y in 1..=10 {
            last = Some(schedule.service_year(y));
        }
        let last = last.unwrap();
        assert_eq!(last.closing_balance, Decimal::ZERO);
        assert_eq!(last.payment, schedule.annuity());
        assert_eq!(last.interest, Decimal::ZERO);
    }

    #[test]
    fn test_zero_principal_has_no_service() {
        let mut schedule = DebtSchedule::new(Decimal::ZERO, &financing(15, 20, None)).unwrap();
        assert_eq!(schedule.annuity(), Decimal::ZERO);
        let ds = schedule.service_year(1);
        assert_eq!(ds.payment, Decimal::ZERO);
        assert_eq!(ds.interest, Decimal::ZERO);
        assert_eq!(ds.principal, Decimal::ZERO);
    }
}
