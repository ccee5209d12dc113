use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::BessFinanceError;
use crate::types::{Money, Rate};
use crate::BessFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Increment between IRR scan candidates (0.1 percentage points).
pub const IRR_SCAN_STEP: Rate = dec!(0.001);

/// Highest rate tried by the IRR scan (50%).
pub const IRR_SCAN_CEILING: Rate = dec!(0.50);

/// `base^periods`, failing instead of panicking when the result overflows.
pub fn compound(base: Decimal, periods: u32) -> BessFinanceResult<Decimal> {
    base.checked_powu(u64::from(periods)).ok_or_else(|| {
        BessFinanceError::FinancialImpossibility(format!(
            "{base} compounded over {periods} periods overflows"
        ))
    })
}

/// Present value of flows received at the end of years 1..=n, less an
/// undiscounted outlay at t = 0.
pub fn equity_npv(rate: Rate, flows: &[Money], outlay: Money) -> BessFinanceResult<Money> {
    Ok(present_value(rate, flows)? - outlay)
}

/// Present value of flows received at the end of years 1..=n.
pub fn present_value(rate: Rate, flows: &[Money]) -> BessFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(BessFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    for cf in flows {
        discount = discount.checked_mul(one_plus_r).ok_or_else(overflow)?;
        let term = cf.checked_div(discount).ok_or_else(overflow)?;
        pv = pv.checked_add(term).ok_or_else(overflow)?;
    }
    Ok(pv)
}

fn overflow() -> BessFinanceError {
    BessFinanceError::FinancialImpossibility("present value overflows".into())
}

/// Linear IRR scan: tries 0%, 0.1%, ... 50% and returns the first rate at
/// which `equity_npv` drops to zero or below. `None` when no candidate
/// crosses, i.e. the return lies above the scan ceiling.
///
/// The scan is one-sided: it reports the first candidate at or past the
/// root, never an interpolated value.
pub fn scan_irr(flows: &[Money], outlay: Money) -> BessFinanceResult<Option<Rate>> {
    let mut rate = Decimal::ZERO;
    while rate <= IRR_SCAN_CEILING {
        if equity_npv(rate, flows, outlay)? <= Decimal::ZERO {
            return Ok(Some(rate));
        }
        rate += IRR_SCAN_STEP;
    }
    Ok(None)
}

/// Equity IRR by Newton-Raphson: the rate at which `equity_npv` is zero.
///
/// Terms whose discount factor overflows are dropped, they contribute
/// nothing at that rate. Fails with `ConvergenceFailure` when the derivative
/// vanishes or the iteration cap is hit.
pub fn newton_irr(flows: &[Money], outlay: Money, guess: Rate) -> BessFinanceResult<Rate> {
    if flows.is_empty() {
        return Err(BessFinanceError::InsufficientData(
            "IRR requires at least one year of cash flow".into(),
        ));
    }

    let mut rate = guess;
    let mut value = Decimal::ZERO;

    for i in 0..MAX_IRR_ITERATIONS {
        let one_plus_r = Decimal::ONE + rate;
        value = -outlay;
        let mut slope = Decimal::ZERO;
        let mut discount = Decimal::ONE;

        for (t, cf) in (1u32..).zip(flows) {
            let Some(next) = discount.checked_mul(one_plus_r) else {
                break;
            };
            discount = next;
            // d/dr of cf / (1+r)^t is -t * cf / (1+r)^(t+1)
            let term = cf.checked_div(discount);
            let dterm = discount
                .checked_mul(one_plus_r)
                .and_then(|d| (Decimal::from(t) * cf).checked_div(d));
            match (term, dterm) {
                (Some(term), Some(dterm)) => {
                    value += term;
                    slope -= dterm;
                }
                _ => break,
            }
        }

        if value.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if slope.is_zero() {
            return Err(BessFinanceError::ConvergenceFailure {
                function: "equity IRR".into(),
                iterations: i,
                last_delta: value,
            });
        }

        rate = (rate - value / slope).clamp(dec!(-0.99), dec!(100));
    }

    Err(BessFinanceError::ConvergenceFailure {
        function: "equity IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: value,
    })
}

/// Payment (PMT), sign convention as in spreadsheets: a positive loan
/// principal yields a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> BessFinanceResult<Money> {
    if nper == 0 {
        return Err(BessFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = compound(Decimal::ONE + rate, nper)?;
    let growth = factor - Decimal::ONE;

    if growth.is_zero() {
        return Err(BessFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(present_value * rate * factor + future_value * rate) / growth)
}
