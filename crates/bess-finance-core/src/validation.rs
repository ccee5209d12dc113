use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::AssumptionSet;

/// Advisory finding about an assumption value. Never blocks a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

impl ValidationWarning {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check assumptions against plausibility ranges and lender thresholds.
///
/// Returns every finding in a fixed order; an empty list means the set looks
/// sensible. The engine runs regardless of what this reports.
pub fn validate_assumptions(assumptions: &AssumptionSet) -> Vec<ValidationWarning> {
    let tech = &assumptions.technical;
    let financing = &assumptions.financing;
    let targets = &assumptions.targets;
    let mut warnings = Vec::new();

    if tech.capacity_mw <= Decimal::ZERO {
        warnings.push(ValidationWarning::new(
            "technical.capacity_mw",
            "Capacity must be positive",
        ));
    }

    let eff = tech.roundtrip_efficiency_pct;
    if eff < dec!(50) || eff > dec!(100) {
        warnings.push(ValidationWarning::new(
            "technical.roundtrip_efficiency_pct",
            format!("Round-trip efficiency {eff}% should be between 50% and 100%"),
        ));
    }

    let degr = tech.degradation_rate_pct;
    if degr < Decimal::ZERO || degr > dec!(8) {
        warnings.push(ValidationWarning::new(
            "technical.degradation_rate_pct",
            format!("Degradation rate {degr}% should be between 0% and 8%"),
        ));
    }

    let avail = tech.availability_pct;
    if avail < Decimal::ZERO || avail > dec!(100) {
        warnings.push(ValidationWarning::new(
            "technical.availability_pct",
            format!("Availability {avail}% should be between 0% and 100%"),
        ));
    }

    if targets.dscr_covenant < Decimal::ONE {
        warnings.push(ValidationWarning::new(
            "targets.dscr_covenant",
            format!("DSCR covenant {} should be at least 1.0x", targets.dscr_covenant),
        ));
    }

    if financing.debt_pct > targets.max_gearing_pct {
        warnings.push(ValidationWarning::new(
            "financing.debt_pct",
            format!(
                "Debt percentage {}% exceeds maximum gearing of {}%",
                financing.debt_pct, targets.max_gearing_pct
            ),
        ));
    }

    if financing.debt_tenor_years > financing.project_life_years {
        warnings.push(ValidationWarning::new(
            "financing.debt_tenor_years",
            format!(
                "Debt tenor of {} years exceeds project life of {} years; amortised over the life instead",
                financing.debt_tenor_years, financing.project_life_years
            ),
        ));
    }

    if let Some(refi) = &financing.refinancing {
        if refi.after_cod_years >= financing.debt_tenor_years {
            warnings.push(ValidationWarning::new(
                "financing.refinancing.after_cod_years",
                format!(
                    "Refinancing after year {} never takes effect within a {}-year tenor",
                    refi.after_cod_years, financing.debt_tenor_years
                ),
            ));
        }
    }

    warnings
}
