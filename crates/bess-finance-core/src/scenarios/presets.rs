use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assumptions::AssumptionSet;
use crate::error::BessFinanceError;
use crate::types::{Money, Percent};

/// Named market outlook that overlays revenue, opex and debt pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPreset {
    Conservative,
    Base,
    Optimistic,
}

/// Values a preset writes over an assumption set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetValues {
    pub revenue_escalation_pct: Percent,
    pub energy_trading_k: Money,
    pub frequency_response_k: Money,
    pub capacity_market_k: Money,
    pub ancillary_services_k: Money,
    pub floor_revenue_k: Money,
    pub fixed_om_k: Money,
    pub variable_om_per_mwh: Money,
    pub ltsa_k: Money,
    pub grid_om_k: Money,
    pub insurance_pct_capex: Percent,
    pub business_rates_pct_capex: Percent,
    pub asset_management_pct_capex: Percent,
    pub land_lease_k: Money,
    pub debt_pct: Percent,
    pub base_rate_pct: Percent,
    pub margin_pct: Percent,
}

impl ScenarioPreset {
    pub const ALL: [ScenarioPreset; 3] = [Self::Conservative, Self::Base, Self::Optimistic];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Base => "base",
            Self::Optimistic => "optimistic",
        }
    }

    pub fn values(&self) -> PresetValues {
        match self {
            Self::Conservative => PresetValues {
                revenue_escalation_pct: dec!(1.5),
                energy_trading_k: dec!(25),
                frequency_response_k: dec!(15),
                capacity_market_k: dec!(35),
                ancillary_services_k: dec!(15),
                floor_revenue_k: dec!(20),
                fixed_om_k: dec!(18),
                variable_om_per_mwh: dec!(0.8),
                ltsa_k: dec!(10),
                grid_om_k: dec!(2.0),
                insurance_pct_capex: dec!(0.6),
                business_rates_pct_capex: dec!(0.9),
                asset_management_pct_capex: dec!(1.0),
                land_lease_k: dec!(3.0),
                debt_pct: dec!(60),
                base_rate_pct: dec!(4.0),
                margin_pct: dec!(5.0),
            },
            Self::Base => PresetValues {
                revenue_escalation_pct: dec!(2.0),
                energy_trading_k: dec!(35),
                frequency_response_k: dec!(25),
                capacity_market_k: dec!(45),
                ancillary_services_k: dec!(25),
                floor_revenue_k: Decimal::ZERO,
                fixed_om_k: dec!(15),
                variable_om_per_mwh: dec!(0.5),
                ltsa_k: dec!(7),
                grid_om_k: dec!(1.6),
                insurance_pct_capex: dec!(0.5),
                business_rates_pct_capex: dec!(0.8),
                asset_management_pct_capex: dec!(0.8),
                land_lease_k: dec!(2.0),
                debt_pct: dec!(65),
                base_rate_pct: dec!(4.5),
                margin_pct: dec!(5.5),
            },
            Self::Optimistic => PresetValues {
                revenue_escalation_pct: dec!(2.5),
                energy_trading_k: dec!(45),
                frequency_response_k: dec!(35),
                capacity_market_k: dec!(55),
                ancillary_services_k: dec!(35),
                floor_revenue_k: dec!(30),
                fixed_om_k: dec!(12),
                variable_om_per_mwh: dec!(0.4),
                ltsa_k: dec!(5),
                grid_om_k: dec!(1.3),
                insurance_pct_capex: dec!(0.4),
                business_rates_pct_capex: dec!(0.6),
                asset_management_pct_capex: dec!(0.6),
                land_lease_k: dec!(1.5),
                debt_pct: dec!(70),
                base_rate_pct: dec!(4.0),
                margin_pct: dec!(4.5),
            },
        }
    }

    /// Copy of `base` with this preset's values written over it. Fields the
    /// preset does not cover (capacity, capex, tenor, ...) are kept.
    pub fn apply(&self, base: &AssumptionSet) -> AssumptionSet {
        let v = self.values();
        let mut set = base.clone();

        let commercial = &mut set.commercial;
        commercial.revenue_escalation_pct = v.revenue_escalation_pct;
        commercial.energy_trading_k = v.energy_trading_k;
        commercial.frequency_response_k = v.frequency_response_k;
        commercial.capacity_market_k = v.capacity_market_k;
        commercial.ancillary_services_k = v.ancillary_services_k;
        commercial.floor_revenue_k = v.floor_revenue_k;

        let costs = &mut set.costs;
        costs.fixed_om_k = v.fixed_om_k;
        costs.variable_om_per_mwh = v.variable_om_per_mwh;
        costs.ltsa_k = v.ltsa_k;
        costs.grid_om_k = v.grid_om_k;
        costs.insurance_pct_capex = v.insurance_pct_capex;
        costs.business_rates_pct_capex = v.business_rates_pct_capex;
        costs.asset_management_pct_capex = v.asset_management_pct_capex;
        costs.land_lease_k = v.land_lease_k;

        let financing = &mut set.financing;
        financing.debt_pct = v.debt_pct;
        financing.base_rate_pct = v.base_rate_pct;
        financing.margin_pct = v.margin_pct;

        set
    }
}

impl fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioPreset {
    type Err = BessFinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conservative" | "downside" => Ok(Self::Conservative),
            "base" => Ok(Self::Base),
            "optimistic" | "upside" => Ok(Self::Optimistic),
            other => Err(BessFinanceError::InvalidInput {
                field: "preset".into(),
                reason: format!("Unknown preset '{other}' (expected conservative, base or optimistic)"),
            }),
        }
    }
}
