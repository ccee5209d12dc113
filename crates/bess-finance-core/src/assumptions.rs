use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Percent};

// ---------------------------------------------------------------------------
// Input groups
// ---------------------------------------------------------------------------

/// Physical characteristics of the battery asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalAssumptions {
    /// Nameplate export power (MW)
    pub capacity_mw: Decimal,
    /// Storage duration at nameplate power (hours)
    pub duration_hours: Decimal,
    /// Round-trip efficiency (%)
    pub roundtrip_efficiency_pct: Percent,
    /// Annual capacity degradation, compounding (%)
    pub degradation_rate_pct: Percent,
    /// Technical availability (%)
    pub availability_pct: Percent,
    /// Full equivalent cycles per day
    pub cycles_per_day: Decimal,
    /// Operating year in which the one-off augmentation spend lands; `null`
    /// switches augmentation off
    pub augmentation_year: Option<u32>,
    /// Augmentation spend as a percentage of the initial battery supply capex
    pub augmentation_cost_pct_of_battery: Percent,
}

/// Revenue stack, all per-MW figures in £k/MW/yr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommercialAssumptions {
    pub energy_trading_k: Money,
    pub frequency_response_k: Money,
    pub capacity_market_k: Money,
    pub ancillary_services_k: Money,
    /// Contracted minimum revenue per MW, only inside the contract window
    pub floor_revenue_k: Money,
    pub contract_length_years: u32,
    /// Annual revenue escalation (%)
    pub revenue_escalation_pct: Percent,
}

/// Capital and operating cost assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostAssumptions {
    // CAPEX, £k/MW
    pub epc_k: Money,
    pub battery_supply_k: Money,
    pub balance_of_plant_k: Money,
    pub grid_contestable_k: Money,
    pub grid_non_contestable_k: Money,
    pub development_k: Money,
    pub contingency_pct: Percent,

    // OPEX
    /// Fixed O&M, £k/MW/yr
    pub fixed_om_k: Money,
    /// Variable O&M on cycled energy, £/MWh
    pub variable_om_per_mwh: Money,
    /// Long-term service agreement, £k/MW/yr
    pub ltsa_k: Money,
    /// First operating year the LTSA is payable (0 and 1 both mean from year 1)
    pub ltsa_start_year: u32,
    /// Grid connection O&M, £k/MW/yr
    pub grid_om_k: Money,
    pub insurance_pct_capex: Percent,
    pub business_rates_pct_capex: Percent,
    pub asset_management_pct_capex: Percent,
    /// Land lease, £k/MW/yr
    pub land_lease_k: Money,
}

/// One-off refinancing of the senior loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinancingTerms {
    /// The new rate applies to interest from the year after this one
    pub after_cod_years: u32,
    /// All-in refinanced rate (%)
    pub rate_pct: Percent,
}

/// Debt, tax and valuation assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingAssumptions {
    /// Gearing: debt as a percentage of total capex
    pub debt_pct: Percent,
    pub base_rate_pct: Percent,
    pub margin_pct: Percent,
    pub debt_tenor_years: u32,
    /// `null` keeps the initial rate for the whole tenor
    pub refinancing: Option<RefinancingTerms>,
    pub corporate_tax_pct: Percent,
    pub discount_rate_pct: Percent,
    pub project_life_years: u32,
    /// Commercial operation date; year labels count from its calendar year
    pub cod_date: NaiveDate,
}

/// Lender and investor thresholds. These never change the projection; they
/// drive advisory validation, result warnings and the debt optimiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetAssumptions {
    pub dscr_covenant: Multiple,
    pub min_dscr: Multiple,
    pub max_gearing_pct: Percent,
    pub target_equity_irr_pct: Percent,
}

/// Immutable snapshot of every input to one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    pub project_name: String,
    pub technical: TechnicalAssumptions,
    pub commercial: CommercialAssumptions,
    pub costs: CostAssumptions,
    pub financing: FinancingAssumptions,
    pub targets: TargetAssumptions,
}

// ---------------------------------------------------------------------------
// Defaults: 360 MW / 2 h base case
// ---------------------------------------------------------------------------

impl Default for TechnicalAssumptions {
    fn default() -> Self {
        Self {
            capacity_mw: dec!(360),
            duration_hours: dec!(2),
            roundtrip_efficiency_pct: dec!(85),
            degradation_rate_pct: dec!(2.0),
            availability_pct: dec!(95),
            cycles_per_day: dec!(1.5),
            augmentation_year: Some(20),
            augmentation_cost_pct_of_battery: dec!(40),
        }
    }
}

impl Default for CommercialAssumptions {
    fn default() -> Self {
        Self {
            energy_trading_k: dec!(35),
            frequency_response_k: dec!(25),
            capacity_market_k: dec!(45),
            ancillary_services_k: dec!(25),
            floor_revenue_k: Decimal::ZERO,
            contract_length_years: 12,
            revenue_escalation_pct: dec!(2.0),
        }
    }
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            epc_k: dec!(201),
            battery_supply_k: dec!(196),
            balance_of_plant_k: dec!(50),
            grid_contestable_k: dec!(85),
            grid_non_contestable_k: dec!(45),
            development_k: dec!(14),
            contingency_pct: dec!(10),
            fixed_om_k: dec!(15),
            variable_om_per_mwh: dec!(0.5),
            ltsa_k: dec!(7),
            ltsa_start_year: 1,
            grid_om_k: dec!(1.6),
            insurance_pct_capex: dec!(0.5),
            business_rates_pct_capex: dec!(0.8),
            asset_management_pct_capex: dec!(0.8),
            land_lease_k: dec!(2.0),
        }
    }
}

impl Default for FinancingAssumptions {
    fn default() -> Self {
        Self {
            debt_pct: dec!(65),
            base_rate_pct: dec!(4.5),
            margin_pct: dec!(5.5),
            debt_tenor_years: 15,
            refinancing: Some(RefinancingTerms {
                after_cod_years: 1,
                rate_pct: dec!(2.25),
            }),
            corporate_tax_pct: dec!(25),
            discount_rate_pct: dec!(8),
            project_life_years: 40,
            cod_date: NaiveDate::from_ymd_opt(2027, 8, 1).unwrap_or_default(),
        }
    }
}

impl Default for TargetAssumptions {
    fn default() -> Self {
        Self {
            dscr_covenant: dec!(1.40),
            min_dscr: dec!(1.15),
            max_gearing_pct: dec!(85),
            target_equity_irr_pct: dec!(12),
        }
    }
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            project_name: "Staythorpe".into(),
            technical: TechnicalAssumptions::default(),
            commercial: CommercialAssumptions::default(),
            costs: CostAssumptions::default(),
            financing: FinancingAssumptions::default(),
            targets: TargetAssumptions::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived quantities and perturbation helpers
// ---------------------------------------------------------------------------

impl CommercialAssumptions {
    /// Year-1 revenue per MW (£k) before escalation or floor.
    pub fn year_one_revenue_k(&self) -> Money {
        self.energy_trading_k
            + self.frequency_response_k
            + self.capacity_market_k
            + self.ancillary_services_k
    }

    /// Scale every revenue stream, including the contract floor.
    pub fn scale(&mut self, factor: Decimal) {
        self.energy_trading_k *= factor;
        self.frequency_response_k *= factor;
        self.capacity_market_k *= factor;
        self.ancillary_services_k *= factor;
        self.floor_revenue_k *= factor;
    }
}

impl CostAssumptions {
    /// Sum of the per-MW capex components (£k/MW), before contingency.
    pub fn capex_per_mw_k(&self) -> Money {
        self.epc_k
            + self.battery_supply_k
            + self.balance_of_plant_k
            + self.grid_contestable_k
            + self.grid_non_contestable_k
            + self.development_k
    }

    /// Scale every capex component. Contingency stays a percentage.
    pub fn scale_capex(&mut self, factor: Decimal) {
        self.epc_k *= factor;
        self.battery_supply_k *= factor;
        self.balance_of_plant_k *= factor;
        self.grid_contestable_k *= factor;
        self.grid_non_contestable_k *= factor;
        self.development_k *= factor;
    }

    /// Scale every operating cost line, including the percent-of-capex ones.
    pub fn scale_opex(&mut self, factor: Decimal) {
        self.fixed_om_k *= factor;
        self.variable_om_per_mwh *= factor;
        self.ltsa_k *= factor;
        self.grid_om_k *= factor;
        self.insurance_pct_capex *= factor;
        self.business_rates_pct_capex *= factor;
        self.asset_management_pct_capex *= factor;
        self.land_lease_k *= factor;
    }
}

impl FinancingAssumptions {
    /// All-in initial interest rate (%)
    pub fn all_in_rate_pct(&self) -> Percent {
        self.base_rate_pct + self.margin_pct
    }

    /// Calendar year label for operating year `year_index` (1-based).
    pub fn year_label(&self, year_index: u32) -> i32 {
        self.cod_date.year() + year_index as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_overlays_defaults() {
        let json = r#"{
            "project_name": "Test Site",
            "technical": { "capacity_mw": 100 },
            "financing": { "debt_tenor_years": 12, "cod_date": "2030-01-01" }
        }"#;
        let set: AssumptionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.project_name, "Test Site");
        assert_eq!(set.technical.capacity_mw, dec!(100));
        assert_eq!(set.technical.duration_hours, dec!(2));
        assert_eq!(set.financing.debt_tenor_years, 12);
        assert_eq!(set.financing.project_life_years, 40);
        assert_eq!(set.financing.year_label(1), 2031);
    }

    #[test]
    fn test_refinancing_can_be_switched_off() {
        let json = r#"{ "financing": { "refinancing": null } }"#;
        let set: AssumptionSet = serde_json::from_str(json).unwrap();
        assert!(set.financing.refinancing.is_none());
    }

    #[test]
    fn test_switched_off_options_survive_json_round_trip() {
        let mut set = AssumptionSet::default();
        set.technical.augmentation_year = None;
        set.financing.refinancing = None;

        let json = serde_json::to_string(&set).unwrap();
        let back: AssumptionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.technical.augmentation_year, None);
        assert_eq!(back.financing.refinancing, None);
        assert_eq!(back, set);
    }

    #[test]
    fn test_year_one_revenue_and_capex_sums() {
        let set = AssumptionSet::default();
        assert_eq!(set.commercial.year_one_revenue_k(), dec!(130));
        assert_eq!(set.costs.capex_per_mw_k(), dec!(591));
        assert_eq!(set.financing.all_in_rate_pct(), dec!(10.0));
    }

    #[test]
    fn test_scale_opex_leaves_capex_untouched() {
        let mut costs = CostAssumptions::default();
        costs.scale_opex(dec!(1.1));
        assert_eq!(costs.fixed_om_k, dec!(16.5));
        assert_eq!(costs.insurance_pct_capex, dec!(0.55));
        assert_eq!(costs.capex_per_mw_k(), dec!(591));
    }
}
