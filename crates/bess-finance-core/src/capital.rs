use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::AssumptionSet;
use crate::types::{pct_to_rate, Money, THOUSAND};

/// Capex build-up and the debt/equity split, in absolute £.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    /// Sum of per-MW capex components (£k/MW)
    pub capex_per_mw_k: Money,
    /// Capex before contingency
    pub base_capex: Money,
    /// Contingency allowance on top of the base capex
    pub contingency: Money,
    /// Base capex plus contingency
    pub total_capex: Money,
    /// Initial battery supply cost; the base for augmentation spend
    pub battery_capex: Money,
    pub debt_amount: Money,
    pub equity_amount: Money,
}

/// Derive total capex and split it into debt and equity.
///
/// Never rejects inputs: zero or negative capacity simply flows through as a
/// zero or negative capex, and is flagged by advisory validation instead.
pub fn size_capital_structure(assumptions: &AssumptionSet) -> CapitalStructure {
    let mw = assumptions.technical.capacity_mw;
    let costs = &assumptions.costs;

    let capex_per_mw_k = costs.capex_per_mw_k();
    let base_capex = capex_per_mw_k * THOUSAND * mw;
    let total_capex = base_capex * (Decimal::ONE + pct_to_rate(costs.contingency_pct));
    let debt_amount = total_capex * pct_to_rate(assumptions.financing.debt_pct);

    CapitalStructure {
        capex_per_mw_k,
        base_capex,
        contingency: total_capex - base_capex,
        total_capex,
        battery_capex: costs.battery_supply_k * THOUSAND * mw,
        debt_amount,
        equity_amount: total_capex - debt_amount,
    }
}
