use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::{AssumptionSet, CommercialAssumptions};
use crate::capital::CapitalStructure;
use crate::debt::DebtSchedule;
use crate::time_value::compound;
use crate::types::{pct_to_rate, Money, Multiple, Percent, MILLION, THOUSAND};
use crate::BessFinanceResult;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// One projected operating year. Money fields are in £m.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    /// Calendar year label (COD year + year_index)
    pub year: i32,
    /// 1-based operating year
    pub year_index: u32,
    /// Nameplate MW after degradation and availability
    pub effective_capacity_mw: Decimal,
    /// Revenue per MW after escalation and contract floor (£k/MW)
    pub revenue_per_mw_k: Money,
    pub revenue: Money,
    pub opex: Money,
    pub ebitda: Money,
    /// Interest rate applied this year (%)
    pub interest_rate_pct: Percent,
    pub interest: Money,
    pub principal: Money,
    /// Scheduled debt payment (interest + principal while inside the tenor)
    pub debt_service: Money,
    /// Senior debt outstanding at year end
    pub outstanding_debt: Money,
    pub augmentation: Money,
    pub ebt: Money,
    pub tax: Money,
    pub net_income: Money,
    /// Free cash flow to equity
    pub free_cash_flow: Money,
    pub cumulative_free_cash_flow: Money,
    /// EBITDA / debt service; `None` when no debt service is due (unbounded cover)
    pub dscr: Option<Multiple>,
}

/// Capacity retained after `year_index` years of compounding degradation.
pub fn degradation_factor(degradation_rate_pct: Percent, year_index: u32) -> BessFinanceResult<Decimal> {
    compound(Decimal::ONE - pct_to_rate(degradation_rate_pct), year_index)
}

/// Revenue per MW (£k) in operating year `year_index`.
///
/// Inside the contract window the escalator is frozen at the contract-end
/// exponent and the floor applies. After the window, revenue escalates from
/// the year-1 base for `year_index - 1` periods, not from the contract-end
/// value, and the floor no longer applies.
pub fn revenue_per_mw_k(commercial: &CommercialAssumptions, year_index: u32) -> BessFinanceResult<Money> {
    let base = commercial.year_one_revenue_k();
    let growth = Decimal::ONE + pct_to_rate(commercial.revenue_escalation_pct);
    let elapsed = year_index.saturating_sub(1);

    if year_index <= commercial.contract_length_years {
        let frozen = elapsed.min(commercial.contract_length_years.saturating_sub(1));
        let escalated = base * compound(growth, frozen)?;
        Ok(escalated.max(commercial.floor_revenue_k))
    } else {
        Ok(base * compound(growth, elapsed)?)
    }
}

/// Run the operating-year fold: one record per year of project life.
///
/// `debt` carries the outstanding balance from year to year and is left
/// fully serviced when this returns.
pub fn build_cash_flows(
    assumptions: &AssumptionSet,
    capital: &CapitalStructure,
    debt: &mut DebtSchedule,
) -> BessFinanceResult<Vec<CashFlowYear>> {
    let tech = &assumptions.technical;
    let costs = &assumptions.costs;
    let financing = &assumptions.financing;
    let mw = tech.capacity_mw;
    let life = financing.project_life_years;

    // Flat annual cost lines (absolute £)
    let fixed_om = costs.fixed_om_k * THOUSAND * mw;
    let grid_om = costs.grid_om_k * THOUSAND * mw;
    let ltsa = costs.ltsa_k * THOUSAND * mw;
    let land_lease = costs.land_lease_k * THOUSAND * mw;
    let insurance = capital.total_capex * pct_to_rate(costs.insurance_pct_capex);
    let rates = capital.total_capex * pct_to_rate(costs.business_rates_pct_capex);
    let asset_management = capital.total_capex * pct_to_rate(costs.asset_management_pct_capex);

    let availability = pct_to_rate(tech.availability_pct);
    let annual_throughput_mwh = mw
        * tech.duration_hours
        * tech.cycles_per_day
        * DAYS_PER_YEAR
        * pct_to_rate(tech.roundtrip_efficiency_pct);
    let augmentation_spend =
        capital.battery_capex * pct_to_rate(tech.augmentation_cost_pct_of_battery);
    let tax_rate = pct_to_rate(financing.corporate_tax_pct);

    let mut years = Vec::with_capacity(life as usize);
    let mut cumulative = Decimal::ZERO;

    for y in 1..=life {
        let degradation = degradation_factor(tech.degradation_rate_pct, y)?;
        let effective_capacity_mw = mw * degradation * availability;

        let rev_per_mw_k = revenue_per_mw_k(&assumptions.commercial, y)?;
        let revenue = rev_per_mw_k * THOUSAND * mw;

        let cycled_mwh = (annual_throughput_mwh * degradation).max(Decimal::ZERO);
        let variable_om = cycled_mwh * costs.variable_om_per_mwh;
        let ltsa_cost = if y >= costs.ltsa_start_year {
            ltsa
        } else {
            Decimal::ZERO
        };
        let opex = fixed_om
            + grid_om
            + ltsa_cost
            + variable_om
            + insurance
            + rates
            + land_lease
            + asset_management;

        let augmentation = if tech.augmentation_year == Some(y) {
            augmentation_spend
        } else {
            Decimal::ZERO
        };

        let ebitda = revenue - opex;
        let service = debt.service_year(y);

        // Augmentation is expensed before tax
        let ebt = ebitda - service.interest - augmentation;
        let tax = (ebt * tax_rate).max(Decimal::ZERO);
        let net_income = ebt - tax;
        // Capex is funded at t = 0, so principal is added back to the equity view
        let free_cash_flow = net_income + service.principal;

        let dscr = if service.payment > Decimal::ZERO {
            Some(ebitda / service.payment)
        } else {
            None
        };

        let fcf_m = free_cash_flow / MILLION;
        cumulative += fcf_m;

        years.push(CashFlowYear {
            year: financing.year_label(y),
            year_index: y,
            effective_capacity_mw,
            revenue_per_mw_k: rev_per_mw_k,
            revenue: revenue / MILLION,
            opex: opex / MILLION,
            ebitda: ebitda / MILLION,
            interest_rate_pct: service.rate * dec!(100),
            interest: service.interest / MILLION,
            principal: service.principal / MILLION,
            debt_service: service.payment / MILLION,
            outstanding_debt: service.closing_balance / MILLION,
            augmentation: augmentation / MILLION,
            ebt: ebt / MILLION,
            tax: tax / MILLION,
            net_income: net_income / MILLION,
            free_cash_flow: fcf_m,
            cumulative_free_cash_flow: cumulative,
            dscr,
        });
    }

    Ok(years)
}
