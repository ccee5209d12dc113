use bess_finance_core::assumptions::AssumptionSet;
use bess_finance_core::model::{compute_financials, compute_financials_with, model_bess_project, EngineOptions, IrrStrategy};
use bess_finance_core::validation::validate_assumptions;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 100 MW / 2 h, £300k/MW capex, 60% debt at 9%, revenue £100k/MW, no opex.
fn hundred_mw_scenario() -> AssumptionSet {
    let mut set = AssumptionSet::default();
    set.project_name = "Hundred".into();

    let t = &mut set.technical;
    t.capacity_mw = dec!(100);
    t.duration_hours = dec!(2);
    t.augmentation_year = None;

    let c = &mut set.commercial;
    c.energy_trading_k = dec!(100);
    c.frequency_response_k = Decimal::ZERO;
    c.capacity_market_k = Decimal::ZERO;
    c.ancillary_services_k = Decimal::ZERO;
    c.floor_revenue_k = Decimal::ZERO;
    c.contract_length_years = 10;
    c.revenue_escalation_pct = dec!(2);

    let k = &mut set.costs;
    k.epc_k = dec!(100);
    k.battery_supply_k = dec!(150);
    k.balance_of_plant_k = dec!(20);
    k.grid_contestable_k = dec!(15);
    k.grid_non_contestable_k = dec!(10);
    k.development_k = dec!(5);
    k.contingency_pct = dec!(10);
    k.scale_opex(Decimal::ZERO);

    let f = &mut set.financing;
    f.debt_pct = dec!(60);
    f.base_rate_pct = dec!(4);
    f.margin_pct = dec!(5);
    f.debt_tenor_years = 15;
    f.refinancing = None;
    f.corporate_tax_pct = dec!(25);
    f.discount_rate_pct = dec!(8);
    f.project_life_years = 20;
    set
}

// ===========================================================================
// Concrete scenario
// ===========================================================================

#[test]
fn test_hundred_mw_capital_structure() {
    let r = compute_financials(&hundred_mw_scenario()).unwrap();
    assert_eq!(r.total_capex, dec!(33));
    assert_eq!(r.debt_amount, dec!(19.8));
    assert_eq!(r.equity_amount, dec!(13.2));
}

#[test]
fn test_hundred_mw_first_year() {
    let r = compute_financials(&hundred_mw_scenario()).unwrap();
    let y1 = &r.years[0];
    assert_eq!(y1.revenue, dec!(10));
    assert_eq!(y1.opex, Decimal::ZERO);
    assert_eq!(y1.ebitda, dec!(10));
    assert!(
        (r.annual_debt_service - dec!(2.456366)).abs() < dec!(0.000001),
        "annuity {}",
        r.annual_debt_service
    );
    // 19.8m at 9%
    assert_eq!(y1.interest, dec!(1.782));

    let dscr = y1.dscr.expect("year 1 carries debt service");
    assert!(dscr > Decimal::ONE, "DSCR {dscr}");
    assert!((dscr - dec!(4.071)).abs() < dec!(0.001), "DSCR {dscr}");
}

#[test]
fn test_hundred_mw_metrics() {
    let r = compute_financials(&hundred_mw_scenario()).unwrap();
    assert!((r.npv - dec!(73.677)).abs() < dec!(0.01), "NPV {}", r.npv);
    assert!(
        (r.total_cash_flows - dec!(189.246)).abs() < dec!(0.01),
        "total {}",
        r.total_cash_flows
    );
    assert_eq!(r.simple_payback_year, 2);
    let moic = r.moic.unwrap();
    assert!((moic - r.total_cash_flows / dec!(13.2)).abs() < dec!(0.0000001));
    assert!(r.min_dscr.unwrap() > Decimal::ONE);
}

#[test]
fn test_ev_per_mw_is_total_capex_per_mw() {
    let r = compute_financials(&hundred_mw_scenario()).unwrap();
    // 33m over 100 MW
    assert_eq!(r.ev_per_mw, Some(dec!(0.33)));
    assert_eq!(r.ev_per_mw, Some(r.total_capex / dec!(100)));

    let mut idle = hundred_mw_scenario();
    idle.technical.capacity_mw = Decimal::ZERO;
    assert_eq!(compute_financials(&idle).unwrap().ev_per_mw, None);
}

#[test]
fn test_hundred_mw_irr_beyond_scan_ceiling_is_reported_as_zero() {
    let out = model_bess_project(&hundred_mw_scenario()).unwrap();
    assert_eq!(out.result.irr_pct, Decimal::ZERO);
    assert!(
        out.warnings.iter().any(|w| w.contains("scan ceiling")),
        "warnings: {:?}",
        out.warnings
    );

    // The root-finding strategy is not bounded by the scan
    let newton = compute_financials_with(
        &hundred_mw_scenario(),
        &EngineOptions {
            irr_strategy: IrrStrategy::NewtonRaphson,
        },
    )
    .unwrap();
    assert!(newton.irr_pct > dec!(50), "newton IRR {}", newton.irr_pct);
}

// ===========================================================================
// Structural properties
// ===========================================================================

#[test]
fn test_one_record_per_year_in_order() {
    let set = AssumptionSet::default();
    let r = compute_financials(&set).unwrap();
    assert_eq!(r.years.len(), set.financing.project_life_years as usize);
    for pair in r.years.windows(2) {
        assert!(pair[1].year > pair[0].year);
        assert_eq!(pair[1].year_index, pair[0].year_index + 1);
    }
}

#[test]
fn test_outstanding_balance_profile() {
    let set = AssumptionSet::default();
    let tenor = set.financing.debt_tenor_years as usize;
    let r = compute_financials(&set).unwrap();

    let mut previous = r.debt_amount;
    for (i, y) in r.years.iter().enumerate() {
        assert!(y.outstanding_debt >= Decimal::ZERO);
        if i < tenor {
            assert!(y.outstanding_debt <= previous, "balance rose in year {}", y.year_index);
        } else {
            assert_eq!(y.outstanding_debt, Decimal::ZERO);
            assert_eq!(y.debt_service, Decimal::ZERO);
        }
        previous = y.outstanding_debt;
    }
}

#[test]
fn test_zero_debt_means_unbounded_cover() {
    let mut set = hundred_mw_scenario();
    set.financing.debt_pct = Decimal::ZERO;
    let r = compute_financials(&set).unwrap();

    assert_eq!(r.annual_debt_service, Decimal::ZERO);
    for y in &r.years {
        assert_eq!(y.interest, Decimal::ZERO);
        assert_eq!(y.principal, Decimal::ZERO);
        assert_eq!(y.dscr, None);
    }
    assert_eq!(r.min_dscr, None);
    assert_eq!(r.average_dscr, Decimal::ZERO);
}

#[test]
fn test_flat_inputs_give_flat_capacity_and_revenue() {
    let mut set = hundred_mw_scenario();
    set.commercial.revenue_escalation_pct = Decimal::ZERO;
    set.technical.degradation_rate_pct = Decimal::ZERO;
    set.technical.availability_pct = dec!(100);
    let r = compute_financials(&set).unwrap();

    let contract = set.commercial.contract_length_years as usize;
    let first = &r.years[0];
    for y in &r.years[..contract] {
        assert_eq!(y.effective_capacity_mw, first.effective_capacity_mw);
        assert_eq!(y.revenue_per_mw_k, first.revenue_per_mw_k);
    }
    assert_eq!(first.effective_capacity_mw, dec!(100));
}

#[test]
fn test_more_revenue_never_lowers_irr() {
    let base = AssumptionSet::default();
    let mut last = Decimal::ZERO;
    for factor in [dec!(0.4), dec!(0.6), dec!(0.8), dec!(1.0)] {
        let mut set = base.clone();
        set.commercial.scale(factor);
        let irr = compute_financials(&set).unwrap().irr_pct;
        assert!(irr >= last, "IRR fell to {irr} at revenue x{factor}");
        last = irr;
    }
}

#[test]
fn test_runs_are_deterministic() {
    let set = AssumptionSet::default();
    assert_eq!(compute_financials(&set).unwrap(), compute_financials(&set).unwrap());
}

#[test]
fn test_augmentation_beyond_life_never_applies() {
    let mut with_late = hundred_mw_scenario();
    with_late.technical.augmentation_year = Some(25);
    let none = compute_financials(&hundred_mw_scenario()).unwrap();
    let late = compute_financials(&with_late).unwrap();
    assert!(late.years.iter().all(|y| y.augmentation.is_zero()));
    assert_eq!(late.npv, none.npv);
}

#[test]
fn test_ltsa_start_zero_matches_one() {
    let mut zero = AssumptionSet::default();
    zero.costs.ltsa_start_year = 0;
    let mut one = AssumptionSet::default();
    one.costs.ltsa_start_year = 1;
    assert_eq!(compute_financials(&zero).unwrap(), compute_financials(&one).unwrap());
}

#[test]
fn test_hundred_mw_scenario_is_clean_for_validation() {
    assert!(validate_assumptions(&hundred_mw_scenario()).is_empty());
}
