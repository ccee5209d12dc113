use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bess_finance_core::scenarios::optimizer::{optimize_debt_fraction, DebtSweep};

use crate::input::{self, SourceArgs};

/// Arguments for the debt-fraction sweep
#[derive(Args)]
pub struct OptimizeDebtArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Lowest gearing to try (%)
    #[arg(long)]
    pub min_pct: Option<Decimal>,

    /// Highest gearing to try (%), further capped at the maximum gearing target
    #[arg(long)]
    pub max_pct: Option<Decimal>,

    /// Gearing increment (%)
    #[arg(long)]
    pub step_pct: Option<Decimal>,

    /// Minimum DSCR each candidate must hold (defaults to targets.min_dscr)
    #[arg(long)]
    pub min_dscr: Option<Decimal>,
}

pub fn run_optimize_debt(args: OptimizeDebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = input::load_assumptions(&args.source)?;
    let defaults = DebtSweep::default();
    let sweep = DebtSweep {
        min_pct: args.min_pct.unwrap_or(defaults.min_pct),
        max_pct: args.max_pct.unwrap_or(defaults.max_pct),
        step_pct: args.step_pct.unwrap_or(defaults.step_pct),
        min_dscr: args.min_dscr,
    };
    let result = optimize_debt_fraction(&assumptions, &sweep)?;
    Ok(serde_json::to_value(result)?)
}
