use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use bess_finance_core::scenarios::sensitivity::{self, percent_band, SensitivityDriver, SensitivityMetric};

use crate::input::{self, SourceArgs};

/// Arguments for the one-at-a-time tornado
#[derive(Args)]
pub struct TornadoArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Percentage changes to apply, comma separated (default -20,-10,10,20)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub changes: Vec<Decimal>,
}

/// Arguments for a two-way grid
#[derive(Args)]
pub struct GridArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Driver varied down the rows
    #[arg(long, default_value = "capex")]
    pub rows: SensitivityDriver,

    /// Driver varied across the columns
    #[arg(long, default_value = "revenue")]
    pub cols: SensitivityDriver,

    /// Largest change either side of the base case (%)
    #[arg(long, default_value = "20")]
    pub span: Decimal,

    /// Change between grid points (%)
    #[arg(long, default_value = "10")]
    pub step: Decimal,

    /// Output metric: irr, npv, min_dscr, average_dscr, moic
    #[arg(long, default_value = "irr")]
    pub metric: SensitivityMetric,
}

pub fn run_tornado(args: TornadoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = input::load_assumptions(&args.source)?;
    let result = sensitivity::run_tornado(&assumptions, &args.changes)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_grid(args: GridArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.span < Decimal::ZERO || args.span >= dec!(100) {
        return Err("--span must be between 0 and 100".into());
    }
    let assumptions = input::load_assumptions(&args.source)?;

    let result = if args.rows == SensitivityDriver::Capex && args.cols == SensitivityDriver::Revenue {
        sensitivity::run_revenue_capex_grid(&assumptions, args.span, args.step, args.metric)?
    } else {
        let rows = percent_band(&format!("{} change (%)", args.rows), args.span, args.step);
        let cols = percent_band(&format!("{} change (%)", args.cols), args.span, args.step);
        sensitivity::run_driver_grid(&assumptions, (args.rows, &rows), (args.cols, &cols), args.metric)?
    };
    Ok(serde_json::to_value(result)?)
}
