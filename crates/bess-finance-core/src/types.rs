use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Monetary amounts in pounds sterling. Scale (£, £k, £m) is named per field.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Whole-number percentages as entered on the dashboard (5 = 5%).
pub type Percent = Decimal;

/// Multiples (e.g., 1.35x DSCR, 2.1x MOIC)
pub type Multiple = Decimal;

/// Pounds in one million; results are reported in £m.
pub const MILLION: Decimal = dec!(1_000_000);

/// Pounds in one thousand; per-MW inputs are entered in £k.
pub const THOUSAND: Decimal = dec!(1_000);

/// Convert a whole-number percentage into a decimal rate.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// A swept input: inclusive `min..=max` in `step` increments, expressed in
/// the units of the field it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
    /// Unit of every money field in `result`
    pub money_unit: String,
}

/// Reported money unit.
pub const MONEY_UNIT: &str = "GBP millions";

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
            money_unit: MONEY_UNIT.to_string(),
        },
    }
}
