use clap::Args;
use serde_json::Value;

use bess_finance_core::model::{model_bess_project_with, EngineOptions, IrrStrategy};
use bess_finance_core::validation::validate_assumptions;

use crate::input::{self, SourceArgs};

/// Arguments for a single project run
#[derive(Args)]
pub struct ModelArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Solve IRR by Newton-Raphson instead of the 0.1% linear scan
    #[arg(long)]
    pub newton: bool,

    /// Drop the year-by-year records and keep only the headline metrics
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for advisory validation
#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = input::load_assumptions(&args.source)?;
    let options = EngineOptions {
        irr_strategy: if args.newton {
            IrrStrategy::NewtonRaphson
        } else {
            IrrStrategy::LinearScan
        },
    };

    let result = model_bess_project_with(&assumptions, &options)?;
    let mut value = serde_json::to_value(result)?;
    if args.summary {
        if let Some(Value::Object(res)) = value.get_mut("result") {
            res.remove("years");
        }
    }
    Ok(value)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = input::load_assumptions(&args.source)?;
    let findings = validate_assumptions(&assumptions);
    Ok(serde_json::json!({
        "result": {
            "project_name": assumptions.project_name,
            "valid": findings.is_empty(),
            "warning_count": findings.len(),
            "findings": findings,
        },
        "methodology": "Advisory assumption validation",
    }))
}
