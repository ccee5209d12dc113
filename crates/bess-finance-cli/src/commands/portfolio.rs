use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use bess_finance_core::scenarios::portfolio::{rank_portfolio, PortfolioEntry};
use bess_finance_core::scenarios::ScenarioPreset;

use crate::input;

/// Arguments for portfolio ranking
#[derive(Args)]
pub struct PortfolioArgs {
    /// JSON or YAML file holding a list of {name, assumptions} projects
    #[arg(long)]
    pub input: Option<String>,

    /// Overlay one preset on every project before ranking
    #[arg(long)]
    pub preset: Option<ScenarioPreset>,
}

/// Either a bare list of projects or `{ "projects": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortfolioDocument {
    List(Vec<PortfolioEntry>),
    Wrapped { projects: Vec<PortfolioEntry> },
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: PortfolioDocument = input::read_document(args.input.as_deref(), "portfolio")?
        .ok_or("--input <file.json|file.yaml> or stdin required for portfolio ranking")?;
    let mut entries = match doc {
        PortfolioDocument::List(list) => list,
        PortfolioDocument::Wrapped { projects } => projects,
    };

    if let Some(preset) = args.preset {
        for entry in &mut entries {
            entry.assumptions = preset.apply(&entry.assumptions);
        }
    }

    let result = rank_portfolio(&entries)?;
    Ok(serde_json::to_value(result)?)
}
