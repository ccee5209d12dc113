pub mod file;
pub mod stdin;

use clap::Args;
use serde::de::DeserializeOwned;

use bess_finance_core::scenarios::ScenarioPreset;
use bess_finance_core::AssumptionSet;

/// Where the assumption set comes from, shared by every model command.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to a JSON or YAML assumption file (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Overlay a scenario preset: conservative, base or optimistic
    #[arg(long)]
    pub preset: Option<ScenarioPreset>,

    /// Start from the built-in base case when no input is given
    #[arg(long)]
    pub defaults: bool,
}

/// Read a document from `--input`, falling back to piped stdin.
pub fn read_document<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_document(path)?));
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(Some(
            serde_json::from_value(value).map_err(|e| format!("Invalid {what} on stdin: {e}"))?,
        )),
        None => Ok(None),
    }
}

/// Resolve the assumption set for a command and apply any preset.
pub fn load_assumptions(args: &SourceArgs) -> Result<AssumptionSet, Box<dyn std::error::Error>> {
    let loaded: Option<AssumptionSet> = read_document(args.input.as_deref(), "assumption set")?;
    let base = match loaded {
        Some(set) => set,
        None if args.defaults || args.preset.is_some() => AssumptionSet::default(),
        None => {
            return Err(
                "--input <file.json|file.yaml>, stdin, --defaults or --preset required".into(),
            )
        }
    };

    Ok(match args.preset {
        Some(preset) => {
            tracing::debug!(%preset, "applying scenario preset");
            preset.apply(&base)
        }
        None => base,
    })
}
