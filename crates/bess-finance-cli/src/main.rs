mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::model::{ModelArgs, ValidateArgs};
use commands::optimizer::OptimizeDebtArgs;
use commands::portfolio::PortfolioArgs;
use commands::sensitivity::{GridArgs, TornadoArgs};

/// Battery storage project finance from the command line
#[derive(Parser)]
#[command(
    name = "bessfm",
    version,
    about = "Battery energy storage project finance model",
    long_about = "Projects year-by-year cash flows for a grid-scale battery storage \
                  project and reports equity IRR, NPV, DSCR, payback and MOIC with \
                  decimal precision. Also runs tornado and two-way sensitivities, \
                  debt sizing sweeps and portfolio ranking."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cash flow model for one project
    Model(ModelArgs),
    /// Check assumptions against plausibility ranges and lender thresholds
    Validate(ValidateArgs),
    /// One-at-a-time sensitivity of IRR and NPV (tornado)
    Tornado(TornadoArgs),
    /// Two-way sensitivity grid (CAPEX x revenue by default)
    Grid(GridArgs),
    /// Sweep gearing and pick the highest IRR that holds the DSCR floor
    OptimizeDebt(OptimizeDebtArgs),
    /// Evaluate and rank a batch of projects
    Portfolio(PortfolioArgs),
    /// List the scenario presets and the values they apply
    Presets,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Validate(args) => commands::model::run_validate(args),
        Commands::Tornado(args) => commands::sensitivity::run_tornado(args),
        Commands::Grid(args) => commands::sensitivity::run_grid(args),
        Commands::OptimizeDebt(args) => commands::optimizer::run_optimize_debt(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Presets => commands::presets::run_presets(),
        Commands::Version => {
            println!("bessfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
