mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::scenarios::{CompareArgs, PresetArgs};
use commands::simulation::{LedgerArgs, MilestonesArgs, SimulateArgs};

/// Month-by-month debt and cash-flow simulation for real-estate projects
#[derive(Parser)]
#[command(
    name = "devfin",
    version,
    about = "Debt and cash-flow simulation for real-estate development projects",
    long_about = "Simulates bank (indexed and nominal), investor and private-lender debt \
                  month by month against construction costs and sale receipts, resolving \
                  each month's cash through a priority waterfall with forced closure at \
                  the final sale. Reports the ledger, financing cost, profit, ROI, peak \
                  debt and break-even month."
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
    /// Simulate a scenario and report the headline KPIs
    Simulate(SimulateArgs),
    /// Simulate a scenario and print the monthly ledger
    Ledger(LedgerArgs),
    /// Cumulative accrued interest at construction end, reception and last sale
    Milestones(MilestonesArgs),
    /// Simulate several named scenarios side by side
    Compare(CompareArgs),
    /// Print one of the built-in scenario configurations
    Preset(PresetArgs),
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

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("DEVFIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::Ledger(args) => commands::simulation::run_ledger(args),
        Commands::Milestones(args) => commands::simulation::run_milestones(args),
        Commands::Compare(args) => commands::scenarios::run_compare(args),
        Commands::Preset(args) => commands::scenarios::run_preset(args),
        Commands::Version => {
            println!("devfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
