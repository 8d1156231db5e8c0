use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use devfin_core::scenario::{ScenarioConfig, ScenarioPreset};
use devfin_core::simulation::{milestone_report, simulate_project};

use super::scenarios::PresetName;
use crate::input;

/// Where the scenario comes from, plus command-line overrides.
#[derive(Args)]
pub struct ScenarioSource {
    /// Path to a JSON or YAML scenario file
    #[arg(long)]
    pub input: Option<String>,

    /// Start from a built-in scenario instead of a file
    #[arg(long, conflicts_with = "input")]
    pub preset: Option<PresetName>,

    /// Override the total sale value
    #[arg(long)]
    pub total_sale_value: Option<Decimal>,

    /// Override annual inflation (e.g. 0.04 for 4%)
    #[arg(long, allow_hyphen_values = true)]
    pub annual_inflation: Option<Decimal>,
}

/// Arguments for a full simulation
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub source: ScenarioSource,

    /// Keep the monthly ledger in the output
    #[arg(long)]
    pub include_ledger: bool,
}

/// Arguments for printing the monthly ledger
#[derive(Args)]
pub struct LedgerArgs {
    #[command(flatten)]
    pub source: ScenarioSource,
}

/// Arguments for the milestone interest report
#[derive(Args)]
pub struct MilestonesArgs {
    #[command(flatten)]
    pub source: ScenarioSource,
}

pub(crate) fn load_scenario(
    source: &ScenarioSource,
) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
    let mut config: ScenarioConfig = if let Some(ref path) = source.input {
        input::file::read_config(path)?
    } else if let Some(preset) = source.preset {
        ScenarioPreset::from(preset).config()
    } else if let Some(config) = input::stdin::read_stdin()? {
        config
    } else {
        return Err("Provide a scenario with --input, --preset, or on stdin".into());
    };

    if let Some(value) = source.total_sale_value {
        config.total_sale_value = value;
    }
    if let Some(value) = source.annual_inflation {
        config.annual_inflation = value;
    }
    Ok(config)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_scenario(&args.source)?;
    let output = simulate_project(&config)?;
    let mut value = serde_json::to_value(output)?;

    if !args.include_ledger {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.remove("ledger");
        }
    }
    Ok(value)
}

pub fn run_ledger(args: LedgerArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_scenario(&args.source)?;
    let output = simulate_project(&config)?;
    let mut value = serde_json::to_value(output)?;

    // The ledger itself becomes the result so tables and CSV get one row per month.
    if let Some(envelope) = value.as_object_mut() {
        let ledger = envelope
            .get_mut("result")
            .and_then(|r| r.get_mut("ledger"))
            .map(Value::take)
            .unwrap_or(Value::Array(Vec::new()));
        envelope.insert("result".into(), ledger);
    }
    Ok(value)
}

pub fn run_milestones(args: MilestonesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_scenario(&args.source)?;
    let output = milestone_report(&config)?;
    Ok(serde_json::to_value(output)?)
}
