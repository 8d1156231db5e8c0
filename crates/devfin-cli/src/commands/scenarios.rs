use clap::{Args, ValueEnum};
use serde_json::Value;

use devfin_core::scenario::set::{compare_scenarios, ScenarioSet};
use devfin_core::scenario::ScenarioPreset;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetName {
    Real,
    Optimistic,
    Pessimistic,
}

impl From<PresetName> for ScenarioPreset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::Real => ScenarioPreset::Real,
            PresetName::Optimistic => ScenarioPreset::Optimistic,
            PresetName::Pessimistic => ScenarioPreset::Pessimistic,
        }
    }
}

/// Arguments for scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// JSON or YAML map of scenario name to configuration
    /// (defaults to the three built-in presets)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for printing a built-in scenario
#[derive(Args)]
pub struct PresetArgs {
    /// Which preset to print
    #[arg(value_enum)]
    pub name: PresetName,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let set: ScenarioSet = if let Some(ref path) = args.input {
        input::file::read_config(path)?
    } else if let Some(set) = input::stdin::read_stdin()? {
        set
    } else {
        ScenarioSet::presets()
    };

    let output = compare_scenarios(&set)?;
    Ok(serde_json::to_value(output)?)
}

pub fn run_preset(args: PresetArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = ScenarioPreset::from(args.name).config();
    Ok(serde_json::to_value(config)?)
}
