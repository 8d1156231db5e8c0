use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;

use devfin_core::scenario::set::{self, ScenarioSet};
use devfin_core::scenario::{ScenarioConfig, ScenarioPreset};
use devfin_core::simulation;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

fn parse_scenario(input_json: &str) -> NapiResult<ScenarioConfig> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_project(input_json: String) -> NapiResult<String> {
    let config = parse_scenario(&input_json)?;
    let output = simulation::simulate_project(&config).map_err(to_napi_error)?;
    to_json(&output)
}

/// Same envelope as `simulate_project`, with the monthly ledger as the result.
#[napi]
pub fn project_ledger(input_json: String) -> NapiResult<String> {
    let config = parse_scenario(&input_json)?;
    let output = simulation::simulate_project(&config).map_err(to_napi_error)?;
    let mut value = serde_json::to_value(output).map_err(to_napi_error)?;
    if let Some(envelope) = value.as_object_mut() {
        let ledger = envelope
            .get_mut("result")
            .and_then(|r| r.get_mut("ledger"))
            .map(serde_json::Value::take)
            .unwrap_or_default();
        envelope.insert("result".into(), ledger);
    }
    to_json(&value)
}

#[napi]
pub fn milestone_report(input_json: String) -> NapiResult<String> {
    let config = parse_scenario(&input_json)?;
    let output = simulation::milestone_report(&config).map_err(to_napi_error)?;
    to_json(&output)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Takes a JSON map of scenario name to configuration.
#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let scenarios: ScenarioSet = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = set::compare_scenarios(&scenarios).map_err(to_napi_error)?;
    to_json(&output)
}

#[napi]
pub fn scenario_preset(name: String) -> NapiResult<String> {
    let preset = ScenarioPreset::from_name(&name)
        .ok_or_else(|| to_napi_error(format!("Unknown preset '{name}'")))?;
    to_json(&preset.config())
}
