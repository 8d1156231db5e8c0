use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::ScenarioConfig;
use super::presets::ScenarioPreset;
use crate::error::DevFinError;
use crate::simulation::results::simulate_project;
use crate::types::{with_metadata, ClassAmounts, ComputationOutput, Money, Month, Rate};
use crate::DevFinResult;

/// Caller-owned collection of named scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    pub scenarios: BTreeMap<String, ScenarioConfig>,
}

impl ScenarioSet {
    /// The Real, Optimistic and Pessimistic defaults.
    pub fn presets() -> Self {
        let mut set = Self::default();
        for preset in ScenarioPreset::ALL {
            set.insert(preset.config());
        }
        set
    }

    /// Insert `config` under its own name, replacing any previous entry.
    pub fn insert(&mut self, config: ScenarioConfig) -> Option<ScenarioConfig> {
        self.scenarios.insert(config.name.clone(), config)
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioConfig> {
        self.scenarios.get(name)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Headline figures of one scenario, for side-by-side comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub scenario: String,
    pub interest_accrued: ClassAmounts,
    pub financing_cost: Money,
    pub profit: Money,
    pub roi: Rate,
    pub peak_debt: Money,
    pub break_even_month: Option<Month>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub rows: Vec<ComparisonRow>,
}

/// Simulate every scenario of `set` independently and tabulate the KPIs.
///
/// Rows come back in scenario-name order. Any invalid scenario fails the
/// whole comparison.
pub fn compare_scenarios(
    set: &ScenarioSet,
) -> DevFinResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    if set.is_empty() {
        return Err(DevFinError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }

    let entries: Vec<(&String, &ScenarioConfig)> = set.scenarios.iter().collect();

    #[cfg(feature = "parallel")]
    let iter = entries.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = entries.iter();

    let outcomes: Vec<DevFinResult<(ComparisonRow, Vec<String>)>> = iter
        .map(|(name, config)| -> DevFinResult<(ComparisonRow, Vec<String>)> {
            let output = simulate_project(config)?;
            let r = output.result;
            let warnings = output
                .warnings
                .into_iter()
                .map(|w| format!("{name}: {w}"))
                .collect();
            Ok((
                ComparisonRow {
                    scenario: (*name).clone(),
                    interest_accrued: r.financing_breakdown,
                    financing_cost: r.financing_cost,
                    profit: r.profit,
                    roi: r.roi,
                    peak_debt: r.peak_debt,
                    break_even_month: r.break_even_month,
                },
                warnings,
            ))
        })
        .collect();

    let mut rows = Vec::with_capacity(outcomes.len());
    let mut warnings: Vec<String> = Vec::new();
    for outcome in outcomes {
        let (row, w) = outcome?;
        rows.push(row);
        warnings.extend(w);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Independent simulation of each named scenario",
        set,
        warnings,
        elapsed,
        ScenarioComparison { rows },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_presets_keyed_by_name() {
        let set = ScenarioSet::presets();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("Optimistic").unwrap().total_sale_value, dec!(155000));
        assert!(set.get("Base").is_none());
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut set = ScenarioSet::presets();
        let mut cfg = ScenarioPreset::Real.config();
        cfg.total_sale_value = dec!(150000);
        assert!(set.insert(cfg).is_some());
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("Real").unwrap().total_sale_value, dec!(150000));
    }

    #[test]
    fn test_comparison_rows_sorted_by_name() {
        let output = compare_scenarios(&ScenarioSet::presets()).unwrap();
        let names: Vec<&str> = output.result.rows.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["Optimistic", "Pessimistic", "Real"]);
        // one term warning per preset
        assert_eq!(output.warnings.len(), 3);
        assert!(output.warnings[0].starts_with("Optimistic: "));
    }

    #[test]
    fn test_optimistic_beats_pessimistic() {
        let rows = compare_scenarios(&ScenarioSet::presets()).unwrap().result.rows;
        let optimistic = &rows[0];
        let pessimistic = &rows[1];
        assert!(optimistic.profit > pessimistic.profit);
        assert!(optimistic.financing_cost < pessimistic.financing_cost);
    }

    #[test]
    fn test_matches_single_run() {
        let set = ScenarioSet::presets();
        let rows = compare_scenarios(&set).unwrap().result.rows;
        let real = simulate_project(set.get("Real").unwrap()).unwrap().result;
        assert_eq!(rows[2].profit, real.profit);
        assert_eq!(rows[2].interest_accrued, real.financing_breakdown);
    }

    #[test]
    fn test_invalid_member_fails_comparison() {
        let mut set = ScenarioSet::presets();
        let mut cfg = ScenarioPreset::Real.config();
        cfg.name = "Broken".into();
        cfg.land_financing = dec!(2);
        set.insert(cfg);
        assert!(compare_scenarios(&set).is_err());
    }

    #[test]
    fn test_empty_set_rejected() {
        let err = compare_scenarios(&ScenarioSet::default()).unwrap_err();
        assert!(matches!(err, DevFinError::InsufficientData(_)));
    }
}
