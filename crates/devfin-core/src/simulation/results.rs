use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use super::engine::{LedgerRow, SimulationEngine};
use crate::scenario::config::{validate_config, ScenarioConfig};
use crate::types::{with_metadata, ClassAmounts, ComputationOutput, Money, Month, Rate};
use crate::DevFinResult;

/// Ledger plus headline KPIs for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub ledger: Vec<LedgerRow>,
    pub horizon: Month,
    /// Month of forced closure, if the sale plan has one
    pub closing_month: Option<Month>,
    /// Interest accrued over the horizon, all classes
    pub financing_cost: Money,
    pub financing_breakdown: ClassAmounts,
    /// Interest paid before month 0, from the configuration
    pub historical_interest: Money,
    /// `financing_cost + historical_interest`
    pub lifetime_financing_cost: Money,
    pub total_operating_costs: Money,
    pub total_equity: Money,
    pub total_project_cost: Money,
    pub profit: Money,
    /// Profit over total project cost, as a fraction
    pub roi: Rate,
    pub peak_debt: Money,
    /// First month whose cumulative net flow is non-negative
    pub break_even_month: Option<Month>,
}

/// Run one scenario end to end: validate, simulate, aggregate.
pub fn simulate_project(
    config: &ScenarioConfig,
) -> DevFinResult<ComputationOutput<SimulationResult>> {
    let start = Instant::now();
    let warnings = validate_config(config)?;

    let engine = SimulationEngine::new(config)?;
    let ledger = engine.run()?;
    let result = aggregate(config, ledger, engine.horizon(), engine.closing_month());

    info!(
        scenario = %config.name,
        horizon = result.horizon,
        financing_cost = %result.financing_cost,
        profit = %result.profit,
        roi = %result.roi,
        break_even = ?result.break_even_month,
        "simulation complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly debt accrual and cash waterfall with forced closure at final sale",
        config,
        warnings,
        elapsed,
        result,
    ))
}

/// Reduce a finished ledger into the summary record.
pub fn aggregate(
    config: &ScenarioConfig,
    ledger: Vec<LedgerRow>,
    horizon: Month,
    closing_month: Option<Month>,
) -> SimulationResult {
    let mut financing_breakdown = ClassAmounts::default();
    let mut total_operating_costs = Decimal::ZERO;
    let mut total_equity = Decimal::ZERO;
    let mut peak_debt = Decimal::ZERO;
    for row in &ledger {
        financing_breakdown += row.interest_accrued;
        total_operating_costs += row.operating_costs;
        total_equity += row.equity_injection;
        peak_debt = peak_debt.max(row.total_debt);
    }

    let financing_cost = financing_breakdown.total();
    let total_project_cost = config.land_value
        + config.contract_value
        + config.initial_other_costs
        + total_operating_costs
        + financing_cost;
    let profit = config.total_sale_value - total_project_cost;
    let roi = if total_project_cost > Decimal::ZERO {
        profit / total_project_cost
    } else {
        Decimal::ZERO
    };

    SimulationResult {
        break_even_month: break_even_month(&ledger),
        ledger,
        horizon,
        closing_month,
        financing_cost,
        financing_breakdown,
        historical_interest: config.historical_interest,
        lifetime_financing_cost: financing_cost + config.historical_interest,
        total_operating_costs,
        total_equity,
        total_project_cost,
        profit,
        roi,
        peak_debt,
    }
}

/// First month, month 0 included, whose cumulative net flow is `>= 0`.
pub fn break_even_month(ledger: &[LedgerRow]) -> Option<Month> {
    ledger
        .iter()
        .find(|row| row.cumulative_cash_flow >= Decimal::ZERO)
        .map(|row| row.month)
}
