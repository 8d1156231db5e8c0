use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::engine::LedgerRow;
use super::results::simulate_project;
use crate::scenario::config::ScenarioConfig;
use crate::types::{with_metadata, ComputationOutput, Money, Month, Rate};
use crate::DevFinResult;

/// Checkpoints at which cumulative accrued interest is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    ConstructionCompletion,
    Reception,
    LastSale,
}

impl Milestone {
    pub fn label(&self) -> &'static str {
        match self {
            Milestone::ConstructionCompletion => "Construction completion",
            Milestone::Reception => "Reception",
            Milestone::LastSale => "Last sale",
        }
    }
}

/// Interest accrued from month 0 through `month`, by class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneRow {
    pub milestone: Milestone,
    pub month: Month,
    /// Includes interest paid before month 0
    pub bank_accrued: Money,
    pub investor_accrued: Money,
    pub private_lender_accrued: Money,
    pub total_accrued: Money,
    /// `total_accrued / lifetime_financing_cost`, zero when there is no cost
    pub share_of_lifetime_cost: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneReport {
    pub lifetime_financing_cost: Money,
    pub rows: Vec<MilestoneRow>,
}

/// Cumulative accrued interest at construction completion, reception and
/// the last sale month.
pub fn milestone_report(
    config: &ScenarioConfig,
) -> DevFinResult<ComputationOutput<MilestoneReport>> {
    let start = Instant::now();
    let simulated = simulate_project(config)?;
    let result = simulated.result;

    let checkpoints = [
        (Milestone::ConstructionCompletion, config.construction_end_month()),
        (Milestone::Reception, config.reception_month),
        (
            Milestone::LastSale,
            result.closing_month.unwrap_or(config.reception_month),
        ),
    ];

    let lifetime = result.lifetime_financing_cost;
    let rows = checkpoints
        .into_iter()
        .map(|(milestone, month)| {
            accrued_through(&result.ledger, milestone, month, config.historical_interest, lifetime)
        })
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cumulative accrued interest at project milestones",
        config,
        simulated.warnings,
        elapsed,
        MilestoneReport {
            lifetime_financing_cost: lifetime,
            rows,
        },
    ))
}

fn accrued_through(
    ledger: &[LedgerRow],
    milestone: Milestone,
    month: Month,
    historical_interest: Money,
    lifetime: Money,
) -> MilestoneRow {
    let mut bank = historical_interest;
    let mut investor = Decimal::ZERO;
    let mut private_lender = Decimal::ZERO;
    for row in ledger.iter().take_while(|r| r.month <= month) {
        bank += row.interest_accrued.bank;
        investor += row.interest_accrued.investor;
        private_lender += row.interest_accrued.private_lender;
    }

    let total = bank + investor + private_lender;
    MilestoneRow {
        milestone,
        month,
        bank_accrued: bank,
        investor_accrued: investor,
        private_lender_accrued: private_lender,
        total_accrued: total,
        share_of_lifetime_cost: if lifetime > Decimal::ZERO {
            total / lifetime
        } else {
            Decimal::ZERO
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::presets::ScenarioPreset;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checkpoint_months() {
        let cfg = ScenarioPreset::Real.config();
        let report = milestone_report(&cfg).unwrap().result;
        let months: Vec<Month> = report.rows.iter().map(|r| r.month).collect();
        assert_eq!(months, vec![18, 22, 32]);
        assert_eq!(report.rows[2].milestone, Milestone::LastSale);
    }

    #[test]
    fn test_accrual_is_cumulative() {
        let cfg = ScenarioPreset::Real.config();
        let report = milestone_report(&cfg).unwrap().result;
        for pair in report.rows.windows(2) {
            assert!(pair[0].total_accrued <= pair[1].total_accrued);
        }
        assert!(report.rows[2].share_of_lifetime_cost <= Decimal::ONE);
    }

    #[test]
    fn test_historical_interest_counted_in_bank() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.historical_interest = dec!(500);
        let with_history = milestone_report(&cfg).unwrap().result;
        cfg.historical_interest = Decimal::ZERO;
        let base = milestone_report(&cfg).unwrap().result;

        assert_eq!(
            with_history.rows[0].bank_accrued,
            base.rows[0].bank_accrued + dec!(500)
        );
        assert_eq!(
            with_history.lifetime_financing_cost,
            base.lifetime_financing_cost + dec!(500)
        );
    }

    #[test]
    fn test_no_sale_falls_back_to_reception() {
        let mut cfg = ScenarioPreset::Real.config();
        for sale in &mut cfg.sale_plan {
            sale.fraction = Decimal::ZERO;
        }
        let report = milestone_report(&cfg).unwrap().result;
        assert_eq!(report.rows[2].month, cfg.reception_month);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Milestone::Reception.label(), "Reception");
    }
}
