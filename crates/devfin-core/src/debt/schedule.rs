use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scenario::config::{LoanTerms, ScenarioConfig};
use crate::types::{Money, Month};

/// Construction cost incurred in a month and how it is funded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructionDraw {
    pub cost: Money,
    /// Portion drawn on the bank construction tranche
    pub bank_financed: Money,
    /// Portion paid by the developer
    pub equity_funded: Money,
}

/// New principal entering each instrument in one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDraws {
    pub construction: ConstructionDraw,
    /// One entry per investor note, in configuration order
    pub investor: Vec<Money>,
    /// One entry per private-lender loan, in configuration order
    pub private_lender: Vec<Money>,
}

impl MonthlyDraws {
    /// Note cash received this month (bank draws go straight to the contractor).
    pub fn note_total(&self) -> Money {
        self.investor.iter().chain(&self.private_lender).copied().sum()
    }
}

/// Computes the draws of each month from the construction curve and the
/// note start months.
#[derive(Debug, Clone)]
pub struct DisbursementScheduler<'a> {
    config: &'a ScenarioConfig,
}

impl<'a> DisbursementScheduler<'a> {
    pub fn new(config: &'a ScenarioConfig) -> Self {
        Self { config }
    }

    /// Contract value spent in `month`.
    ///
    /// The first construction month takes `initial_draw` of the contract and
    /// the remainder is spread evenly over the other months. A one-month
    /// build spends the whole contract at once.
    pub fn construction_cost(&self, month: Month) -> Money {
        let cfg = self.config;
        let start = cfg.construction_start_month;
        if month < start || month > cfg.construction_end_month() {
            return Decimal::ZERO;
        }

        let duration = cfg.construction_duration_months;
        if month == start {
            return if duration == 1 {
                cfg.contract_value
            } else {
                cfg.contract_value * cfg.initial_draw
            };
        }

        let remaining_months = duration - 1;
        if remaining_months == 0 {
            return Decimal::ZERO;
        }
        cfg.contract_value * (Decimal::ONE - cfg.initial_draw) / Decimal::from(remaining_months)
    }

    pub fn construction_draw(&self, month: Month) -> ConstructionDraw {
        let cost = self.construction_cost(month);
        let bank_financed = cost * self.config.construction_financing;
        ConstructionDraw {
            cost,
            bank_financed,
            equity_funded: cost - bank_financed,
        }
    }

    pub fn draws_for_month(&self, month: Month) -> MonthlyDraws {
        MonthlyDraws {
            construction: self.construction_draw(month),
            investor: note_draws(&self.config.investor_notes, month),
            private_lender: note_draws(&self.config.private_loans, month),
        }
    }
}

fn note_draws(notes: &[LoanTerms], month: Month) -> Vec<Money> {
    notes
        .iter()
        .map(|n| {
            if n.start_month == month {
                n.principal
            } else {
                Decimal::ZERO
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::presets::ScenarioPreset;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_month_uses_initial_draw() {
        let cfg = ScenarioPreset::Real.config();
        let scheduler = DisbursementScheduler::new(&cfg);
        // 70000 * 0.20
        let draw = scheduler.construction_draw(1);
        assert_eq!(draw.cost, dec!(14000));
        assert_eq!(draw.bank_financed, dec!(11200));
        assert_eq!(draw.equity_funded, dec!(2800));
    }

    #[test]
    fn test_remainder_spread_evenly() {
        let cfg = ScenarioPreset::Real.config();
        let scheduler = DisbursementScheduler::new(&cfg);
        // 70000 * 0.80 / 17
        let expected = dec!(56000) / dec!(17);
        for month in 2..=18 {
            let cost = scheduler.construction_cost(month);
            assert!((cost - expected).abs() < dec!(0.0000000001), "month {month}: {cost}");
        }
        assert_eq!(scheduler.construction_cost(19), Decimal::ZERO);
        assert_eq!(scheduler.construction_cost(0), Decimal::ZERO);

        let total: Money = (0..=40).map(|m| scheduler.construction_cost(m)).sum();
        assert!((total - dec!(70000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_single_month_build_draws_everything() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.construction_duration_months = 1;
        cfg.initial_draw = dec!(0.20);
        let scheduler = DisbursementScheduler::new(&cfg);
        assert_eq!(scheduler.construction_cost(1), dec!(70000));
        assert_eq!(scheduler.construction_cost(2), Decimal::ZERO);
    }

    #[test]
    fn test_late_start() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.construction_start_month = 4;
        cfg.construction_duration_months = 3;
        cfg.initial_draw = dec!(0.50);
        let scheduler = DisbursementScheduler::new(&cfg);
        assert_eq!(scheduler.construction_cost(3), Decimal::ZERO);
        assert_eq!(scheduler.construction_cost(4), dec!(35000));
        assert_eq!(scheduler.construction_cost(5), dec!(17500));
        assert_eq!(scheduler.construction_cost(6), dec!(17500));
        assert_eq!(scheduler.construction_cost(7), Decimal::ZERO);
    }

    #[test]
    fn test_notes_drawn_once_at_start_month() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.investor_notes[0].start_month = 0;
        let scheduler = DisbursementScheduler::new(&cfg);

        let opening = scheduler.draws_for_month(0);
        assert_eq!(opening.investor, vec![dec!(2000)]);
        assert_eq!(opening.private_lender, vec![Decimal::ZERO]);
        assert_eq!(opening.note_total(), dec!(2000));

        let first = scheduler.draws_for_month(1);
        assert_eq!(first.investor, vec![Decimal::ZERO]);
        assert_eq!(first.note_total(), dec!(5000));

        assert_eq!(scheduler.draws_for_month(2).note_total(), Decimal::ZERO);
    }
}
