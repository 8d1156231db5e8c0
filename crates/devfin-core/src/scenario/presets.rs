use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::config::{
    BankDebtTerms, LandRepaymentWindow, LoanTerms, PaymentFrequency, SaleMilestone,
    ScenarioConfig,
};
use crate::types::{Money, Rate};

/// The three named configurations analysts start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioPreset {
    Real,
    Optimistic,
    Pessimistic,
}

impl ScenarioPreset {
    pub const ALL: [ScenarioPreset; 3] = [
        ScenarioPreset::Real,
        ScenarioPreset::Optimistic,
        ScenarioPreset::Pessimistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioPreset::Real => "Real",
            ScenarioPreset::Optimistic => "Optimistic",
            ScenarioPreset::Pessimistic => "Pessimistic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Build the default configuration for this preset.
    pub fn config(&self) -> ScenarioConfig {
        let p = self.parameters();
        ScenarioConfig {
            name: self.name().to_string(),
            start_date: None,
            land_value: dec!(30000),
            land_financing: dec!(0.60),
            contract_value: p.contract_value,
            construction_financing: dec!(0.80),
            construction_start_month: 1,
            construction_duration_months: 18,
            initial_draw: dec!(0.20),
            reception_month: 22,
            opening_bank_balance: Decimal::ZERO,
            historical_interest: Decimal::ZERO,
            initial_other_costs: p.initial_other_costs,
            monthly_other_costs: dec!(100),
            bank_debt: BankDebtTerms {
                nominal_share: Decimal::ZERO,
                indexed_annual_rate: p.indexed_rate,
                nominal_annual_rate: p.nominal_rate,
            },
            annual_inflation: p.inflation,
            pay_interest_during_construction: false,
            land_repayment: LandRepaymentWindow::default(),
            total_sale_value: p.sale_value,
            sale_plan: (0..5)
                .map(|i| SaleMilestone {
                    month: 24 + 2 * i,
                    fraction: dec!(0.20),
                })
                .collect(),
            investor_notes: vec![LoanTerms {
                name: "Investor 1".into(),
                principal: dec!(2000),
                annual_rate: dec!(0.12),
                start_month: 1,
                frequency: PaymentFrequency::Monthly,
                term_months: Some(24),
            }],
            private_loans: vec![LoanTerms {
                name: "Related party 1".into(),
                principal: dec!(5000),
                annual_rate: dec!(0.08),
                start_month: 1,
                frequency: PaymentFrequency::Bullet,
                term_months: None,
            }],
            closure_tolerance: None,
        }
    }

    fn parameters(&self) -> PresetParameters {
        match self {
            ScenarioPreset::Real => PresetParameters {
                sale_value: dec!(140000),
                contract_value: dec!(70000),
                indexed_rate: dec!(0.065),
                nominal_rate: dec!(0.11),
                inflation: dec!(0.04),
                initial_other_costs: dec!(3000),
            },
            ScenarioPreset::Optimistic => PresetParameters {
                sale_value: dec!(155000),
                contract_value: dec!(68000),
                indexed_rate: dec!(0.055),
                nominal_rate: dec!(0.09),
                inflation: dec!(0.03),
                initial_other_costs: dec!(2500),
            },
            ScenarioPreset::Pessimistic => PresetParameters {
                sale_value: dec!(130000),
                contract_value: dec!(75000),
                indexed_rate: dec!(0.08),
                nominal_rate: dec!(0.14),
                inflation: dec!(0.06),
                initial_other_costs: dec!(4000),
            },
        }
    }
}

struct PresetParameters {
    sale_value: Money,
    contract_value: Money,
    indexed_rate: Rate,
    nominal_rate: Rate,
    inflation: Rate,
    initial_other_costs: Money,
}
