use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::index::InflationIndex;
use super::schedule::MonthlyDraws;
use crate::scenario::config::{LenderClass, LoanTerms, PaymentFrequency, ScenarioConfig};
use crate::time_value::simple_monthly_rate;
use crate::types::{ClassAmounts, Money, Month, Rate};

// ---------------------------------------------------------------------------
// Bank tranches
// ---------------------------------------------------------------------------

/// One bank tranche, carried as two parallel balances.
///
/// `indexed` is in indexed units; `nominal` is in nominal currency and is
/// only combined with `indexed` through an [`InflationIndex`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankTrancheState {
    pub indexed: Money,
    pub nominal: Money,
}

impl BankTrancheState {
    /// Add `amount` (indexed units), splitting off `nominal_share` into
    /// nominal currency at the current factor.
    pub fn draw(&mut self, amount: Money, nominal_share: Rate, index: &InflationIndex) {
        self.indexed += amount * (Decimal::ONE - nominal_share);
        self.nominal += index.to_nominal(amount * nominal_share);
    }

    /// Outstanding balance in indexed units.
    pub fn value(&self, index: &InflationIndex) -> Money {
        self.indexed + index.to_indexed(self.nominal)
    }

    /// Retire `fraction` of the tranche, reducing both balances alike.
    pub fn retire_fraction(&mut self, fraction: Decimal) {
        let keep = Decimal::ONE - fraction.clamp(Decimal::ZERO, Decimal::ONE);
        self.indexed *= keep;
        self.nominal *= keep;
    }

    pub fn clear(&mut self) {
        self.indexed = Decimal::ZERO;
        self.nominal = Decimal::ZERO;
    }

    pub fn is_clear(&self) -> bool {
        self.indexed.is_zero() && self.nominal.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Investor and private-lender notes
// ---------------------------------------------------------------------------

/// Runtime state of one investor note or private-lender loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteState {
    pub name: String,
    pub class: LenderClass,
    pub principal: Money,
    pub monthly_rate: Rate,
    pub start_month: Month,
    pub frequency: PaymentFrequency,
    /// Principal plus capitalised interest, net of payments
    pub balance: Money,
    /// Interest accrued since the last quarterly call
    pub quarter_bucket: Money,
    /// Interest callable this month
    pub exigible: Money,
    /// Accrued interest not yet paid (a component of `balance`)
    pub unpaid_interest: Money,
}

impl NoteState {
    pub fn from_terms(class: LenderClass, terms: &LoanTerms) -> Self {
        Self {
            name: terms.name.clone(),
            class,
            principal: terms.principal,
            monthly_rate: simple_monthly_rate(terms.annual_rate),
            start_month: terms.start_month,
            frequency: terms.frequency,
            balance: Decimal::ZERO,
            quarter_bucket: Decimal::ZERO,
            exigible: Decimal::ZERO,
            unpaid_interest: Decimal::ZERO,
        }
    }

    /// Draw the full principal. Returns the amount drawn.
    pub fn draw(&mut self) -> Money {
        self.balance += self.principal;
        self.principal
    }

    pub fn pay_interest(&mut self, amount: Money) {
        self.balance = (self.balance - amount).max(Decimal::ZERO);
        self.unpaid_interest = (self.unpaid_interest - amount).max(Decimal::ZERO);
    }

    pub fn pay_capital(&mut self, amount: Money) {
        self.balance = (self.balance - amount).max(Decimal::ZERO);
        self.unpaid_interest = self.unpaid_interest.min(self.balance);
    }

    /// Retire the whole note. Returns `(interest, principal)` paid.
    pub fn settle(&mut self) -> (Money, Money) {
        let interest = self.unpaid_interest.min(self.balance);
        let principal = self.balance - interest;
        self.balance = Decimal::ZERO;
        self.unpaid_interest = Decimal::ZERO;
        self.quarter_bucket = Decimal::ZERO;
        self.exigible = Decimal::ZERO;
        (interest, principal)
    }
}

// ---------------------------------------------------------------------------
// Whole-project debt state
// ---------------------------------------------------------------------------

/// Every debt instrument of one simulation run. Created fresh per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtState {
    pub nominal_share: Rate,
    pub land: BankTrancheState,
    pub construction: BankTrancheState,
    pub investors: Vec<NoteState>,
    pub private_lenders: Vec<NoteState>,
}

impl DebtState {
    /// Seed the land tranche and the opening bank balance at month 0.
    /// Notes start undrawn.
    pub fn new(config: &ScenarioConfig, index: &InflationIndex) -> Self {
        let nominal_share = config.bank_debt.nominal_share;
        let mut land = BankTrancheState::default();
        land.draw(config.land_debt(), nominal_share, index);
        let mut construction = BankTrancheState::default();
        construction.draw(config.opening_bank_balance, nominal_share, index);

        Self {
            nominal_share,
            land,
            construction,
            investors: config
                .investor_notes
                .iter()
                .map(|t| NoteState::from_terms(LenderClass::Investor, t))
                .collect(),
            private_lenders: config
                .private_loans
                .iter()
                .map(|t| NoteState::from_terms(LenderClass::PrivateLender, t))
                .collect(),
        }
    }

    /// Apply this month's draws. Returns the note cash drawn.
    pub fn apply_draws(&mut self, draws: &MonthlyDraws, index: &InflationIndex) -> Money {
        self.construction
            .draw(draws.construction.bank_financed, self.nominal_share, index);

        let mut drawn = Decimal::ZERO;
        for (note, amount) in self.investors.iter_mut().zip(&draws.investor) {
            if !amount.is_zero() {
                drawn += note.draw();
            }
        }
        for (note, amount) in self.private_lenders.iter_mut().zip(&draws.private_lender) {
            if !amount.is_zero() {
                drawn += note.draw();
            }
        }
        drawn
    }

    /// Total bank debt in indexed units.
    pub fn bank_balance(&self, index: &InflationIndex) -> Money {
        self.land.value(index) + self.construction.value(index)
    }

    /// Outstanding balances by class, in indexed units.
    pub fn balances(&self, index: &InflationIndex) -> ClassAmounts {
        ClassAmounts {
            bank: self.bank_balance(index),
            investor: self.investors.iter().map(|n| n.balance).sum(),
            private_lender: self.private_lenders.iter().map(|n| n.balance).sum(),
        }
    }

    pub fn notes_mut(&mut self, class: LenderClass) -> &mut [NoteState] {
        match class {
            LenderClass::Investor => &mut self.investors,
            LenderClass::PrivateLender => &mut self.private_lenders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::presets::ScenarioPreset;
    use rust_decimal_macros::dec;

    fn indexed_after(months: u32, inflation: Rate) -> InflationIndex {
        let mut index = InflationIndex::new(inflation).unwrap();
        for _ in 0..months {
            index.advance().unwrap();
        }
        index
    }

    #[test]
    fn test_tranche_split_by_currency() {
        let index = InflationIndex::new(dec!(0.04)).unwrap();
        let mut tranche = BankTrancheState::default();
        tranche.draw(dec!(1000), dec!(0.25), &index);
        assert_eq!(tranche.indexed, dec!(750));
        assert_eq!(tranche.nominal, dec!(250));
        assert_eq!(tranche.value(&index), dec!(1000));
    }

    #[test]
    fn test_nominal_balance_erodes_in_indexed_units() {
        let mut tranche = BankTrancheState::default();
        tranche.draw(dec!(1000), Decimal::ONE, &InflationIndex::new(dec!(0.06)).unwrap());
        let later = indexed_after(12, dec!(0.06));
        let value = tranche.value(&later);
        assert!((value - dec!(1000) / dec!(1.06)).abs() < dec!(0.001), "got {value}");
    }

    #[test]
    fn test_retire_fraction_keeps_currency_mix() {
        let index = InflationIndex::new(Decimal::ZERO).unwrap();
        let mut tranche = BankTrancheState::default();
        tranche.draw(dec!(1000), dec!(0.40), &index);
        tranche.retire_fraction(dec!(0.25));
        assert_eq!(tranche.indexed, dec!(450));
        assert_eq!(tranche.nominal, dec!(300));
        tranche.retire_fraction(dec!(2));
        assert!(tranche.is_clear());
    }

    #[test]
    fn test_new_seeds_land_and_opening_balance() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.opening_bank_balance = dec!(5000);
        let index = InflationIndex::new(cfg.annual_inflation).unwrap();
        let state = DebtState::new(&cfg, &index);
        assert_eq!(state.land.value(&index), dec!(18000));
        assert_eq!(state.construction.value(&index), dec!(5000));
        assert_eq!(state.investors.len(), 1);
        assert_eq!(state.private_lenders.len(), 1);
        assert_eq!(state.balances(&index).investor, Decimal::ZERO);
    }

    #[test]
    fn test_note_settle_splits_interest() {
        let terms = LoanTerms {
            name: "A".into(),
            principal: dec!(1000),
            annual_rate: dec!(0.12),
            start_month: 1,
            frequency: PaymentFrequency::Bullet,
            term_months: None,
        };
        let mut note = NoteState::from_terms(LenderClass::Investor, &terms);
        note.draw();
        note.balance += dec!(10);
        note.unpaid_interest += dec!(10);
        assert_eq!(note.settle(), (dec!(10), dec!(1000)));
        assert_eq!(note.balance, Decimal::ZERO);
    }

    #[test]
    fn test_capital_payment_caps_unpaid_interest() {
        let terms = LoanTerms {
            name: "B".into(),
            principal: dec!(100),
            annual_rate: dec!(0.12),
            start_month: 1,
            frequency: PaymentFrequency::Bullet,
            term_months: None,
        };
        let mut note = NoteState::from_terms(LenderClass::PrivateLender, &terms);
        note.draw();
        note.balance += dec!(5);
        note.unpaid_interest = dec!(5);
        note.pay_capital(dec!(102));
        assert_eq!(note.balance, dec!(3));
        assert_eq!(note.unpaid_interest, dec!(3));
    }
}
