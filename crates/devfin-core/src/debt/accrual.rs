use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::index::InflationIndex;
use super::state::{DebtState, NoteState};
use crate::error::DevFinError;
use crate::scenario::config::{BankDebtTerms, PaymentFrequency};
use crate::time_value::simple_monthly_rate;
use crate::types::{ClassAmounts, Money, Month, Rate};
use crate::DevFinResult;

/// Largest balance any instrument may carry after capitalising interest.
pub const BALANCE_LIMIT: Money = dec!(100000000000000000000);

/// Interest produced in one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccrualOutcome {
    /// Interest accrued and capitalised, in indexed units
    pub accrued: ClassAmounts,
    /// Interest contractually callable this month
    pub exigible: ClassAmounts,
}

/// Accrues monthly interest on every instrument and capitalises it.
#[derive(Debug, Clone)]
pub struct AccrualEngine {
    indexed_monthly_rate: Rate,
    nominal_monthly_rate: Rate,
}

impl AccrualEngine {
    pub fn new(terms: &BankDebtTerms) -> Self {
        Self {
            indexed_monthly_rate: simple_monthly_rate(terms.indexed_annual_rate),
            nominal_monthly_rate: simple_monthly_rate(terms.nominal_annual_rate),
        }
    }

    pub fn accrue(
        &self,
        state: &mut DebtState,
        month: Month,
        index: &InflationIndex,
    ) -> DevFinResult<AccrualOutcome> {
        // Bank: both tranches accrue, interest capitalises into construction.
        let indexed_base = state.land.indexed + state.construction.indexed;
        let nominal_base = state.land.nominal + state.construction.nominal;
        let indexed_interest = capitalise(
            &mut state.construction.indexed,
            indexed_base,
            self.indexed_monthly_rate,
            "bank indexed interest",
        )?;
        let nominal_interest = capitalise(
            &mut state.construction.nominal,
            nominal_base,
            self.nominal_monthly_rate,
            "bank nominal interest",
        )?;
        let bank = indexed_interest + index.to_indexed(nominal_interest);

        let (investor, investor_due) = accrue_notes(&mut state.investors, month)?;
        let (private_lender, private_due) = accrue_notes(&mut state.private_lenders, month)?;

        Ok(AccrualOutcome {
            accrued: ClassAmounts {
                bank,
                investor,
                private_lender,
            },
            exigible: ClassAmounts {
                bank,
                investor: investor_due,
                private_lender: private_due,
            },
        })
    }
}

/// Add `base * monthly_rate` to `balance`, failing once the result leaves
/// `BALANCE_LIMIT`. Returns the interest.
fn capitalise(
    balance: &mut Money,
    base: Money,
    monthly_rate: Rate,
    context: &str,
) -> DevFinResult<Money> {
    let interest = base.checked_mul(monthly_rate);
    let grown = interest
        .and_then(|i| balance.checked_add(i))
        .filter(|b| *b <= BALANCE_LIMIT);
    match (interest, grown) {
        (Some(interest), Some(grown)) => {
            *balance = grown;
            Ok(interest)
        }
        _ => Err(DevFinError::NumericOverflow {
            context: format!("{context} beyond {BALANCE_LIMIT}"),
        }),
    }
}

/// Returns `(accrued, exigible)` summed over `notes`.
fn accrue_notes(notes: &mut [NoteState], month: Month) -> DevFinResult<(Money, Money)> {
    let mut accrued = Decimal::ZERO;
    let mut exigible = Decimal::ZERO;
    for note in notes.iter_mut() {
        accrued += accrue_note(note, month)?;
        exigible += note.exigible;
    }
    Ok((accrued, exigible))
}

/// Capitalise one month of interest and set the note's callable amount.
pub(crate) fn accrue_note(note: &mut NoteState, month: Month) -> DevFinResult<Money> {
    note.exigible = Decimal::ZERO;
    if note.balance <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let base = note.balance;
    let context = format!("interest on note '{}'", note.name);
    let interest = capitalise(&mut note.balance, base, note.monthly_rate, &context)?;
    note.unpaid_interest += interest;

    match note.frequency {
        PaymentFrequency::Monthly => note.exigible = interest,
        PaymentFrequency::Quarterly => {
            note.quarter_bucket += interest;
            if month % 3 == 0 {
                note.exigible = note.quarter_bucket;
                note.quarter_bucket = Decimal::ZERO;
            }
        }
        PaymentFrequency::Bullet => {}
    }
    Ok(interest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::config::{LenderClass, LoanTerms};
    use crate::scenario::presets::ScenarioPreset;
    use rust_decimal_macros::dec;

    fn drawn_note(frequency: PaymentFrequency, annual_rate: Rate) -> NoteState {
        let mut note = NoteState::from_terms(
            LenderClass::Investor,
            &LoanTerms {
                name: "Note".into(),
                principal: dec!(1000),
                annual_rate,
                start_month: 1,
                frequency,
                term_months: None,
            },
        );
        note.draw();
        note
    }

    #[test]
    fn test_monthly_interest_is_exigible_immediately() {
        let mut note = drawn_note(PaymentFrequency::Monthly, dec!(0.12));
        let interest = accrue_note(&mut note, 1).unwrap();
        assert_eq!(interest, dec!(10));
        assert_eq!(note.exigible, dec!(10));
        assert_eq!(note.balance, dec!(1010));
    }

    #[test]
    fn test_quarterly_interest_called_on_quarter_months() {
        let mut note = drawn_note(PaymentFrequency::Quarterly, dec!(0.12));
        accrue_note(&mut note, 1).unwrap();
        assert_eq!(note.exigible, Decimal::ZERO);
        accrue_note(&mut note, 2).unwrap();
        assert_eq!(note.exigible, Decimal::ZERO);
        accrue_note(&mut note, 3).unwrap();
        // 10 + 10.10 + 10.201
        assert_eq!(note.exigible, dec!(30.301));
        assert_eq!(note.quarter_bucket, Decimal::ZERO);
        accrue_note(&mut note, 4).unwrap();
        assert_eq!(note.exigible, Decimal::ZERO);
    }

    #[test]
    fn test_bullet_compounds_silently() {
        let mut note = drawn_note(PaymentFrequency::Bullet, dec!(0.12));
        for month in 1..=24 {
            accrue_note(&mut note, month).unwrap();
            assert_eq!(note.exigible, Decimal::ZERO);
        }
        let mut expected = dec!(1000);
        for _ in 0..24 {
            expected *= dec!(1.01);
        }
        assert!((note.balance - expected).abs() < dec!(0.0000001));
        assert!((note.unpaid_interest - (note.balance - dec!(1000))).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_undrawn_note_accrues_nothing() {
        let mut note = drawn_note(PaymentFrequency::Monthly, dec!(0.12));
        note.balance = Decimal::ZERO;
        assert_eq!(accrue_note(&mut note, 1).unwrap(), Decimal::ZERO);
        assert_eq!(note.exigible, Decimal::ZERO);
    }

    #[test]
    fn test_bank_interest_capitalises_into_construction() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.bank_debt.indexed_annual_rate = dec!(0.12);
        let index = InflationIndex::new(Decimal::ZERO).unwrap();
        let mut state = DebtState::new(&cfg, &index);
        let engine = AccrualEngine::new(&cfg.bank_debt);

        let outcome = engine.accrue(&mut state, 1, &index).unwrap();
        // 18000 land debt at 1% a month
        assert_eq!(outcome.accrued.bank, dec!(180));
        assert_eq!(outcome.exigible.bank, dec!(180));
        assert_eq!(state.land.indexed, dec!(18000));
        assert_eq!(state.construction.indexed, dec!(180));
    }

    #[test]
    fn test_nominal_interest_reported_in_indexed_units() {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.bank_debt.nominal_share = Decimal::ONE;
        cfg.bank_debt.nominal_annual_rate = dec!(0.12);
        cfg.annual_inflation = dec!(0.10);
        let mut index = InflationIndex::new(cfg.annual_inflation).unwrap();
        let mut state = DebtState::new(&cfg, &index);
        index.advance().unwrap();
        let engine = AccrualEngine::new(&cfg.bank_debt);

        let outcome = engine.accrue(&mut state, 1, &index).unwrap();
        assert_eq!(state.construction.nominal, dec!(180));
        let expected = dec!(180) / index.factor();
        assert!((outcome.accrued.bank - expected).abs() < dec!(0.0000000001));
        assert!(outcome.accrued.bank < dec!(180));
    }

    #[test]
    fn test_runaway_bullet_is_an_error() {
        let mut note = drawn_note(PaymentFrequency::Bullet, dec!(3));
        let mut last_ok = Decimal::ZERO;
        let err = (1..=400)
            .try_for_each(|month| -> DevFinResult<()> {
                accrue_note(&mut note, month)?;
                last_ok = note.balance;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DevFinError::NumericOverflow { .. }));
        // the failing month leaves the balance untouched
        assert_eq!(note.balance, last_ok);
        assert!(note.balance <= BALANCE_LIMIT);
    }
}
