use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::index::InflationIndex;
use super::state::{BankTrancheState, DebtState, NoteState};
use crate::scenario::config::{LandRepaymentWindow, LenderClass};
use crate::types::{ClassAmounts, Money, Month};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How one month's cash was distributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterfallOutcome {
    /// Total paid to each class (interest + principal)
    pub payments: ClassAmounts,
    /// Interest component of `payments`
    pub interest_paid: ClassAmounts,
    /// Cash left after every step, never negative
    pub residual_cash: Money,
    /// Cash the forced closure needed beyond what was available
    pub shortfall: Money,
}

impl WaterfallOutcome {
    pub fn principal_paid(&self) -> Money {
        self.payments.total() - self.interest_paid.total()
    }
}

/// One month's context for the allocator.
#[derive(Debug, Clone, Copy)]
pub struct AllocationMonth<'i> {
    pub month: Month,
    /// Forced closure: retire every class regardless of cash
    pub is_closing: bool,
    /// Bank interest accrued this month, in indexed units
    pub bank_interest: Money,
    pub index: &'i InflationIndex,
}

/// Distributes a month's cash across bank debt, investor notes and
/// private-lender loans, in that order.
#[derive(Debug, Clone)]
pub struct CashWaterfallAllocator {
    land_window: LandRepaymentWindow,
    closure_tolerance: Money,
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

impl CashWaterfallAllocator {
    pub fn new(land_window: LandRepaymentWindow, closure_tolerance: Money) -> Self {
        Self {
            land_window,
            closure_tolerance,
        }
    }

    /// Run the waterfall for one month.
    ///
    /// Outside the closing month no step pays more than the cash left to it.
    /// On the closing month every balance is retired and the excess over
    /// `cash` is reported as `shortfall`.
    pub fn allocate(
        &self,
        cash: Money,
        state: &mut DebtState,
        ctx: AllocationMonth<'_>,
    ) -> WaterfallOutcome {
        let mut out = WaterfallOutcome::default();
        let mut remaining = cash;

        let (bank_paid, bank_interest) = self.pay_bank(remaining, state, &ctx);
        out.payments.bank = bank_paid;
        out.interest_paid.bank = bank_interest;
        remaining -= bank_paid;

        for class in [LenderClass::Investor, LenderClass::PrivateLender] {
            let paid = pay_notes(state.notes_mut(class), remaining, ctx.is_closing);
            match class {
                LenderClass::Investor => {
                    out.payments.investor = paid.total();
                    out.interest_paid.investor = paid.interest;
                }
                LenderClass::PrivateLender => {
                    out.payments.private_lender = paid.total();
                    out.interest_paid.private_lender = paid.interest;
                }
            }
            remaining -= paid.total();
        }

        if remaining < Decimal::ZERO {
            out.shortfall = -remaining;
            out.residual_cash = Decimal::ZERO;
            debug!(
                month = ctx.month,
                shortfall = %out.shortfall,
                "forced closure funded by equity"
            );
        } else {
            out.residual_cash = remaining;
        }
        out
    }

    /// Returns `(paid, interest_component)` for the bank.
    fn pay_bank(
        &self,
        cash: Money,
        state: &mut DebtState,
        ctx: &AllocationMonth<'_>,
    ) -> (Money, Money) {
        let land = state.land.value(ctx.index);
        let construction = state.construction.value(ctx.index);
        let in_window = self.land_window.contains(ctx.month);

        let payable = if ctx.is_closing || in_window {
            land + construction
        } else {
            construction
        };
        if payable <= Decimal::ZERO {
            return (Decimal::ZERO, Decimal::ZERO);
        }

        let paid = if ctx.is_closing {
            payable
        } else {
            cash.max(Decimal::ZERO).min(payable)
        };
        if paid <= Decimal::ZERO {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let interest = paid.min(ctx.bank_interest.max(Decimal::ZERO));

        let (to_land, to_construction) = if ctx.is_closing {
            (land, construction)
        } else if in_window && self.land_window.priority {
            let to_land = land.min(paid);
            (to_land, construction.min(paid - to_land))
        } else if in_window {
            let total = land + construction;
            (paid * land / total, paid * construction / total)
        } else {
            (Decimal::ZERO, paid)
        };

        self.retire(&mut state.land, to_land, land, ctx);
        self.retire(&mut state.construction, to_construction, construction, ctx);
        (paid, interest)
    }

    /// Reduce a tranche by `amount` out of its current `value`.
    fn retire(
        &self,
        tranche: &mut BankTrancheState,
        amount: Money,
        value: Money,
        ctx: &AllocationMonth<'_>,
    ) {
        if amount <= Decimal::ZERO || value <= Decimal::ZERO {
            return;
        }
        if ctx.is_closing && amount >= value - self.closure_tolerance {
            let residual = value - amount;
            if !residual.is_zero() {
                warn!(month = ctx.month, %residual, "tranche residual snapped to zero");
            }
            tranche.clear();
        } else {
            tranche.retire_fraction(amount / value);
        }
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct NotePayment {
    interest: Money,
    capital: Money,
}

impl NotePayment {
    fn total(&self) -> Money {
        self.interest + self.capital
    }
}

/// Interest first (pro-rata by exigible interest), then capital (pro-rata
/// by balance). On the closing month every note is settled in full.
fn pay_notes(notes: &mut [NoteState], cash: Money, is_closing: bool) -> NotePayment {
    let outstanding: Money = notes.iter().map(|n| n.balance).sum();
    if outstanding <= Decimal::ZERO {
        return NotePayment::default();
    }

    if is_closing {
        let mut paid = NotePayment::default();
        for note in notes.iter_mut() {
            let (interest, principal) = note.settle();
            paid.interest += interest;
            paid.capital += principal;
        }
        return paid;
    }

    if cash <= Decimal::ZERO {
        return NotePayment::default();
    }

    let due: Money = notes.iter().map(|n| n.exigible).sum();
    let interest = cash.min(due);
    if interest > Decimal::ZERO {
        for note in notes.iter_mut() {
            if note.exigible > Decimal::ZERO {
                note.pay_interest(interest * note.exigible / due);
            }
        }
    }

    let left = cash - interest;
    let outstanding: Money = notes.iter().map(|n| n.balance).sum();
    let capital = if left > Decimal::ZERO && outstanding > Decimal::ZERO {
        left.min(outstanding)
    } else {
        Decimal::ZERO
    };
    if capital > Decimal::ZERO {
        for note in notes.iter_mut() {
            if note.balance > Decimal::ZERO {
                note.pay_capital(capital * note.balance / outstanding);
            }
        }
    }

    NotePayment { interest, capital }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
