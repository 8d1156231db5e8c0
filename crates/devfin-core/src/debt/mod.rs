//! Runtime debt instruments and the monthly mechanics acting on them:
//! draws, interest accrual and the cash waterfall.

pub mod accrual;
pub mod index;
pub mod schedule;
pub mod state;
pub mod waterfall;

pub use accrual::{AccrualEngine, AccrualOutcome};
pub use index::InflationIndex;
pub use schedule::{ConstructionDraw, DisbursementScheduler, MonthlyDraws};
pub use state::{BankTrancheState, DebtState, NoteState};
pub use waterfall::{AllocationMonth, CashWaterfallAllocator, WaterfallOutcome};
