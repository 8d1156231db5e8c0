//! Month-by-month simulation loop and the reductions over its ledger.

pub mod engine;
pub mod milestones;
pub mod results;

pub use engine::{LedgerRow, SimulationEngine};
pub use milestones::{milestone_report, Milestone, MilestoneReport, MilestoneRow};
pub use results::{aggregate, break_even_month, simulate_project, SimulationResult};
