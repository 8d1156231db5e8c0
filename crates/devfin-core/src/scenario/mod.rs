pub mod config;
pub mod presets;

#[cfg(feature = "scenarios")]
pub mod set;

pub use config::{
    validate_config, BankDebtTerms, LandRepaymentWindow, LenderClass, LoanTerms,
    PaymentFrequency, SaleMilestone, ScenarioConfig,
};
pub use presets::ScenarioPreset;
