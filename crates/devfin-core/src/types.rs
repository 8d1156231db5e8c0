use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values, in indexed units unless stated otherwise.
/// Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Zero-based simulation month. Month 0 is the opening row.
pub type Month = u32;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// One amount per debt class. Used for balances, accrued interest,
/// interest paid and total payments alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAmounts {
    pub bank: Money,
    pub investor: Money,
    pub private_lender: Money,
}

impl ClassAmounts {
    pub fn total(&self) -> Money {
        self.bank + self.investor + self.private_lender
    }
}

impl std::ops::AddAssign for ClassAmounts {
    fn add_assign(&mut self, rhs: Self) {
        self.bank += rhs.bank;
        self.investor += rhs.investor;
        self.private_lender += rhs.private_lender;
    }
}
