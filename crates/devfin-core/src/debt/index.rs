use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevFinError;
use crate::time_value::compound_monthly_rate;
use crate::types::{Money, Rate};
use crate::DevFinResult;

/// The factor must stay within `[1 / FACTOR_LIMIT, FACTOR_LIMIT]` so unit
/// conversions of bounded balances cannot overflow.
pub const FACTOR_LIMIT: Decimal = dec!(1000000);

/// Cumulative inflation factor linking nominal currency to indexed units.
///
/// Every conversion between the two unit systems goes through this type.
/// `factor(0) = 1`, `factor(m) = factor(m-1) * (1 + monthly_rate)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationIndex {
    monthly_rate: Rate,
    factor: Decimal,
}

impl InflationIndex {
    pub fn new(annual_inflation: Rate) -> DevFinResult<Self> {
        Ok(Self {
            monthly_rate: compound_monthly_rate(annual_inflation)?,
            factor: Decimal::ONE,
        })
    }

    pub fn monthly_rate(&self) -> Rate {
        self.monthly_rate
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    /// Move the index forward one month.
    pub fn advance(&mut self) -> DevFinResult<()> {
        let factor = self
            .factor
            .checked_mul(Decimal::ONE + self.monthly_rate)
            .filter(|f| *f <= FACTOR_LIMIT && *f * FACTOR_LIMIT >= Decimal::ONE)
            .ok_or_else(|| DevFinError::NumericOverflow {
                context: format!("inflation index beyond {FACTOR_LIMIT}x drift"),
            })?;
        self.factor = factor;
        Ok(())
    }

    /// Nominal currency -> indexed units at the current factor.
    pub fn to_indexed(&self, nominal: Money) -> Money {
        nominal / self.factor
    }

    /// Indexed units -> nominal currency at the current factor.
    pub fn to_nominal(&self, indexed: Money) -> Money {
        indexed * self.factor
    }
}
