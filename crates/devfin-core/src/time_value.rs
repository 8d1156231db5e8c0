use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DevFinError;
use crate::types::Rate;
use crate::DevFinResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Simple monthly rate used for interest accrual: `annual / 12`.
pub fn simple_monthly_rate(annual: Rate) -> Rate {
    annual / MONTHS_PER_YEAR
}

/// Compound-equivalent monthly rate: `(1 + annual)^(1/12) - 1`.
pub fn compound_monthly_rate(annual: Rate) -> DevFinResult<Rate> {
    if annual <= dec!(-1) {
        return Err(DevFinError::invalid(
            "annual_rate",
            "Annual rate must be greater than -100%",
        ));
    }
    if annual.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let growth = (Decimal::ONE + annual)
        .checked_powd(Decimal::ONE / MONTHS_PER_YEAR)
        .ok_or_else(|| DevFinError::NumericOverflow {
            context: "monthly compounding of annual rate".into(),
        })?;
    Ok(growth - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_monthly_rate() {
        assert_eq!(simple_monthly_rate(dec!(0.12)), dec!(0.01));
        assert_eq!(simple_monthly_rate(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_compound_monthly_rate_recovers_annual() {
        let monthly = compound_monthly_rate(dec!(0.04)).unwrap();
        let mut factor = Decimal::ONE;
        for _ in 0..12 {
            factor *= Decimal::ONE + monthly;
        }
        assert!((factor - dec!(1.04)).abs() < dec!(0.0000001), "got {factor}");
    }

    #[test]
    fn test_compound_monthly_rate_zero() {
        assert_eq!(compound_monthly_rate(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_compound_monthly_rate_rejects_total_loss() {
        assert!(compound_monthly_rate(dec!(-1)).is_err());
    }
}
