use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevFinError;
use crate::types::{Money, Month, Rate};
use crate::DevFinResult;

/// Residual below which a tranche is snapped to zero on the closing month.
pub const DEFAULT_CLOSURE_TOLERANCE: Money = dec!(0.1);

/// Monthly non-financial costs keep running this many months after reception.
pub const OPERATING_COST_TAIL_MONTHS: Month = 6;

/// Latest month any schedule input may name.
pub const MAX_SCHEDULE_MONTH: Month = 1200;

/// Upper bound on annual rates and inflation (1000%).
pub const MAX_ANNUAL_RATE: Rate = dec!(10);

/// Upper bound on any single input amount.
pub const MAX_AMOUNT: Money = dec!(1000000000000000);

/// Slack allowed when checking that sale fractions do not exceed 100%.
const SALE_PLAN_TOLERANCE: Decimal = dec!(0.000000001);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// When accrued interest on a note becomes callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFrequency {
    /// Interest accrued this month is due this month
    Monthly,
    /// Interest accumulates and is due on months divisible by 3
    Quarterly,
    /// Interest compounds into the balance until forced closure
    Bullet,
}

/// Which list a note belongs to; drives its place in the waterfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LenderClass {
    Investor,
    PrivateLender,
}

/// Terms shared by investor notes and private-lender loans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    #[serde(default)]
    pub name: String,
    /// Amount drawn once, at `start_month`
    pub principal: Money,
    /// Annual nominal rate, accrued monthly at `annual_rate / 12`
    pub annual_rate: Rate,
    /// Month the principal is drawn (0 = part of the opening balance)
    pub start_month: Month,
    pub frequency: PaymentFrequency,
    /// Nominal term in months (investor notes only, informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
}

/// Currency mix and rates of the bank facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDebtTerms {
    /// Fraction of bank debt held in nominal local currency; the rest is indexed
    pub nominal_share: Rate,
    /// Real annual rate on the indexed balance
    pub indexed_annual_rate: Rate,
    /// Annual rate on the nominal balance
    pub nominal_annual_rate: Rate,
}

/// Months in which principal payments may be applied to the land tranche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandRepaymentWindow {
    pub start_month: Month,
    pub end_month: Month,
    /// Repay land fully before construction inside the window (else pro-rata)
    #[serde(default)]
    pub priority: bool,
}

impl Default for LandRepaymentWindow {
    fn default() -> Self {
        Self {
            start_month: 1,
            end_month: 60,
            priority: false,
        }
    }
}

impl LandRepaymentWindow {
    pub fn contains(&self, month: Month) -> bool {
        month >= self.start_month && month <= self.end_month
    }
}

/// A sale receipt: `fraction` of the total sale value collected in `month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleMilestone {
    pub month: Month,
    pub fraction: Rate,
}

/// Complete, read-only input for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: String,
    /// Calendar date of month 0, used only to label ledger rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    pub land_value: Money,
    pub land_financing: Rate,
    pub contract_value: Money,
    pub construction_financing: Rate,
    pub construction_start_month: Month,
    pub construction_duration_months: u32,
    /// Fraction of the contract drawn in the first construction month
    pub initial_draw: Rate,
    pub reception_month: Month,

    /// Bank debt already outstanding at month 0 (construction tranche)
    #[serde(default)]
    pub opening_bank_balance: Money,
    /// Interest paid before month 0; a cost only, never simulated
    #[serde(default)]
    pub historical_interest: Money,
    #[serde(default)]
    pub initial_other_costs: Money,
    #[serde(default)]
    pub monthly_other_costs: Money,

    pub bank_debt: BankDebtTerms,
    pub annual_inflation: Rate,
    /// Fund any shortfall on bank interest with equity every month
    #[serde(default)]
    pub pay_interest_during_construction: bool,
    #[serde(default)]
    pub land_repayment: LandRepaymentWindow,

    pub total_sale_value: Money,
    pub sale_plan: Vec<SaleMilestone>,

    #[serde(default)]
    pub investor_notes: Vec<LoanTerms>,
    #[serde(default)]
    pub private_loans: Vec<LoanTerms>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_tolerance: Option<Money>,
}

// ---------------------------------------------------------------------------
// Derived schedule facts
// ---------------------------------------------------------------------------

impl ScenarioConfig {
    /// Last month with construction draws.
    pub fn construction_end_month(&self) -> Month {
        self.construction_start_month
            .saturating_add(self.construction_duration_months.saturating_sub(1))
    }

    /// Last month with a positive sale fraction; forced closure happens here.
    pub fn closing_month(&self) -> Option<Month> {
        self.sale_plan
            .iter()
            .filter(|s| s.fraction > Decimal::ZERO)
            .map(|s| s.month)
            .max()
    }

    /// Number of simulated months after month 0.
    pub fn horizon(&self) -> Month {
        let mut horizon = self.reception_month.saturating_add(12);
        if let Some(last_plan_month) = self.sale_plan.iter().map(|s| s.month).max() {
            horizon = horizon.max(last_plan_month.saturating_add(6));
        }
        horizon.max(self.construction_end_month().saturating_add(6))
    }

    /// Sale receipts collected in `month`.
    pub fn sale_receipts(&self, month: Month) -> Money {
        self.sale_plan
            .iter()
            .filter(|s| s.month == month)
            .map(|s| self.total_sale_value * s.fraction)
            .sum()
    }

    /// Non-financial operating cost charged in `month` (month >= 1).
    pub fn operating_cost(&self, month: Month) -> Money {
        let last = self.reception_month.saturating_add(OPERATING_COST_TAIL_MONTHS);
        if month >= 1 && month <= last {
            self.monthly_other_costs
        } else {
            Decimal::ZERO
        }
    }

    /// Bank debt seeded at month 0 for the land tranche.
    pub fn land_debt(&self) -> Money {
        self.land_value * self.land_financing
    }

    /// Equity paid at month 0: unfinanced land plus one-time costs.
    pub fn initial_equity(&self) -> Money {
        self.land_value * (Decimal::ONE - self.land_financing) + self.initial_other_costs
    }

    pub fn closure_tolerance(&self) -> Money {
        self.closure_tolerance.unwrap_or(DEFAULT_CLOSURE_TOLERANCE)
    }

    /// Investor notes followed by private-lender loans, tagged by class.
    pub fn notes(&self) -> impl Iterator<Item = (LenderClass, &LoanTerms)> {
        self.investor_notes
            .iter()
            .map(|n| (LenderClass::Investor, n))
            .chain(
                self.private_loans
                    .iter()
                    .map(|n| (LenderClass::PrivateLender, n)),
            )
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject malformed configurations before any month is simulated.
///
/// Returns non-fatal findings as warnings.
pub fn validate_config(config: &ScenarioConfig) -> DevFinResult<Vec<String>> {
    let mut warnings: Vec<String> = Vec::new();

    for (field, value) in [
        ("land_value", config.land_value),
        ("contract_value", config.contract_value),
        ("opening_bank_balance", config.opening_bank_balance),
        ("historical_interest", config.historical_interest),
        ("initial_other_costs", config.initial_other_costs),
        ("monthly_other_costs", config.monthly_other_costs),
        ("total_sale_value", config.total_sale_value),
    ] {
        require_amount(field, value)?;
    }

    for (field, value) in [
        ("land_financing", config.land_financing),
        ("construction_financing", config.construction_financing),
        ("initial_draw", config.initial_draw),
        ("bank_debt.nominal_share", config.bank_debt.nominal_share),
    ] {
        require_fraction(field, value)?;
    }

    require_rate("bank_debt.indexed_annual_rate", config.bank_debt.indexed_annual_rate)?;
    require_rate("bank_debt.nominal_annual_rate", config.bank_debt.nominal_annual_rate)?;
    if config.annual_inflation <= dec!(-1) {
        return Err(DevFinError::invalid(
            "annual_inflation",
            "Inflation must be greater than -100%",
        ));
    }
    if config.annual_inflation > MAX_ANNUAL_RATE {
        return Err(DevFinError::invalid(
            "annual_inflation",
            format!("Inflation cannot exceed {MAX_ANNUAL_RATE}"),
        ));
    }

    for (field, month) in [
        ("construction_start_month", config.construction_start_month),
        ("construction_duration_months", config.construction_duration_months),
        ("reception_month", config.reception_month),
        ("construction_duration_months", config.construction_end_month()),
    ] {
        require_schedule_month(field, month)?;
    }

    if config.construction_duration_months == 0 {
        return Err(DevFinError::invalid(
            "construction_duration_months",
            "Construction must last at least one month",
        ));
    }
    if config.construction_start_month == 0 {
        return Err(DevFinError::invalid(
            "construction_start_month",
            "Construction starts in month 1 or later; month 0 is the opening row",
        ));
    }

    if config.land_repayment.start_month > config.land_repayment.end_month {
        return Err(DevFinError::invalid(
            "land_repayment",
            format!(
                "Window start ({}) is after window end ({})",
                config.land_repayment.start_month, config.land_repayment.end_month
            ),
        ));
    }

    if let Some(tol) = config.closure_tolerance {
        if tol <= Decimal::ZERO {
            return Err(DevFinError::invalid(
                "closure_tolerance",
                "Closure tolerance must be positive",
            ));
        }
    }

    // --- Sale plan ---
    for (i, sale) in config.sale_plan.iter().enumerate() {
        require_schedule_month(&format!("sale_plan[{i}].month"), sale.month)?;
        if sale.fraction < Decimal::ZERO {
            return Err(DevFinError::invalid(
                format!("sale_plan[{i}].fraction"),
                "Sale fraction cannot be negative",
            ));
        }
    }
    let sold: Decimal = config.sale_plan.iter().map(|s| s.fraction).sum();
    if sold > Decimal::ONE + SALE_PLAN_TOLERANCE {
        return Err(DevFinError::invalid(
            "sale_plan",
            format!("Sale fractions sum to {sold}, above 100%"),
        ));
    }
    if sold < Decimal::ONE {
        warnings.push(format!(
            "Sale plan covers {}% of the sale value",
            (sold * dec!(100)).round_dp(2)
        ));
    }

    let closing = config.closing_month();
    match closing {
        None => warnings.push(
            "Sale plan has no positive receipts; debt is never force-closed".into(),
        ),
        Some(closing) if config.construction_end_month() > closing => {
            return Err(DevFinError::invalid(
                "construction_duration_months",
                format!(
                    "Construction ends in month {} after the closing month {closing}",
                    config.construction_end_month()
                ),
            ));
        }
        Some(_) => {}
    }

    // --- Notes ---
    for (class, note) in config.notes() {
        let field = match class {
            LenderClass::Investor => format!("investor_notes[{}]", note.name),
            LenderClass::PrivateLender => format!("private_loans[{}]", note.name),
        };
        require_amount(&format!("{field}.principal"), note.principal)?;
        require_rate(&format!("{field}.annual_rate"), note.annual_rate)?;
        require_schedule_month(&format!("{field}.start_month"), note.start_month)?;

        if let Some(closing) = closing {
            if note.start_month > closing {
                return Err(DevFinError::invalid(
                    format!("{field}.start_month"),
                    format!(
                        "Drawn in month {} after the closing month {closing}",
                        note.start_month
                    ),
                ));
            }
        }

        match (class, note.term_months) {
            (LenderClass::PrivateLender, Some(_)) => warnings.push(format!(
                "{field}: term is ignored for private-lender loans"
            )),
            (LenderClass::Investor, Some(term)) => {
                require_schedule_month(&format!("{field}.term_months"), term)?;
                let maturity = note.start_month + term;
                if let Some(closing) = closing {
                    if maturity < closing {
                        warnings.push(format!(
                            "{field}: term ends in month {maturity} before closing month {closing}"
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(warnings)
}

fn require_non_negative(field: &str, value: Decimal) -> DevFinResult<()> {
    if value < Decimal::ZERO {
        return Err(DevFinError::invalid(field, "Value cannot be negative"));
    }
    Ok(())
}

fn require_amount(field: &str, value: Decimal) -> DevFinResult<()> {
    require_non_negative(field, value)?;
    if value > MAX_AMOUNT {
        return Err(DevFinError::invalid(
            field,
            format!("Amount cannot exceed {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

fn require_rate(field: &str, value: Rate) -> DevFinResult<()> {
    require_non_negative(field, value)?;
    if value > MAX_ANNUAL_RATE {
        return Err(DevFinError::invalid(
            field,
            format!("Annual rate cannot exceed {MAX_ANNUAL_RATE}"),
        ));
    }
    Ok(())
}

fn require_schedule_month(field: &str, month: Month) -> DevFinResult<()> {
    if month > MAX_SCHEDULE_MONTH {
        return Err(DevFinError::invalid(
            field,
            format!("Month {month} is beyond the last schedulable month {MAX_SCHEDULE_MONTH}"),
        ));
    }
    Ok(())
}

fn require_fraction(field: &str, value: Decimal) -> DevFinResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(DevFinError::invalid(field, "Fraction must be between 0 and 1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
