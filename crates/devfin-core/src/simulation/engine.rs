use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::debt::{
    AccrualEngine, AllocationMonth, CashWaterfallAllocator, DebtState, DisbursementScheduler,
    InflationIndex,
};
use crate::scenario::config::ScenarioConfig;
use crate::types::{ClassAmounts, Money, Month};
use crate::DevFinResult;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One simulated month. Appended once, never mutated afterwards.
///
/// All amounts are in indexed units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub month: Month,
    /// Calendar start of the month, when the scenario has a start date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,
    pub inflation_factor: Decimal,
    /// Outstanding balances at month end
    pub debt: ClassAmounts,
    pub total_debt: Money,
    pub sale_inflow: Money,
    /// Investor and private-lender principal received this month
    pub debt_inflow: Money,
    /// Bank construction draw, paid straight to the contractor
    pub bank_draw: Money,
    pub operating_costs: Money,
    /// Sales + note draws - operating costs
    pub operating_cash_flow: Money,
    /// Cash entering the waterfall, including any interest top-up
    pub cash_available: Money,
    pub interest_accrued: ClassAmounts,
    pub interest_paid: ClassAmounts,
    pub payments: ClassAmounts,
    pub principal_paid: Money,
    /// Unfinanced share of this month's construction cost
    pub construction_equity: Money,
    /// Total equity put in this month (construction, top-up, closure shortfall)
    pub equity_injection: Money,
    pub net_cash_flow: Money,
    pub cumulative_cash_flow: Money,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives the month-by-month loop for one validated configuration.
///
/// Every call to [`SimulationEngine::run`] starts from fresh debt state, so
/// repeated runs produce identical ledgers.
#[derive(Debug, Clone)]
pub struct SimulationEngine<'a> {
    config: &'a ScenarioConfig,
    scheduler: DisbursementScheduler<'a>,
    accrual: AccrualEngine,
    allocator: CashWaterfallAllocator,
    opening_index: InflationIndex,
    closing_month: Option<Month>,
    horizon: Month,
}

impl<'a> SimulationEngine<'a> {
    /// Build an engine. Assumes `config` already passed validation.
    pub fn new(config: &'a ScenarioConfig) -> DevFinResult<Self> {
        Ok(Self {
            config,
            scheduler: DisbursementScheduler::new(config),
            accrual: AccrualEngine::new(&config.bank_debt),
            allocator: CashWaterfallAllocator::new(
                config.land_repayment.clone(),
                config.closure_tolerance(),
            ),
            opening_index: InflationIndex::new(config.annual_inflation)?,
            closing_month: config.closing_month(),
            horizon: config.horizon(),
        })
    }

    pub fn horizon(&self) -> Month {
        self.horizon
    }

    pub fn closing_month(&self) -> Option<Month> {
        self.closing_month
    }

    /// Simulate months `0..=horizon` and return the ledger.
    ///
    /// Fails with `NumericOverflow` if balances or the inflation index grow
    /// past what the decimal type can carry.
    pub fn run(&self) -> DevFinResult<Vec<LedgerRow>> {
        let mut index = self.opening_index.clone();
        let mut state = DebtState::new(self.config, &index);
        let mut ledger = Vec::with_capacity(self.horizon as usize + 1);

        let opening = self.opening_row(&mut state, &index);
        let mut cumulative = opening.cumulative_cash_flow;
        ledger.push(opening);

        for month in 1..=self.horizon {
            index.advance()?;
            let row = self.step(month, &mut state, &index, cumulative)?;
            cumulative = row.cumulative_cash_flow;
            ledger.push(row);
        }
        Ok(ledger)
    }

    fn opening_row(&self, state: &mut DebtState, index: &InflationIndex) -> LedgerRow {
        let draws = self.scheduler.draws_for_month(0);
        let debt_inflow = state.apply_draws(&draws, index);
        let equity = self.config.initial_equity();
        let net = debt_inflow - equity;
        let debt = state.balances(index);

        LedgerRow {
            month: 0,
            period_start: self.period_start(0),
            inflation_factor: index.factor(),
            debt,
            total_debt: debt.total(),
            sale_inflow: Decimal::ZERO,
            debt_inflow,
            bank_draw: draws.construction.bank_financed,
            operating_costs: Decimal::ZERO,
            operating_cash_flow: Decimal::ZERO,
            cash_available: Decimal::ZERO,
            interest_accrued: ClassAmounts::default(),
            interest_paid: ClassAmounts::default(),
            payments: ClassAmounts::default(),
            principal_paid: Decimal::ZERO,
            construction_equity: draws.construction.equity_funded,
            equity_injection: equity + draws.construction.equity_funded,
            net_cash_flow: net - draws.construction.equity_funded,
            cumulative_cash_flow: net - draws.construction.equity_funded,
        }
    }

    fn step(
        &self,
        month: Month,
        state: &mut DebtState,
        index: &InflationIndex,
        cumulative: Money,
    ) -> DevFinResult<LedgerRow> {
        let draws = self.scheduler.draws_for_month(month);
        let debt_inflow = state.apply_draws(&draws, index);
        let accrual = self.accrual.accrue(state, month, index)?;

        let sale_inflow = self.config.sale_receipts(month);
        let operating_costs = self.config.operating_cost(month);
        let operating_cash_flow = sale_inflow + debt_inflow - operating_costs;

        let mut cash = operating_cash_flow.max(Decimal::ZERO);
        let mut equity = draws.construction.equity_funded;

        let bank_interest = accrual.accrued.bank;
        if self.config.pay_interest_during_construction && cash < bank_interest {
            let deficit = bank_interest - cash;
            cash += deficit;
            equity += deficit;
        }

        let is_closing = self.closing_month == Some(month);
        let outcome = self.allocator.allocate(
            cash,
            state,
            AllocationMonth {
                month,
                is_closing,
                bank_interest,
                index,
            },
        );
        equity += outcome.shortfall;

        let net_cash_flow = if operating_cash_flow < Decimal::ZERO {
            operating_cash_flow - equity
        } else {
            outcome.residual_cash - equity
        };

        let debt = state.balances(index);
        debug!(
            month,
            cash_available = %cash,
            paid = %outcome.payments.total(),
            total_debt = %debt.total(),
            closing = is_closing,
            "simulated month"
        );

        Ok(LedgerRow {
            month,
            period_start: self.period_start(month),
            inflation_factor: index.factor(),
            debt,
            total_debt: debt.total(),
            sale_inflow,
            debt_inflow,
            bank_draw: draws.construction.bank_financed,
            operating_costs,
            operating_cash_flow,
            cash_available: cash,
            interest_accrued: accrual.accrued,
            interest_paid: outcome.interest_paid,
            payments: outcome.payments,
            principal_paid: outcome.principal_paid(),
            construction_equity: draws.construction.equity_funded,
            equity_injection: equity,
            net_cash_flow,
            cumulative_cash_flow: cumulative + net_cash_flow,
        })
    }

    fn period_start(&self, month: Month) -> Option<NaiveDate> {
        self.config
            .start_date
            .and_then(|d| d.checked_add_months(Months::new(month)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
