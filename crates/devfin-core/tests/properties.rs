use devfin_core::debt::{AccrualEngine, DebtState, DisbursementScheduler, InflationIndex};
use devfin_core::scenario::{PaymentFrequency, SaleMilestone, ScenarioConfig, ScenarioPreset};
use devfin_core::simulation::simulate_project;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const EPSILON: Decimal = dec!(0.000000001);

#[derive(Debug, Clone)]
struct Knobs {
    sale_value: i64,
    inflation_bp: i64,
    indexed_rate_bp: i64,
    nominal_rate_bp: i64,
    nominal_pct: i64,
    duration: u32,
    priority: bool,
    top_up: bool,
    frequency: PaymentFrequency,
    note_start: u32,
}

fn frequency() -> impl Strategy<Value = PaymentFrequency> {
    prop_oneof![
        Just(PaymentFrequency::Monthly),
        Just(PaymentFrequency::Quarterly),
        Just(PaymentFrequency::Bullet),
    ]
}

fn knobs() -> impl Strategy<Value = Knobs> {
    (
        (20_000i64..250_000, 0i64..1_000, 0i64..1_500, 0i64..2_000, 0i64..=100),
        (1u32..=18, any::<bool>(), any::<bool>(), frequency(), 0u32..=10),
    )
        .prop_map(
            |(
                (sale_value, inflation_bp, indexed_rate_bp, nominal_rate_bp, nominal_pct),
                (duration, priority, top_up, frequency, note_start),
            )| Knobs {
                sale_value,
                inflation_bp,
                indexed_rate_bp,
                nominal_rate_bp,
                nominal_pct,
                duration,
                priority,
                top_up,
                frequency,
                note_start,
            },
        )
}

fn scenario(k: &Knobs) -> ScenarioConfig {
    let mut cfg = ScenarioPreset::Real.config();
    cfg.total_sale_value = Decimal::from(k.sale_value);
    cfg.annual_inflation = Decimal::new(k.inflation_bp, 4);
    cfg.bank_debt.indexed_annual_rate = Decimal::new(k.indexed_rate_bp, 4);
    cfg.bank_debt.nominal_annual_rate = Decimal::new(k.nominal_rate_bp, 4);
    cfg.bank_debt.nominal_share = Decimal::new(k.nominal_pct, 2);
    cfg.construction_duration_months = k.duration;
    cfg.land_repayment.priority = k.priority;
    cfg.pay_interest_during_construction = k.top_up;
    cfg.investor_notes[0].frequency = k.frequency;
    cfg.investor_notes[0].start_month = k.note_start;
    cfg.private_loans[0].start_month = k.note_start;
    cfg
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn reruns_are_byte_identical(k in knobs()) {
        let cfg = scenario(&k);
        let first = simulate_project(&cfg).unwrap().result;
        let second = simulate_project(&cfg).unwrap().result;
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn every_balance_is_zero_from_closing_month_on(k in knobs()) {
        let cfg = scenario(&k);
        let result = simulate_project(&cfg).unwrap().result;
        let closing = result.closing_month.unwrap();
        for row in result.ledger.iter().filter(|r| r.month >= closing) {
            prop_assert!(row.debt.bank.abs() < EPSILON, "bank {} at {}", row.debt.bank, row.month);
            prop_assert!(row.debt.investor.abs() < EPSILON);
            prop_assert!(row.debt.private_lender.abs() < EPSILON);
        }
    }

    #[test]
    fn break_even_is_first_non_negative_month(k in knobs()) {
        let cfg = scenario(&k);
        let result = simulate_project(&cfg).unwrap().result;
        match result.break_even_month {
            Some(month) => {
                let row = &result.ledger[month as usize];
                prop_assert!(row.cumulative_cash_flow >= Decimal::ZERO);
                for earlier in &result.ledger[..month as usize] {
                    prop_assert!(earlier.cumulative_cash_flow < Decimal::ZERO);
                }
            }
            None => {
                prop_assert!(result.ledger.iter().all(|r| r.cumulative_cash_flow < Decimal::ZERO));
            }
        }
    }

    #[test]
    fn payments_never_exceed_cash_outside_closure(k in knobs()) {
        let cfg = scenario(&k);
        let result = simulate_project(&cfg).unwrap().result;
        for row in &result.ledger {
            let paid = row.payments.total();
            if Some(row.month) == result.closing_month {
                prop_assert!(paid <= row.cash_available + row.equity_injection + EPSILON);
            } else {
                prop_assert!(
                    paid <= row.cash_available + EPSILON,
                    "month {}: paid {} of {}", row.month, paid, row.cash_available
                );
            }
            prop_assert!(row.interest_paid.total() <= paid + EPSILON);
        }
    }

    #[test]
    fn bullet_note_compounds_monthly(principal in 100i64..100_000, rate_bp in 1i64..2_000, months in 1u32..48) {
        let mut cfg = ScenarioPreset::Real.config();
        cfg.private_loans[0].principal = Decimal::from(principal);
        cfg.private_loans[0].annual_rate = Decimal::new(rate_bp, 4);
        cfg.private_loans[0].frequency = PaymentFrequency::Bullet;

        let index = InflationIndex::new(cfg.annual_inflation).unwrap();
        let mut state = DebtState::new(&cfg, &index);
        state.apply_draws(&DisbursementScheduler::new(&cfg).draws_for_month(1), &index);
        let engine = AccrualEngine::new(&cfg.bank_debt);
        for month in 1..=months {
            engine.accrue(&mut state, month, &index).unwrap();
        }

        let monthly = Decimal::ONE + cfg.private_loans[0].annual_rate / dec!(12);
        let mut expected = Decimal::from(principal);
        for _ in 0..months {
            expected *= monthly;
        }
        let balance = state.private_lenders[0].balance;
        prop_assert!((balance - expected).abs() < dec!(0.000001), "{} vs {}", balance, expected);
        prop_assert!(state.private_lenders[0].exigible.is_zero());
    }
}

#[test]
fn single_sale_profit_matches_cost_breakdown() {
    let mut cfg = ScenarioPreset::Real.config();
    cfg.construction_duration_months = 1;
    cfg.initial_draw = Decimal::ONE;
    cfg.sale_plan = vec![SaleMilestone {
        month: 24,
        fraction: Decimal::ONE,
    }];
    cfg.investor_notes.clear();
    cfg.private_loans.clear();

    let result = simulate_project(&cfg).unwrap().result;
    assert_eq!(result.ledger[1].bank_draw, dec!(56000));
    assert_eq!(result.ledger[24].sale_inflow, dec!(140000));
    assert_eq!(result.ledger[24].total_debt, Decimal::ZERO);
    let other_costs = dec!(3000) + result.total_operating_costs;
    assert_eq!(
        result.profit,
        dec!(140000) - (dec!(30000) + dec!(70000) + other_costs + result.financing_cost)
    );
}
