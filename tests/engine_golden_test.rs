//! Integration test: deterministic single-line runs
//!
//! A hand-built ruleset and a policy that buys one rate boost and then the
//! top tier over and over. Lower tiers are made negligible so the currency
//! only grows through tier 1, which keeps every tick count computable by
//! hand:
//! - tick 100: 100 currency buys the rate boost, income doubles to 2
//! - ticks 125, 150, 175: 50 currency buys a top tier unit each time
//!
//! A second ruleset runs the shipped fixed priorities. Every purchase is a
//! milestone there, so stacks never stay partial and every price grows
//! tenfold after each buy.

use boostline::core::scenario::{Platform, Scenario};
use boostline::core::{Item, Ruleset};
use boostline::engine::{EnginePhase, RunResult, SimulationEngine};
use boostline::policy::{FixedOrder, FixedPriority, NeverSacrifice, PurchasePolicy};
use boostline::pool::{Action, LineView, PurchaseQueue};
use boostline::report::{format_actions, format_time, Report};
use boostline::telemetry::{FixedHostProbe, NoopSink};

struct RateThenTop;

impl PurchasePolicy for RateThenTop {
    fn name(&self) -> &str {
        "RateThenTop"
    }

    fn short_name(&self) -> &str {
        "rate-then-top"
    }

    fn is_fixed_order(&self) -> bool {
        true
    }

    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
        if line.purchase_count(Item::RateBoost) == 0 {
            PurchaseQueue::single(Item::RateBoost)
        } else {
            PurchaseQueue::single(rules.top_tier())
        }
    }
}

fn golden_rules() -> Ruleset {
    Ruleset {
        scenario: Scenario::new(Platform::Pc, 0, 0),
        tiers: 4,
        tick_duration: 1.0,
        start_currency: 10.0,
        base_costs: vec![100.0, 10.0, 1e9, 1e9, 50.0],
        cost_growth: vec![10.0; 5],
        base_multipliers: vec![1.0, 1.0, 1e-300, 1e-300, 1e-300],
        rate_multiplier_growth: 2.0,
        milestone_every: 10,
        milestone_multiplier: 2.0,
        first_purchase_bonus: vec![1.0; 5],
        win_threshold: 3,
        sacrifice_enabled: false,
    }
}

#[test]
fn test_golden_tick_count() {
    let engine = SimulationEngine::new(golden_rules(), &RateThenTop, &NeverSacrifice).unwrap();
    let result = engine
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap();

    assert_eq!(result.ticks, 175);
    assert_eq!(result.winners, 1);
    assert!(!result.overflowed);
    assert_eq!(format_time(result.game_time()), "02:55.000");
    assert_eq!(result.stats.states_created, 1);
    assert_eq!(result.winner.currency, 0.0);
    assert_eq!(result.winner.tier_amounts[0], 1.0);
    assert_eq!(result.winner.purchase_counts, vec![1, 1, 0, 0, 3]);
}

#[test]
fn test_golden_history() {
    let engine = SimulationEngine::new(golden_rules(), &RateThenTop, &NeverSacrifice).unwrap();
    let result = engine
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap();

    let records = result.history().records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].action, Action::Purchase(Item::Tier(1)));
    assert_eq!(records[0].tick, 0);
    assert_eq!(records[1].action, Action::Purchase(Item::RateBoost));
    assert_eq!(records[1].tick, 100);
    assert_eq!(records[1].value, 100.0);
    assert_eq!(records[2].action, Action::Purchase(Item::Tier(4)));
    assert_eq!(records[2].repeat, 3);
    assert_eq!(records[2].tick, 175);

    let actions = format_actions(result.history(), result.tick_duration);
    assert_eq!(
        actions.lines().last(),
        Some("item: tier 4, amount:  3, total:   3, cost_one: 5e1, cost_amount: 2e2, cost_stack: 5e2, time: 02:55.000")
    );
}

#[test]
fn test_golden_run_is_reproducible() {
    let first = SimulationEngine::new(golden_rules(), &RateThenTop, &NeverSacrifice)
        .unwrap()
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap();
    let second = SimulationEngine::new(golden_rules(), &RateThenTop, &NeverSacrifice)
        .unwrap()
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap();
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.winner, second.winner);
    assert_eq!(
        Report::single(&first).actions,
        Report::single(&second).actions
    );
}

#[test]
fn test_cycle_by_cycle() {
    let mut engine = SimulationEngine::new(golden_rules(), &RateThenTop, &NeverSacrifice).unwrap();
    for _ in 0..99 {
        assert!(engine.cycle(&mut NoopSink).unwrap().is_none());
    }
    assert_eq!(engine.pool().currency(0), 99.0);
    assert_eq!(engine.pool().purchase_count(0, Item::RateBoost), 0);

    assert!(engine.cycle(&mut NoopSink).unwrap().is_none());
    assert_eq!(engine.ticks(), 100);
    assert_eq!(engine.pool().currency(0), 0.0);
    assert_eq!(engine.pool().purchase_count(0, Item::RateBoost), 1);
    assert_eq!(engine.pool().multiplier(0, Item::RateBoost), 2.0);
    assert_eq!(engine.pool().cost(0, Item::RateBoost), 1000.0);
    assert_eq!(engine.phase(), EnginePhase::Advancing);
}

#[test]
fn test_higher_threshold_takes_longer() {
    let mut rules = golden_rules();
    rules.win_threshold = 5;
    let result = SimulationEngine::new(rules, &RateThenTop, &NeverSacrifice)
        .unwrap()
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap();
    assert_eq!(result.ticks, 225);
}

/// Income is the rate multiplier alone; prices start at
/// rate 50, tier 1 10, tier 2 20, tier 3 40, tier 4 5.
fn fixed_rules() -> Ruleset {
    Ruleset {
        scenario: Scenario::new(Platform::Pc, 0, 0),
        tiers: 4,
        tick_duration: 1.0,
        start_currency: 10.0,
        base_costs: vec![50.0, 10.0, 20.0, 40.0, 5.0],
        cost_growth: vec![10.0; 5],
        base_multipliers: vec![1.0, 1.0, 1e-300, 1e-300, 1e-300],
        rate_multiplier_growth: 2.0,
        milestone_every: 1,
        milestone_multiplier: 1.0,
        first_purchase_bonus: vec![1.0; 5],
        win_threshold: 3,
        sacrifice_enabled: false,
    }
}

fn run_fixed(order: FixedOrder) -> RunResult {
    SimulationEngine::new(fixed_rules(), &FixedPriority::new(order), &NeverSacrifice)
        .unwrap()
        .run(&mut NoopSink, &FixedHostProbe::default())
        .unwrap()
}

#[test]
fn test_fixed_priority_rate_first() {
    // ticks 50, 60, 80, 83: rate boost, tiers 2 to 4, each never bought yet.
    // At 83 the rate boost (500) ties the tier 4 stack (10 x 50) and T12345678
    // takes the rate boost at 333, then tier 4 at 346, a round of tiers 1 to 3
    // at 371, 396, 446 and the winning tier 4 at 509.
    let result = run_fixed(FixedOrder::RateFirst);
    assert_eq!(result.ticks, 509);
    assert_eq!(result.purchase_policy, "T12345678");
    assert_eq!(result.stats.states_created, 1);
    assert_eq!(result.winner.currency, 7.0);
    assert_eq!(result.winner.purchase_counts, vec![2, 2, 2, 2, 3]);
    assert_eq!(
        result.history().expanded_purchases(),
        vec![
            Item::Tier(1),
            Item::RateBoost,
            Item::Tier(2),
            Item::Tier(3),
            Item::Tier(4),
            Item::RateBoost,
            Item::Tier(4),
            Item::Tier(1),
            Item::Tier(2),
            Item::Tier(3),
            Item::Tier(4),
        ]
    );
    let ticks: Vec<u64> = result.history().records().iter().map(|r| r.tick).collect();
    assert_eq!(ticks, vec![0, 50, 60, 80, 83, 333, 346, 371, 396, 446, 509]);
}

#[test]
fn test_fixed_priority_high_tiers_first() {
    // same tie at 83, but 87654321T takes tier 4 at 108 and the rate
    // boost only at 358
    let result = run_fixed(FixedOrder::HighTiersFirst);
    assert_eq!(result.ticks, 521);
    assert_eq!(result.winner.currency, 5.0);
    assert_eq!(result.winner.purchase_counts, vec![2, 2, 2, 2, 3]);
    assert_eq!(
        result.history().expanded_purchases()[4..7],
        [Item::Tier(4), Item::Tier(4), Item::RateBoost]
    );
    let ticks: Vec<u64> = result.history().records().iter().map(|r| r.tick).collect();
    assert_eq!(ticks, vec![0, 50, 60, 80, 83, 108, 358, 383, 408, 458, 521]);
}
