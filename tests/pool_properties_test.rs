//! Integration test: state pool and dominance properties
//!
//! Randomized but seeded (ChaCha8Rng) checks of clone independence, compact
//! preserving exactly the kept lines, and dominance being a strict partial
//! order that never prunes a line nothing else covers.

use boostline::core::Item;
use boostline::engine::batch::{covers, dominates};
use boostline::engine::DominancePruner;
use boostline::pool::{LineSnapshot, StatePool};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TIERS: usize = 5;

fn random_pool(rng: &mut ChaCha8Rng, lines: usize, block: usize) -> StatePool {
    let mut pool = StatePool::with_block(TIERS, block, block);
    let costs: Vec<f64> = (0..=TIERS).map(|i| 10f64.powi(i as i32 + 1)).collect();
    let multipliers = vec![1.0; TIERS + 1];
    for _ in 0..lines {
        let line = pool.push_line(rng.gen_range(0.0..1e6), &costs, &multipliers);
        for tier in 1..=TIERS as u8 {
            *pool.tier_amount_mut(line, tier) = rng.gen_range(0..4) as f64;
        }
        *pool.sacrificed_mut(line) = rng.gen_range(0..2) as f64;
        for item in Item::all(TIERS) {
            *pool.purchase_count_mut(line, item) = rng.gen_range(0..3);
        }
        let tick = rng.gen_range(0..100);
        pool.history_mut(line).record_purchase(Item::Tier(1), 10.0, tick);
    }
    pool
}

fn snapshots(pool: &StatePool) -> Vec<LineSnapshot> {
    (0..pool.len()).map(|line| pool.snapshot(line)).collect()
}

/// Order-independent equality of line contents.
fn same_multiset(mut a: Vec<LineSnapshot>, mut b: Vec<LineSnapshot>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    while let Some(line) = a.pop() {
        match b.iter().position(|other| *other == line) {
            Some(index) => {
                b.swap_remove(index);
            }
            None => return false,
        }
    }
    true
}

#[test]
fn test_clone_is_independent_copy() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..20 {
        let mut pool = random_pool(&mut rng, 6, 4);
        let source = rng.gen_range(0..pool.len());
        let before = snapshots(&pool);
        let copy = pool.clone_line(source);

        // growth never disturbs existing lines
        assert_eq!(snapshots(&pool)[..before.len()], before[..]);
        assert_eq!(pool.snapshot(copy), before[source]);

        pool.set_currency(copy, -1.0);
        *pool.tier_amount_mut(copy, 2) += 100.0;
        pool.history_mut(copy).record_sacrifice(2.0, 5);
        assert_eq!(pool.snapshot(source), before[source]);

        *pool.purchase_count_mut(source, Item::RateBoost) += 9;
        assert_eq!(pool.currency(copy), -1.0);
        assert_eq!(
            pool.purchase_count(copy, Item::RateBoost),
            before[source].purchase_counts[0]
        );
    }
}

#[test]
fn test_compact_keeps_exactly_the_masked_lines() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..30 {
        let mut pool = random_pool(&mut rng, 12, 5);
        let mask: Vec<bool> = (0..pool.len()).map(|_| rng.gen_bool(0.5)).collect();
        let expected: Vec<LineSnapshot> = snapshots(&pool)
            .into_iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(line, _)| line)
            .collect();

        let kept = pool.compact(&mask);
        assert_eq!(kept, mask.iter().filter(|&&keep| keep).count());
        assert_eq!(pool.len(), kept);
        assert!(same_multiset(snapshots(&pool), expected));
    }
}

#[test]
fn test_dominance_is_strict_partial_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let pool = random_pool(&mut rng, 24, 8);
    let snapshot = pool.snapshot_columns();
    let n = pool.len();
    for a in 0..n {
        assert!(!dominates(&snapshot, a, a));
        for b in 0..n {
            if dominates(&snapshot, a, b) {
                assert!(!dominates(&snapshot, b, a));
                assert!(covers(&snapshot, a, b));
            }
            for c in 0..n {
                if dominates(&snapshot, a, b) && dominates(&snapshot, b, c) {
                    assert!(dominates(&snapshot, a, c));
                }
            }
        }
    }
}

#[test]
fn test_prune_keeps_every_uncovered_line() {
    let mut rng = ChaCha8Rng::seed_from_u64(19);
    for _ in 0..20 {
        let mut pool = random_pool(&mut rng, 16, 8);
        let snapshot = pool.snapshot_columns();
        let n = pool.len();
        let uncovered: Vec<LineSnapshot> = (0..n)
            .filter(|&b| (0..n).all(|a| a == b || !covers(&snapshot, a, b)))
            .map(|line| pool.snapshot(line))
            .collect();

        DominancePruner::new().prune(&mut pool);
        let survivors = snapshots(&pool);
        for line in &uncovered {
            assert!(survivors.contains(line));
        }
        // a surviving pair can only be dominated across a tier 1 tie
        let snapshot = pool.snapshot_columns();
        for a in 0..pool.len() {
            for b in 0..pool.len() {
                if dominates(&snapshot, a, b) {
                    assert_eq!(pool.tier_amount(a, 1), pool.tier_amount(b, 1));
                }
            }
        }
    }
}
