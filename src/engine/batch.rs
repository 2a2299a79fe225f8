//! Whole-pool batch queries.
//!
//! Every function here is pure: it reads a pool snapshot, returns a fresh
//! vector and keeps nothing between calls. Work is spread over lines with
//! rayon.

use crate::core::balance::{predicted_sacrifice_boost, MAX_TIERS};
use crate::pool::{PoolSnapshot, TickColumns};
use rayon::prelude::*;

/// Lines whose head purchase is affordable right now.
pub fn affordable_lines(pool: &PoolSnapshot<'_>) -> Vec<bool> {
    let width = pool.tiers + 1;
    (0..pool.len)
        .into_par_iter()
        .map(|line| {
            pool.purchase_queues[line]
                .head()
                .map(|item| pool.costs[line * width + item.index()] <= pool.currency[line])
                .unwrap_or(false)
        })
        .collect()
}

/// Boost each line would sacrifice for now, if its head threshold is met.
///
/// A line with no top tier amount never sacrifices.
pub fn sacrifice_boosts(pool: &PoolSnapshot<'_>) -> Vec<Option<f64>> {
    let tiers = pool.tiers;
    (0..pool.len)
        .into_par_iter()
        .map(|line| {
            let amounts = &pool.tier_amounts[line * tiers..(line + 1) * tiers];
            if amounts[tiers - 1] == 0.0 {
                return None;
            }
            let threshold = pool.sacrifice_queues[line].head()?;
            let boost = predicted_sacrifice_boost(pool.sacrificed[line], amounts[0]);
            (boost >= threshold).then_some(boost)
        })
        .collect()
}

/// Advance one line by one tick, highest tier first.
fn advance_line(currency: &mut f64, tiers: &mut [f64], multipliers: &[f64], tick_duration: f64) {
    let rate = multipliers[0];
    for tier in (2..=tiers.len()).rev() {
        tiers[tier - 2] += tiers[tier - 1] * multipliers[tier] * rate * tick_duration;
    }
    *currency += tiers[0] * multipliers[1] * rate * tick_duration;
}

/// Whether advancing this line would leave any value non-finite.
fn line_overflows(currency: f64, tiers: &[f64], multipliers: &[f64], tick_duration: f64) -> bool {
    let mut scratch = [0.0; MAX_TIERS];
    let scratch = &mut scratch[..tiers.len()];
    scratch.copy_from_slice(tiers);
    let mut currency = currency;
    advance_line(&mut currency, scratch, multipliers, tick_duration);
    !currency.is_finite() || scratch.iter().any(|amount| !amount.is_finite())
}

/// Advance every live line by one tick.
///
/// Returns `false` without touching any line when some value would become
/// non-finite.
pub fn checked_tick(columns: TickColumns<'_>, tick_duration: f64) -> bool {
    let TickColumns {
        tiers,
        len,
        currency,
        tier_amounts,
        multipliers,
    } = columns;
    let width = tiers + 1;

    let overflows = {
        let currency = &*currency;
        let tier_amounts = &*tier_amounts;
        (0..len).into_par_iter().any(|line| {
            line_overflows(
                currency[line],
                &tier_amounts[line * tiers..(line + 1) * tiers],
                &multipliers[line * width..(line + 1) * width],
                tick_duration,
            )
        })
    };
    if overflows {
        return false;
    }

    currency[..len]
        .par_iter_mut()
        .zip(tier_amounts[..len * tiers].par_chunks_mut(tiers))
        .zip(multipliers[..len * width].par_chunks(width))
        .for_each(|((currency, amounts), multipliers)| {
            advance_line(currency, amounts, multipliers, tick_duration);
        });
    true
}

/// Advance every live line by one tick, one line at a time, letting values
/// run off to infinity.
pub fn unchecked_tick(columns: TickColumns<'_>, tick_duration: f64) {
    let TickColumns {
        tiers,
        len,
        currency,
        tier_amounts,
        multipliers,
    } = columns;
    let width = tiers + 1;
    for line in 0..len {
        advance_line(
            &mut currency[line],
            &mut tier_amounts[line * tiers..(line + 1) * tiers],
            &multipliers[line * width..(line + 1) * width],
            tick_duration,
        );
    }
}

/// `a` is at least as good as `b` in every tracked amount and purchase count.
pub fn covers(pool: &PoolSnapshot<'_>, a: usize, b: usize) -> bool {
    let tiers = pool.tiers;
    let width = tiers + 1;
    if pool.currency[a] < pool.currency[b] || pool.sacrificed[a] < pool.sacrificed[b] {
        return false;
    }
    let amounts_a = &pool.tier_amounts[a * tiers..(a + 1) * tiers];
    let amounts_b = &pool.tier_amounts[b * tiers..(b + 1) * tiers];
    if amounts_a.iter().zip(amounts_b).any(|(x, y)| x < y) {
        return false;
    }
    let counts_a = &pool.purchase_counts[a * width..(a + 1) * width];
    let counts_b = &pool.purchase_counts[b * width..(b + 1) * width];
    counts_a.iter().zip(counts_b).all(|(x, y)| x >= y)
}

/// Strict dominance: `a` covers `b` and differs from it somewhere.
pub fn dominates(pool: &PoolSnapshot<'_>, a: usize, b: usize) -> bool {
    covers(pool, a, b) && !covers(pool, b, a)
}

/// Mark every line covered by a line ranked before it in `order`.
///
/// Exact duplicates keep their first representative. The first ranked line
/// is never marked, so at least one line survives.
pub fn find_dominated(pool: &PoolSnapshot<'_>, order: &[usize]) -> Vec<bool> {
    let flags: Vec<bool> = (0..order.len())
        .into_par_iter()
        .map(|rank| {
            let line = order[rank];
            order[..rank]
                .iter()
                .any(|&better| covers(pool, better, line))
        })
        .collect();
    let mut dominated = vec![false; pool.len];
    for (rank, flag) in flags.into_iter().enumerate() {
        dominated[order[rank]] = flag;
    }
    dominated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::Item;
    use crate::pool::{PurchaseQueue, SacrificeQueue, StatePool};

    fn pool() -> StatePool {
        let mut pool = StatePool::with_block(4, 4, 4);
        let costs = [1e3, 10.0, 100.0, 1e4, 1e6];
        let multipliers = [1.0, 1.0, 1.0, 1.0, 1.0];
        pool.push_line(10.0, &costs, &multipliers);
        pool.push_line(5.0, &costs, &multipliers);
        pool
    }

    #[test]
    fn test_affordable_uses_queue_head() {
        let mut pool = pool();
        pool.set_purchase_queue(0, PurchaseQueue::single(Item::Tier(1)));
        pool.set_purchase_queue(1, PurchaseQueue::single(Item::Tier(1)));
        assert_eq!(affordable_lines(&pool.snapshot_columns()), vec![true, false]);
        pool.set_purchase_queue(0, PurchaseQueue::default());
        assert_eq!(affordable_lines(&pool.snapshot_columns()), vec![false, false]);
    }

    #[test]
    fn test_checked_tick_propagates_downwards() {
        let mut pool = pool();
        *pool.tier_amount_mut(0, 1) = 2.0;
        *pool.tier_amount_mut(0, 2) = 3.0;
        assert!(checked_tick(pool.tick_columns(), 0.5));
        // tier 2 feeds tier 1 before tier 1 feeds the currency
        assert_eq!(pool.tier_amount(0, 1), 3.5);
        assert_eq!(pool.currency(0), 10.0 + 3.5 * 0.5);
        assert_eq!(pool.currency(1), 5.0);
    }

    #[test]
    fn test_checked_tick_refuses_overflow() {
        let mut pool = pool();
        *pool.tier_amount_mut(1, 1) = f64::MAX;
        *pool.multiplier_mut(1, Item::Tier(1)) = 4.0;
        *pool.tier_amount_mut(0, 1) = 1.0;
        assert!(!checked_tick(pool.tick_columns(), 1.0));
        assert_eq!(pool.currency(0), 10.0);

        unchecked_tick(pool.tick_columns(), 1.0);
        assert_eq!(pool.currency(0), 11.0);
        assert!(pool.currency(1).is_infinite());
    }

    #[test]
    fn test_sacrifice_needs_top_tier_and_threshold() {
        let mut pool = pool();
        *pool.tier_amount_mut(0, 1) = 1e20;
        pool.set_sacrifice_queue(0, SacrificeQueue::from_thresholds(vec![1.5]));
        pool.set_sacrifice_queue(1, SacrificeQueue::from_thresholds(vec![1.5]));
        assert_eq!(sacrifice_boosts(&pool.snapshot_columns()), vec![None, None]);

        *pool.tier_amount_mut(0, 4) = 1.0;
        let boosts = sacrifice_boosts(&pool.snapshot_columns());
        // f(1e20) = 2^2 against f(0) = 1
        assert!((boosts[0].unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(boosts[1], None);
    }

    #[test]
    fn test_dominance_is_strict() {
        let mut pool = pool();
        let snapshot = pool.snapshot_columns();
        assert!(dominates(&snapshot, 0, 1));
        assert!(!dominates(&snapshot, 1, 0));
        assert!(!dominates(&snapshot, 0, 0));

        // more purchases on the poorer line makes them incomparable
        *pool.purchase_count_mut(1, Item::Tier(2)) = 1;
        let snapshot = pool.snapshot_columns();
        assert!(!dominates(&snapshot, 0, 1));
        assert!(!dominates(&snapshot, 1, 0));
    }

    #[test]
    fn test_find_dominated_keeps_one_duplicate() {
        let mut pool = pool();
        pool.clone_line(0);
        let order = [2, 0, 1];
        let dominated = find_dominated(&pool.snapshot_columns(), &order);
        assert_eq!(dominated, vec![true, true, false]);
    }
}
