//! Growable multi-line state store.
//!
//! Every live line is stored across index-aligned columns. Live lines always
//! occupy the prefix `[0, len)`. Indices are only meaningful until the next
//! [`StatePool::compact`] or [`StatePool::reorder`]; callers re-read `len()`
//! after either.

pub mod history;
pub mod queue;

pub use history::{Action, ActionHistory, ActionRecord};
pub use queue::{PurchaseQueue, SacrificeQueue};

use crate::core::balance::POOL_BLOCK_LINES;
use crate::core::item::Item;
use std::cmp::Ordering;

/// Column used to order lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Currency,
    Tier(u8),
    Sacrificed,
}

/// Column-oriented store of candidate timelines.
#[derive(Debug, Clone)]
pub struct StatePool {
    tiers: usize,
    len: usize,
    capacity: usize,
    block: usize,
    created: u64,
    currency: Vec<f64>,
    /// Stride `tiers`; slot `t - 1` holds tier `t`.
    tier_amounts: Vec<f64>,
    sacrificed: Vec<f64>,
    /// Stride `tiers + 1`; slot 0 is the rate boost.
    purchase_counts: Vec<u32>,
    costs: Vec<f64>,
    multipliers: Vec<f64>,
    histories: Vec<ActionHistory>,
    purchase_queues: Vec<PurchaseQueue>,
    sacrifice_queues: Vec<SacrificeQueue>,
}

/// Mutable borrow of the columns the clock advances.
pub struct TickColumns<'a> {
    pub tiers: usize,
    pub len: usize,
    pub currency: &'a mut [f64],
    pub tier_amounts: &'a mut [f64],
    pub multipliers: &'a [f64],
}

/// Read-only borrow of the columns batch queries look at.
#[derive(Clone, Copy)]
pub struct PoolSnapshot<'a> {
    pub tiers: usize,
    pub len: usize,
    pub currency: &'a [f64],
    pub tier_amounts: &'a [f64],
    pub sacrificed: &'a [f64],
    pub purchase_counts: &'a [u32],
    pub costs: &'a [f64],
    pub purchase_queues: &'a [PurchaseQueue],
    pub sacrifice_queues: &'a [SacrificeQueue],
}

/// Owned copy of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSnapshot {
    pub currency: f64,
    pub tier_amounts: Vec<f64>,
    pub sacrificed: f64,
    pub purchase_counts: Vec<u32>,
    pub costs: Vec<f64>,
    pub multipliers: Vec<f64>,
    pub history: ActionHistory,
    pub purchase_queue: PurchaseQueue,
    pub sacrifice_queue: SacrificeQueue,
}

impl StatePool {
    /// Empty pool for `tiers` active tiers with room for `initial_capacity` lines.
    pub fn allocate(tiers: usize, initial_capacity: usize) -> Self {
        Self::with_block(tiers, initial_capacity, POOL_BLOCK_LINES)
    }

    /// Like [`StatePool::allocate`] with a custom growth block.
    pub fn with_block(tiers: usize, initial_capacity: usize, block: usize) -> Self {
        let width = tiers + 1;
        let capacity = initial_capacity.max(1);
        Self {
            tiers,
            len: 0,
            capacity,
            block: block.max(1),
            created: 0,
            currency: Vec::with_capacity(capacity),
            tier_amounts: Vec::with_capacity(capacity * tiers),
            sacrificed: Vec::with_capacity(capacity),
            purchase_counts: Vec::with_capacity(capacity * width),
            costs: Vec::with_capacity(capacity * width),
            multipliers: Vec::with_capacity(capacity * width),
            histories: Vec::with_capacity(capacity),
            purchase_queues: Vec::with_capacity(capacity),
            sacrifice_queues: Vec::with_capacity(capacity),
        }
    }

    pub fn tiers(&self) -> usize {
        self.tiers
    }

    fn width(&self) -> usize {
        self.tiers + 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines ever written into this pool, clones included.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Add a fresh line: no amounts, no purchases, empty history and queues.
    pub fn push_line(&mut self, currency: f64, costs: &[f64], multipliers: &[f64]) -> usize {
        assert_eq!(costs.len(), self.width(), "cost row width");
        assert_eq!(multipliers.len(), self.width(), "multiplier row width");
        self.ensure_room();
        let line = self.len;
        self.currency.push(currency);
        self.tier_amounts
            .extend(std::iter::repeat(0.0).take(self.tiers));
        self.sacrificed.push(0.0);
        self.purchase_counts
            .extend(std::iter::repeat(0).take(self.width()));
        self.costs.extend_from_slice(costs);
        self.multipliers.extend_from_slice(multipliers);
        self.histories.push(ActionHistory::new());
        self.purchase_queues.push(PurchaseQueue::default());
        self.sacrifice_queues.push(SacrificeQueue::empty());
        self.len += 1;
        self.created += 1;
        line
    }

    /// Append an exact copy of `source` and return its index.
    ///
    /// Grows capacity by one block first when full. Existing indices keep
    /// their content.
    pub fn clone_line(&mut self, source: usize) -> usize {
        assert!(source < self.len, "clone of dead line {source}");
        self.ensure_room();
        let (tiers, width) = (self.tiers, self.width());
        let line = self.len;

        self.currency.push(self.currency[source]);
        self.tier_amounts
            .extend_from_within(source * tiers..(source + 1) * tiers);
        self.sacrificed.push(self.sacrificed[source]);
        self.purchase_counts
            .extend_from_within(source * width..(source + 1) * width);
        self.costs
            .extend_from_within(source * width..(source + 1) * width);
        self.multipliers
            .extend_from_within(source * width..(source + 1) * width);
        self.histories.push(self.histories[source].clone());
        self.purchase_queues.push(self.purchase_queues[source]);
        self.sacrifice_queues
            .push(self.sacrifice_queues[source].clone());

        self.len += 1;
        self.created += 1;
        line
    }

    fn ensure_room(&mut self) {
        if self.len < self.capacity {
            return;
        }
        self.capacity += self.block;
        let extra = self.capacity - self.len;
        let (tiers, width) = (self.tiers, self.width());
        self.currency.reserve_exact(extra);
        self.tier_amounts.reserve_exact(extra * tiers);
        self.sacrificed.reserve_exact(extra);
        self.purchase_counts.reserve_exact(extra * width);
        self.costs.reserve_exact(extra * width);
        self.multipliers.reserve_exact(extra * width);
        self.histories.reserve_exact(extra);
        self.purchase_queues.reserve_exact(extra);
        self.sacrifice_queues.reserve_exact(extra);
    }

    /// Drop every line whose mask entry is false.
    ///
    /// Dropped slots are refilled from the tail so kept lines end up in
    /// `[0, kept)`; their relative order is not preserved. Returns the new
    /// length.
    pub fn compact(&mut self, keep_mask: &[bool]) -> usize {
        assert_eq!(keep_mask.len(), self.len, "keep mask must cover every live line");
        let mut keep = keep_mask.to_vec();
        let mut front = 0;
        let mut back = self.len;
        loop {
            while front < back && keep[front] {
                front += 1;
            }
            while front < back && !keep[back - 1] {
                back -= 1;
            }
            if front >= back {
                break;
            }
            self.swap_lines(front, back - 1);
            keep.swap(front, back - 1);
            front += 1;
            back -= 1;
        }
        self.truncate(front);
        front
    }

    fn swap_lines(&mut self, a: usize, b: usize) {
        let (tiers, width) = (self.tiers, self.width());
        self.currency.swap(a, b);
        self.sacrificed.swap(a, b);
        for k in 0..tiers {
            self.tier_amounts.swap(a * tiers + k, b * tiers + k);
        }
        for k in 0..width {
            self.purchase_counts.swap(a * width + k, b * width + k);
            self.costs.swap(a * width + k, b * width + k);
            self.multipliers.swap(a * width + k, b * width + k);
        }
        self.histories.swap(a, b);
        self.purchase_queues.swap(a, b);
        self.sacrifice_queues.swap(a, b);
    }

    fn truncate(&mut self, len: usize) {
        let (tiers, width) = (self.tiers, self.width());
        self.currency.truncate(len);
        self.tier_amounts.truncate(len * tiers);
        self.sacrificed.truncate(len);
        self.purchase_counts.truncate(len * width);
        self.costs.truncate(len * width);
        self.multipliers.truncate(len * width);
        self.histories.truncate(len);
        self.purchase_queues.truncate(len);
        self.sacrifice_queues.truncate(len);
        self.len = len;
    }

    /// Live line indices ordered by `key`. Ties keep index order.
    pub fn sorted_indices(&self, key: SortKey, descending: bool) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len).collect();
        order.sort_by(|&a, &b| {
            let ord = self
                .key_value(a, key)
                .partial_cmp(&self.key_value(b, key))
                .unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        order
    }

    fn key_value(&self, line: usize, key: SortKey) -> f64 {
        match key {
            SortKey::Currency => self.currency[line],
            SortKey::Tier(tier) => self.tier_amount(line, tier),
            SortKey::Sacrificed => self.sacrificed[line],
        }
    }

    /// Permute every column consistently so lines are ordered by `key`.
    pub fn reorder(&mut self, key: SortKey, descending: bool) {
        let order = self.sorted_indices(key, descending);
        let (tiers, width) = (self.tiers, self.width());
        permute_rows(&mut self.currency, &order, 1);
        permute_rows(&mut self.tier_amounts, &order, tiers);
        permute_rows(&mut self.sacrificed, &order, 1);
        permute_rows(&mut self.purchase_counts, &order, width);
        permute_rows(&mut self.costs, &order, width);
        permute_rows(&mut self.multipliers, &order, width);
        permute_owned(&mut self.histories, &order);
        permute_rows(&mut self.purchase_queues, &order, 1);
        permute_owned(&mut self.sacrifice_queues, &order);
    }

    // ── Line accessors ─────────────────────────────────────────────────

    pub fn view(&self, line: usize) -> LineView<'_> {
        assert!(line < self.len, "line {line} is not live");
        LineView { pool: self, line }
    }

    pub fn currency(&self, line: usize) -> f64 {
        self.currency[line]
    }

    pub fn set_currency(&mut self, line: usize, value: f64) {
        self.currency[line] = value;
    }

    pub fn tier_amount(&self, line: usize, tier: u8) -> f64 {
        self.tier_amounts[line * self.tiers + tier as usize - 1]
    }

    pub fn tier_amount_mut(&mut self, line: usize, tier: u8) -> &mut f64 {
        &mut self.tier_amounts[line * self.tiers + tier as usize - 1]
    }

    pub fn sacrificed(&self, line: usize) -> f64 {
        self.sacrificed[line]
    }

    pub fn sacrificed_mut(&mut self, line: usize) -> &mut f64 {
        &mut self.sacrificed[line]
    }

    pub fn purchase_count(&self, line: usize, item: Item) -> u32 {
        self.purchase_counts[line * self.width() + item.index()]
    }

    pub fn purchase_count_mut(&mut self, line: usize, item: Item) -> &mut u32 {
        let width = self.width();
        &mut self.purchase_counts[line * width + item.index()]
    }

    pub fn purchase_counts(&self, line: usize) -> &[u32] {
        let width = self.width();
        &self.purchase_counts[line * width..(line + 1) * width]
    }

    pub fn cost(&self, line: usize, item: Item) -> f64 {
        self.costs[line * self.width() + item.index()]
    }

    pub fn cost_mut(&mut self, line: usize, item: Item) -> &mut f64 {
        let width = self.width();
        &mut self.costs[line * width + item.index()]
    }

    pub fn multiplier(&self, line: usize, item: Item) -> f64 {
        self.multipliers[line * self.width() + item.index()]
    }

    pub fn multiplier_mut(&mut self, line: usize, item: Item) -> &mut f64 {
        let width = self.width();
        &mut self.multipliers[line * width + item.index()]
    }

    /// Tier multipliers `1..=tiers` of a line.
    pub fn tier_multipliers_mut(&mut self, line: usize) -> &mut [f64] {
        let width = self.width();
        &mut self.multipliers[line * width + 1..(line + 1) * width]
    }

    pub fn history(&self, line: usize) -> &ActionHistory {
        &self.histories[line]
    }

    pub fn history_mut(&mut self, line: usize) -> &mut ActionHistory {
        &mut self.histories[line]
    }

    pub fn purchase_queue(&self, line: usize) -> PurchaseQueue {
        self.purchase_queues[line]
    }

    pub fn set_purchase_queue(&mut self, line: usize, queue: PurchaseQueue) {
        self.purchase_queues[line] = queue;
    }

    pub fn sacrifice_queue(&self, line: usize) -> &SacrificeQueue {
        &self.sacrifice_queues[line]
    }

    pub fn set_sacrifice_queue(&mut self, line: usize, queue: SacrificeQueue) {
        self.sacrifice_queues[line] = queue;
    }

    pub fn snapshot(&self, line: usize) -> LineSnapshot {
        let (tiers, width) = (self.tiers, self.width());
        LineSnapshot {
            currency: self.currency[line],
            tier_amounts: self.tier_amounts[line * tiers..(line + 1) * tiers].to_vec(),
            sacrificed: self.sacrificed[line],
            purchase_counts: self.purchase_counts(line).to_vec(),
            costs: self.costs[line * width..(line + 1) * width].to_vec(),
            multipliers: self.multipliers[line * width..(line + 1) * width].to_vec(),
            history: self.histories[line].clone(),
            purchase_queue: self.purchase_queues[line],
            sacrifice_queue: self.sacrifice_queues[line].clone(),
        }
    }

    // ── Batch access ───────────────────────────────────────────────────

    pub fn tick_columns(&mut self) -> TickColumns<'_> {
        TickColumns {
            tiers: self.tiers,
            len: self.len,
            currency: &mut self.currency,
            tier_amounts: &mut self.tier_amounts,
            multipliers: &self.multipliers,
        }
    }

    pub fn snapshot_columns(&self) -> PoolSnapshot<'_> {
        PoolSnapshot {
            tiers: self.tiers,
            len: self.len,
            currency: &self.currency,
            tier_amounts: &self.tier_amounts,
            sacrificed: &self.sacrificed,
            purchase_counts: &self.purchase_counts,
            costs: &self.costs,
            purchase_queues: &self.purchase_queues,
            sacrifice_queues: &self.sacrifice_queues,
        }
    }
}

fn permute_rows<T: Copy>(column: &mut Vec<T>, order: &[usize], stride: usize) {
    let mut sorted = Vec::with_capacity(column.capacity());
    for &src in order {
        sorted.extend_from_slice(&column[src * stride..(src + 1) * stride]);
    }
    *column = sorted;
}

fn permute_owned<T: Default>(column: &mut Vec<T>, order: &[usize]) {
    let mut old = std::mem::take(column);
    column.reserve_exact(old.capacity());
    for &src in order {
        column.push(std::mem::take(&mut old[src]));
    }
}

/// Borrowed read-only view of one line, handed to decision policies.
#[derive(Clone, Copy)]
pub struct LineView<'a> {
    pool: &'a StatePool,
    line: usize,
}

impl<'a> LineView<'a> {
    pub fn index(&self) -> usize {
        self.line
    }

    pub fn tiers(&self) -> usize {
        self.pool.tiers
    }

    pub fn currency(&self) -> f64 {
        self.pool.currency(self.line)
    }

    pub fn tier_amount(&self, tier: u8) -> f64 {
        self.pool.tier_amount(self.line, tier)
    }

    pub fn sacrificed(&self) -> f64 {
        self.pool.sacrificed(self.line)
    }

    pub fn purchase_count(&self, item: Item) -> u32 {
        self.pool.purchase_count(self.line, item)
    }

    /// Units bought across every item.
    pub fn total_purchases(&self) -> u32 {
        self.pool.purchase_counts(self.line).iter().sum()
    }

    pub fn cost(&self, item: Item) -> f64 {
        self.pool.cost(self.line, item)
    }

    pub fn multiplier(&self, item: Item) -> f64 {
        self.pool.multiplier(self.line, item)
    }

    pub fn history(&self) -> &'a ActionHistory {
        self.pool.history(self.line)
    }

    /// Highest tier with at least one purchase, if any.
    pub fn highest_owned_tier(&self) -> Option<u8> {
        (1..=self.pool.tiers as u8)
            .rev()
            .find(|&tier| self.purchase_count(Item::Tier(tier)) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with_lines(n: usize) -> StatePool {
        let mut pool = StatePool::with_block(4, 2, 2);
        let costs = [1e3, 10.0, 100.0, 1e4, 1e6];
        let multipliers = [1.0, 1.0, 0.1, 0.1, 0.1];
        for i in 0..n {
            let line = pool.push_line(i as f64, &costs, &multipliers);
            *pool.tier_amount_mut(line, 1) = (i * 10) as f64;
        }
        pool
    }

    #[test]
    fn test_clone_grows_by_block_and_copies() {
        let mut pool = pool_with_lines(2);
        assert_eq!(pool.capacity(), 2);
        let copy = pool.clone_line(1);
        assert_eq!(copy, 2);
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.snapshot(copy), pool.snapshot(1));
        assert_eq!(pool.created(), 3);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut pool = pool_with_lines(1);
        pool.history_mut(0).record_purchase(Item::Tier(1), 10.0, 0);
        let copy = pool.clone_line(0);
        pool.set_currency(copy, 99.0);
        pool.history_mut(copy).record_sacrifice(2.0, 1);
        *pool.purchase_count_mut(0, Item::Tier(2)) += 1;
        assert_eq!(pool.currency(0), 0.0);
        assert_eq!(pool.history(0).len(), 1);
        assert_eq!(pool.purchase_count(copy, Item::Tier(2)), 0);
    }

    #[test]
    fn test_compact_keeps_prefix() {
        let mut pool = pool_with_lines(6);
        let kept = pool.compact(&[false, true, false, true, true, false]);
        assert_eq!(kept, 3);
        assert_eq!(pool.len(), 3);
        let mut currencies: Vec<f64> = (0..3).map(|l| pool.currency(l)).collect();
        currencies.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(currencies, vec![1.0, 3.0, 4.0]);
        for line in 0..3 {
            assert_eq!(pool.tier_amount(line, 1), pool.currency(line) * 10.0);
        }
    }

    #[test]
    fn test_compact_edge_masks() {
        let mut pool = pool_with_lines(3);
        assert_eq!(pool.compact(&[true, true, true]), 3);
        assert_eq!(pool.compact(&[false, false, false]), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_reorder_descending() {
        let mut pool = pool_with_lines(4);
        pool.reorder(SortKey::Tier(1), true);
        let amounts: Vec<f64> = (0..4).map(|l| pool.tier_amount(l, 1)).collect();
        assert_eq!(amounts, vec![30.0, 20.0, 10.0, 0.0]);
        assert_eq!(pool.currency(0), 3.0);
    }

    #[test]
    fn test_highest_owned_tier() {
        let mut pool = pool_with_lines(1);
        assert_eq!(pool.view(0).highest_owned_tier(), None);
        *pool.purchase_count_mut(0, Item::Tier(3)) = 1;
        *pool.purchase_count_mut(0, Item::Tier(1)) = 5;
        assert_eq!(pool.view(0).highest_owned_tier(), Some(3));
        assert_eq!(pool.view(0).total_purchases(), 6);
    }
}
