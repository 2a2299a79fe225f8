//! Pending action queues kept per line.

use crate::core::balance::MAX_TIERS;
use crate::core::item::Item;
use std::sync::Arc;

const PURCHASE_QUEUE_CAPACITY: usize = MAX_TIERS + 1;

/// Admissible purchases, best first. Fixed capacity: one slot per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseQueue {
    items: [Item; PURCHASE_QUEUE_CAPACITY],
    len: u8,
}

impl Default for PurchaseQueue {
    fn default() -> Self {
        Self {
            items: [Item::RateBoost; PURCHASE_QUEUE_CAPACITY],
            len: 0,
        }
    }
}

impl PurchaseQueue {
    pub fn single(item: Item) -> Self {
        let mut queue = Self::default();
        queue.push(item);
        queue
    }

    /// Append an item. Items past the capacity are dropped.
    pub fn push(&mut self, item: Item) {
        let len = self.len as usize;
        debug_assert!(len < PURCHASE_QUEUE_CAPACITY, "purchase queue overflow");
        if len < PURCHASE_QUEUE_CAPACITY {
            self.items[len] = item;
            self.len += 1;
        }
    }

    pub fn head(&self) -> Option<Item> {
        self.as_slice().first().copied()
    }

    /// More than one option is queued, so buying the head forks the line.
    pub fn has_alternative(&self) -> bool {
        self.len > 1
    }

    /// The same queue with its head option removed.
    pub fn without_head(&self) -> Self {
        self.as_slice().iter().skip(1).copied().collect()
    }

    pub fn as_slice(&self) -> &[Item] {
        &self.items[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<Item> for PurchaseQueue {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut queue = Self::default();
        for item in iter {
            queue.push(item);
        }
        queue
    }
}

/// Ascending sacrifice boost thresholds.
///
/// The threshold ladder is shared between clones; a line only owns its
/// cursor. An exhausted queue never sacrifices.
#[derive(Debug, Clone, PartialEq)]
pub struct SacrificeQueue {
    thresholds: Arc<[f64]>,
    head: usize,
}

impl Default for SacrificeQueue {
    fn default() -> Self {
        Self::empty()
    }
}

impl SacrificeQueue {
    pub fn empty() -> Self {
        Self {
            thresholds: Arc::from(Vec::new()),
            head: 0,
        }
    }

    pub fn new(thresholds: Arc<[f64]>) -> Self {
        Self {
            thresholds,
            head: 0,
        }
    }

    pub fn from_thresholds(thresholds: Vec<f64>) -> Self {
        Self::new(Arc::from(thresholds))
    }

    pub fn head(&self) -> Option<f64> {
        self.remaining().first().copied()
    }

    pub fn remaining(&self) -> &[f64] {
        &self.thresholds[self.head..]
    }

    pub fn is_empty(&self) -> bool {
        self.remaining().is_empty()
    }

    /// Queue for a branch that declines a sacrifice of `boost`: every
    /// threshold the boost already meets is skipped. `None` when nothing
    /// larger is left to wait for.
    pub fn deferred(&self, boost: f64) -> Option<Self> {
        let met = self
            .remaining()
            .iter()
            .take_while(|threshold| boost >= **threshold)
            .count();
        if self.head + met >= self.thresholds.len() {
            return None;
        }
        Some(Self {
            thresholds: Arc::clone(&self.thresholds),
            head: self.head + met,
        })
    }
}
