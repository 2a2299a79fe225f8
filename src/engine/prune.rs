//! Dominance pruning of the state pool.

use super::batch;
use crate::pool::{SortKey, StatePool};

/// Shrinks a pool to lines no earlier-ranked line covers.
///
/// Lines are ranked by tier 1 amount, largest first, so a covering line
/// usually sits before the lines it covers. Coverage compares the currency,
/// every tier amount, the sacrificed amount and every purchase count; a line
/// covered by another can never win sooner than it. Pairs in the wrong
/// rank order are not checked, which keeps the result a heuristic frontier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DominancePruner;

impl DominancePruner {
    pub fn new() -> Self {
        Self
    }

    /// Compact the pool to its frontier and return how many lines were removed.
    pub fn prune(&self, pool: &mut StatePool) -> usize {
        let before = pool.len();
        if before < 2 {
            return 0;
        }
        let order = pool.sorted_indices(SortKey::Tier(1), true);
        let dominated = batch::find_dominated(&pool.snapshot_columns(), &order);
        let keep: Vec<bool> = dominated.iter().map(|covered| !covered).collect();
        before - pool.compact(&keep)
    }
}
