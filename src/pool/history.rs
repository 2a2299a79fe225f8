//! Run-length encoded action history of a line.

use crate::core::item::Item;
use serde::{Deserialize, Serialize};

/// What a history record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Purchase(Item),
    Sacrifice,
}

/// One run of identical actions.
///
/// `value` is the unit price for purchases and the realized boost for
/// sacrifices; `tick` is the tick of the latest action merged into the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    pub repeat: u32,
    pub value: f64,
    pub tick: u64,
}

/// Append-only ordered history.
///
/// Consecutive purchases of the same item at the same unit price merge into
/// one record. Sacrifices never merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionHistory {
    records: Vec<ActionRecord>,
}

impl ActionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ActionRecord>) -> Self {
        Self { records }
    }

    pub fn record_purchase(&mut self, item: Item, price: f64, tick: u64) {
        if let Some(last) = self.records.last_mut() {
            if last.action == Action::Purchase(item) && last.value == price {
                last.repeat += 1;
                last.tick = tick;
                return;
            }
        }
        self.records.push(ActionRecord {
            action: Action::Purchase(item),
            repeat: 1,
            value: price,
            tick,
        });
    }

    pub fn record_sacrifice(&mut self, boost: f64, tick: u64) {
        self.records.push(ActionRecord {
            action: Action::Sacrifice,
            repeat: 1,
            value: boost,
            tick,
        });
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Purchases in order, one entry per unit bought.
    pub fn expanded_purchases(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for record in &self.records {
            if let Action::Purchase(item) = record.action {
                items.extend(std::iter::repeat(item).take(record.repeat as usize));
            }
        }
        items
    }

    /// Realized sacrifice boosts in order.
    pub fn sacrifice_boosts(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter(|r| r.action == Action::Sacrifice)
            .map(|r| r.value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_item_same_price_merges() {
        let mut history = ActionHistory::new();
        history.record_purchase(Item::Tier(1), 10.0, 0);
        history.record_purchase(Item::Tier(1), 10.0, 4);
        assert_eq!(history.len(), 1);
        assert_eq!(history.records()[0].repeat, 2);
        assert_eq!(history.records()[0].tick, 4);
    }

    #[test]
    fn test_price_change_starts_new_record() {
        let mut history = ActionHistory::new();
        history.record_purchase(Item::Tier(1), 10.0, 0);
        history.record_purchase(Item::Tier(1), 1e4, 1);
        history.record_purchase(Item::RateBoost, 1e4, 2);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_sacrifices_never_merge() {
        let mut history = ActionHistory::new();
        history.record_sacrifice(1.5, 3);
        history.record_sacrifice(1.5, 3);
        assert_eq!(history.len(), 2);
        assert_eq!(history.sacrifice_boosts(), vec![1.5, 1.5]);
    }

    #[test]
    fn test_expanded_purchases_skip_sacrifices() {
        let mut history = ActionHistory::new();
        history.record_purchase(Item::Tier(1), 10.0, 0);
        history.record_purchase(Item::Tier(1), 10.0, 1);
        history.record_sacrifice(2.0, 2);
        history.record_purchase(Item::RateBoost, 1e3, 3);
        assert_eq!(
            history.expanded_purchases(),
            vec![Item::Tier(1), Item::Tier(1), Item::RateBoost]
        );
    }
}
