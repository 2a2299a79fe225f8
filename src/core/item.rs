//! Purchasable items.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Something a line can buy: the rate boost or one unit of a tier.
///
/// Column index 0 is the rate boost, index `t` is tier `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Item {
    RateBoost,
    Tier(u8),
}

impl Item {
    /// Column index of this item in the per-item pool columns.
    pub fn index(self) -> usize {
        match self {
            Item::RateBoost => 0,
            Item::Tier(tier) => tier as usize,
        }
    }

    /// Inverse of [`Item::index`].
    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            Item::RateBoost
        } else {
            Item::Tier(index as u8)
        }
    }

    /// Every item of a run with `tiers` active tiers, rate boost first.
    pub fn all(tiers: usize) -> impl Iterator<Item = Item> {
        (0..=tiers).map(Item::from_index)
    }

    pub fn is_tier(self) -> bool {
        matches!(self, Item::Tier(_))
    }

    /// How many units form the item's natural batch (a tier stack is 10).
    pub fn stack_size(self) -> u32 {
        match self {
            Item::RateBoost => 1,
            Item::Tier(_) => crate::core::balance::MILESTONE_EVERY,
        }
    }

    /// Label used in reports.
    pub fn label(self) -> String {
        match self {
            Item::RateBoost => "rate boost".to_string(),
            Item::Tier(tier) => format!("tier {tier}"),
        }
    }

    /// Short code used in fixed priority names (`T` for the rate boost).
    pub fn code(self) -> char {
        match self {
            Item::RateBoost => 'T',
            Item::Tier(tier) => char::from_digit(tier as u32, 10).unwrap_or('?'),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
