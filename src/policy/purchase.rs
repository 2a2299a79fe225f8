//! Purchase policies: which items a line may buy next, best first.

use super::PurchasePolicy;
use crate::core::balance::{
    HEURISTIC_ACCURACY_MULTIPLIER, HEURISTIC_ALWAYS_BUY_MULTIPLIER,
    HEURISTIC_LAST_TIER_HIGH_MULTIPLIER, HEURISTIC_LAST_TIER_LOW_MULTIPLIER,
};
use crate::core::item::Item;
use crate::core::ruleset::Ruleset;
use crate::error::ReportParseError;
use crate::pool::{LineView, PurchaseQueue};
use crate::report::Report;

/// Candidate purchase with its unit and stack price.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    item: Item,
    cost: f64,
    stack_cost: f64,
}

impl Candidate {
    fn of(line: &LineView<'_>, item: Item) -> Self {
        let cost = line.cost(item);
        Self {
            item,
            cost,
            stack_cost: cost * item.stack_size() as f64,
        }
    }
}

fn sort_by_cost(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

/// Highest tier a line may buy next: the highest owned tier, or the one
/// above it once the owned one has a full stack.
fn frontier_tier(line: &LineView<'_>, rules: &Ruleset) -> u8 {
    let mut last = line.highest_owned_tier().unwrap_or(1);
    if line.purchase_count(Item::Tier(last)) >= rules.milestone_every && (last as usize) < rules.tiers
    {
        last += 1;
    }
    last
}

/// Keep the candidates whose stack price is within the grouping factor of
/// the cheapest one. Returns the cheapest stack price.
fn cheapest_stack_group(candidates: &mut Vec<Candidate>) -> f64 {
    let cheapest = candidates
        .iter()
        .map(|c| c.stack_cost)
        .fold(f64::INFINITY, f64::min);
    candidates.retain(|c| c.stack_cost <= cheapest * HEURISTIC_ACCURACY_MULTIPLIER);
    cheapest
}

// =============================================================================
// Exhaustive
// =============================================================================

/// Every item is admissible, ordered by current price.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveSearch;

impl PurchasePolicy for ExhaustiveSearch {
    fn name(&self) -> &str {
        "ExhaustiveSearch"
    }

    fn short_name(&self) -> &str {
        "exhaustive"
    }

    fn description(&self) -> Vec<String> {
        vec!["Exhaustive search: every item is a candidate, cheapest first.".to_string()]
    }

    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
        let mut candidates: Vec<Candidate> = Item::all(rules.tiers)
            .map(|item| Candidate::of(line, item))
            .collect();
        sort_by_cost(&mut candidates);
        candidates.into_iter().map(|c| c.item).collect()
    }
}

// =============================================================================
// Heuristic
// =============================================================================

/// Search restricted by stack-price grouping rules.
///
/// 1. Tier 1 is bought first.
/// 2. Anything costing at most a thousandth of the currency is bought outright.
/// 3. Past the first stack, a tier with a partial stack is completed first.
/// 4. Otherwise items are grouped by stack price; the frontier tier also
///    joins a group one price step below its own and wins outright when
///    far cheaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSearch;

pub(crate) fn heuristic_queue(line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
    let first = Item::Tier(1);
    if line.purchase_count(first) == 0 {
        return PurchaseQueue::single(first);
    }

    let currency = line.currency();
    if let Some(item) = Item::all(rules.tiers)
        .find(|&item| line.cost(item) * HEURISTIC_ALWAYS_BUY_MULTIPLIER <= currency)
    {
        return PurchaseQueue::single(item);
    }

    let every = rules.milestone_every;
    if let Some(tier) = (1..=rules.tiers as u8).find(|&tier| {
        let bought = line.purchase_count(Item::Tier(tier));
        bought > every && bought % every != 0
    }) {
        return PurchaseQueue::single(Item::Tier(tier));
    }

    let last = frontier_tier(line, rules);
    let mut candidates: Vec<Candidate> = std::iter::once(Item::RateBoost)
        .chain((1..last).map(Item::Tier))
        .map(|item| Candidate::of(line, item))
        .collect();
    let cheapest = cheapest_stack_group(&mut candidates);

    let frontier = Candidate::of(line, Item::Tier(last));
    if frontier.stack_cost < cheapest * HEURISTIC_LAST_TIER_LOW_MULTIPLIER {
        return PurchaseQueue::single(frontier.item);
    }
    if frontier.stack_cost < cheapest * HEURISTIC_LAST_TIER_HIGH_MULTIPLIER {
        candidates.push(frontier);
    }

    sort_by_cost(&mut candidates);
    candidates.into_iter().map(|c| c.item).collect()
}

impl PurchasePolicy for HeuristicSearch {
    fn name(&self) -> &str {
        "HeuristicSearch"
    }

    fn short_name(&self) -> &str {
        "heuristic"
    }

    fn description(&self) -> Vec<String> {
        vec![
            "Heuristic search with stack-price grouping.".to_string(),
            "1. If tier 1 is not bought, buy it.".to_string(),
            "2. If anything costs at most 1/1000 of the currency, buy it.".to_string(),
            "3. If a tier has more than 10 purchases and a partial stack, buy it.".to_string(),
            "4. Buy in groups of equal stack price; the frontier tier may also join the group one step cheaper.".to_string(),
        ]
    }

    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
        heuristic_queue(line, rules)
    }
}

// =============================================================================
// Fixed priority
// =============================================================================

/// Tie-break order among the filtered candidates of a fixed policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedOrder {
    /// Rate boost, then tiers ascending.
    RateFirst,
    /// Tiers 1 and 2, then the rate boost, then the remaining tiers.
    LowTiersFirst,
    /// Rate boost, then tiers descending.
    RateThenHighTiers,
    /// Tiers descending, then the rate boost.
    HighTiersFirst,
    /// Tiers ascending, then the rate boost.
    RateLast,
}

impl FixedOrder {
    pub fn all() -> [FixedOrder; 5] {
        [
            FixedOrder::RateFirst,
            FixedOrder::LowTiersFirst,
            FixedOrder::RateThenHighTiers,
            FixedOrder::HighTiersFirst,
            FixedOrder::RateLast,
        ]
    }

    /// Priority string, `T` standing for the rate boost.
    pub fn code(self) -> &'static str {
        match self {
            FixedOrder::RateFirst => "T12345678",
            FixedOrder::LowTiersFirst => "12T345678",
            FixedOrder::RateThenHighTiers => "T87654321",
            FixedOrder::HighTiersFirst => "87654321T",
            FixedOrder::RateLast => "12345678T",
        }
    }

    /// Pick one item from a non-empty filtered list ordered rate boost first,
    /// then tiers ascending.
    fn choose(self, filtered: &[Item]) -> Option<Item> {
        let first = filtered.first().copied();
        let last = filtered.last().copied();
        match self {
            FixedOrder::RateFirst => first,
            FixedOrder::LowTiersFirst => [Item::Tier(1), Item::Tier(2)]
                .into_iter()
                .find(|item| filtered.contains(item))
                .or(first),
            FixedOrder::RateThenHighTiers => {
                if filtered.contains(&Item::RateBoost) {
                    Some(Item::RateBoost)
                } else {
                    last
                }
            }
            FixedOrder::HighTiersFirst => last,
            FixedOrder::RateLast => {
                if filtered.first() != Some(&Item::RateBoost) {
                    first
                } else {
                    filtered.get(1).copied().or(first)
                }
            }
        }
    }
}

/// Shared filter of every fixed policy.
///
/// 1. If tier 1 is not bought, buy it.
/// 2. If a tier has a partial stack, complete it.
/// 3. Keep only the cheapest stack price group.
/// 4. If the last kept item was never bought, buy it.
/// 5. If the top tier is kept and one more stack reaches the win threshold, buy it.
///
/// Returns the remaining candidates ordered rate boost first, then tiers.
pub(crate) fn filter_fixed_candidates(line: &LineView<'_>, rules: &Ruleset) -> Vec<Item> {
    let first = Item::Tier(1);
    if line.purchase_count(first) == 0 {
        return vec![first];
    }

    let every = rules.milestone_every;
    if let Some(tier) =
        (1..=rules.tiers as u8).find(|&tier| line.purchase_count(Item::Tier(tier)) % every != 0)
    {
        return vec![Item::Tier(tier)];
    }

    let last = frontier_tier(line, rules);
    let mut candidates: Vec<Candidate> = std::iter::once(Item::RateBoost)
        .chain((1..=last).map(Item::Tier))
        .map(|item| Candidate::of(line, item))
        .collect();
    cheapest_stack_group(&mut candidates);

    if let Some(considered) = candidates.last().map(|c| c.item) {
        let bought = line.purchase_count(considered);
        if bought == 0 {
            return vec![considered];
        }
        if considered.index() == rules.tiers && bought + every >= rules.win_threshold {
            return vec![considered];
        }
    }
    candidates.into_iter().map(|c| c.item).collect()
}

/// Non-branching policy buying by a fixed priority among filtered candidates.
#[derive(Debug, Clone, Copy)]
pub struct FixedPriority {
    order: FixedOrder,
}

impl FixedPriority {
    pub fn new(order: FixedOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> FixedOrder {
        self.order
    }
}

impl PurchasePolicy for FixedPriority {
    fn name(&self) -> &str {
        self.order.code()
    }

    fn short_name(&self) -> &str {
        self.order.code()
    }

    fn description(&self) -> Vec<String> {
        vec![
            format!("Fixed priority {}", self.order.code()),
            "1. If tier 1 is not bought, buy it.".to_string(),
            "2. If a tier has a partial stack, complete it.".to_string(),
            "3. Consider only the cheapest stack price group.".to_string(),
            "4. If the last considered item was never bought, buy it.".to_string(),
            "5. If one more top tier stack wins, buy it.".to_string(),
            format!("6. Otherwise choose by priority {}.", self.order.code()),
        ]
    }

    fn is_fixed_order(&self) -> bool {
        true
    }

    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
        let filtered = filter_fixed_candidates(line, rules);
        self.order
            .choose(&filtered)
            .map(PurchaseQueue::single)
            .unwrap_or_default()
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Follows a recorded purchase list, then falls back to the heuristic.
///
/// A line's position in the list is its total number of purchases.
#[derive(Debug, Clone, Default)]
pub struct ReplayPurchases {
    purchases: Vec<Item>,
}

impl ReplayPurchases {
    pub fn new(purchases: Vec<Item>) -> Self {
        Self { purchases }
    }

    /// Purchases from the `ACTIONS` section of a saved report.
    pub fn from_report(report: &Report) -> Result<Self, ReportParseError> {
        Ok(Self::new(report.parsed_actions()?.purchases))
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }
}

impl PurchasePolicy for ReplayPurchases {
    fn name(&self) -> &str {
        "ReplayPurchases"
    }

    fn short_name(&self) -> &str {
        "replay"
    }

    fn description(&self) -> Vec<String> {
        vec![format!(
            "Replays {} recorded purchases, then searches heuristically.",
            self.purchases.len()
        )]
    }

    fn next_purchases(&self, line: &LineView<'_>, rules: &Ruleset) -> PurchaseQueue {
        let position = line.total_purchases() as usize;
        match self.purchases.get(position) {
            Some(&item) => PurchaseQueue::single(item),
            None => heuristic_queue(line, rules),
        }
    }
}
