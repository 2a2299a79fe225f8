//! The `ACTIONS` section: one line per history record.

use super::cached_regex;
use super::time::format_time;
use crate::core::balance::MAX_TIERS;
use crate::core::item::Item;
use crate::error::ReportParseError;
use crate::pool::{Action, ActionHistory};
use regex::Regex;
use std::sync::OnceLock;

pub const SECTION: &str = "ACTIONS";

static PURCHASE_LINE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static SACRIFICE_LINE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

const PURCHASE_PATTERN: &str = r"^item: (?:(rate boost)|tier (\d+)), amount:\s*(\d+), total:\s*(\d+), cost_one: [^,]+, cost_amount: [^,]+, cost_stack: [^,]+, time: \d+:\d{2}\.\d{3}$";
const SACRIFICE_PATTERN: &str = r"^sacrifice: ([^,]+), time: \d+:\d{2}\.\d{3}$";

/// Render a history as report lines.
///
/// Purchase lines carry the running total for their item; the stack price is
/// the unit price times the item's natural batch size.
pub fn format_actions(history: &ActionHistory, tick_duration: f64) -> String {
    let mut totals = [0u32; MAX_TIERS + 1];
    let mut lines = Vec::with_capacity(history.len());
    for record in history.records() {
        let time = format_time(record.tick as f64 * tick_duration);
        match record.action {
            Action::Sacrifice => {
                lines.push(format!("sacrifice: {}, time: {time}", record.value));
            }
            Action::Purchase(item) => {
                let total = &mut totals[item.index().min(MAX_TIERS)];
                *total += record.repeat;
                let price = record.value;
                lines.push(format!(
                    "item: {}, amount: {:2}, total: {:3}, cost_one: {:.0e}, cost_amount: {:.0e}, cost_stack: {:.0e}, time: {time}",
                    item.label(),
                    record.repeat,
                    total,
                    price,
                    price * record.repeat as f64,
                    price * item.stack_size() as f64,
                ));
            }
        }
    }
    lines.join("\n")
}

/// Purchases and sacrifices recovered from an `ACTIONS` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedActions {
    /// One entry per unit bought, in order.
    pub purchases: Vec<Item>,
    /// Realized boosts, in order.
    pub sacrifices: Vec<f64>,
}

impl ParsedActions {
    /// Parse section text. Blank lines are ignored; any other line that is
    /// neither a purchase nor a sacrifice rejects the whole section.
    pub fn parse(text: &str) -> Result<Self, ReportParseError> {
        let purchase_line = cached_regex(&PURCHASE_LINE, PURCHASE_PATTERN)?;
        let sacrifice_line = cached_regex(&SACRIFICE_LINE, SACRIFICE_PATTERN)?;
        let mut parsed = ParsedActions::default();

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let malformed = || ReportParseError::MalformedLine {
                section: SECTION,
                line: line.to_string(),
            };

            if let Some(caps) = purchase_line.captures(line) {
                let item = match caps.get(2) {
                    None => Item::RateBoost,
                    Some(tier) => {
                        let tier: u8 = tier.as_str().parse().map_err(|_| malformed())?;
                        if tier == 0 || tier as usize > MAX_TIERS {
                            return Err(malformed());
                        }
                        Item::Tier(tier)
                    }
                };
                let amount: usize = caps[3].parse().map_err(|_| malformed())?;
                if amount == 0 {
                    return Err(malformed());
                }
                parsed.purchases.extend(std::iter::repeat(item).take(amount));
            } else if let Some(caps) = sacrifice_line.captures(line) {
                let boost: f64 = caps[1].trim().parse().map_err(|_| malformed())?;
                if !boost.is_finite() || boost < 1.0 {
                    return Err(malformed());
                }
                parsed.sacrifices.push(boost);
            } else {
                return Err(malformed());
            }
        }
        Ok(parsed)
    }
}
