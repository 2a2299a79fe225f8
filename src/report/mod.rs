//! Run reports.
//!
//! A report is UTF-8 text with labeled sections in fixed order, each
//! wrapped in `=== NAME ===` and `=== END NAME ===`:
//! - `GAME INFO`: JSON, see [`GameInfo`]
//! - `ACTIONS`: one line per history record, see [`actions`]
//! - `STRATEGY SEARCH INFO` for a single run or `ITERATIVE OPTIMIZATION INFO`
//!   for an optimization session: JSON
//!
//! The `ACTIONS` section parses back into the purchase and sacrifice lists
//! that seed replay policies.

pub mod actions;
pub mod sections;
pub mod store;
pub mod time;

pub use actions::{format_actions, ParsedActions};
pub use sections::{
    BuildStamp, GameInfo, IterationInfo, IterativeOptimizationInfo, StrategySearchInfo,
    TimeBreakdown,
};
pub use store::{load_report, ReportStore, StrategySummary};
pub use time::{format_share, format_time, parse_time, sum_times};

use crate::engine::RunResult;
use crate::error::ReportParseError;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

pub const GAME_INFO: &str = "GAME INFO";
pub const ACTIONS: &str = actions::SECTION;
pub const STRATEGY_SEARCH_INFO: &str = "STRATEGY SEARCH INFO";
pub const ITERATIVE_OPTIMIZATION_INFO: &str = "ITERATIVE OPTIMIZATION INFO";

/// Compile a fixed pattern once and share it.
pub(crate) fn cached_regex(
    cell: &'static OnceLock<Result<Regex, regex::Error>>,
    pattern: &str,
) -> Result<&'static Regex, ReportParseError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|err| ReportParseError::Pattern(err.clone()))
}

/// The last section of a report.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchInfo {
    Single(StrategySearchInfo),
    Iterative(IterativeOptimizationInfo),
}

/// A whole report, sections kept as typed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub game_info: GameInfo,
    /// Formatted `ACTIONS` lines.
    pub actions: String,
    pub search: SearchInfo,
}

impl Report {
    /// Report of one run on its own.
    pub fn single(result: &RunResult) -> Self {
        Self {
            game_info: GameInfo::from_run(result),
            actions: format_actions(result.history(), result.tick_duration),
            search: SearchInfo::Single(StrategySearchInfo::from_run(result)),
        }
    }

    /// Report of a session winner with the whole session attached.
    pub fn iterative(winner: &RunResult, session: IterativeOptimizationInfo) -> Self {
        Self {
            game_info: GameInfo::from_run(winner),
            actions: format_actions(winner.history(), winner.tick_duration),
            search: SearchInfo::Iterative(session),
        }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        let (name, search) = match &self.search {
            SearchInfo::Single(info) => (STRATEGY_SEARCH_INFO, serde_json::to_string_pretty(info)?),
            SearchInfo::Iterative(info) => {
                (ITERATIVE_OPTIMIZATION_INFO, serde_json::to_string_pretty(info)?)
            }
        };
        let sections = [
            wrap(GAME_INFO, &serde_json::to_string_pretty(&self.game_info)?),
            wrap(ACTIONS, &self.actions),
            wrap(name, &search),
        ];
        Ok(sections.join("\n\n") + "\n")
    }

    /// Parse report text. Every section is checked, the `ACTIONS` lines
    /// included, before anything is returned.
    pub fn parse(text: &str) -> Result<Self, ReportParseError> {
        let game_info = json_section(text, GAME_INFO)?;
        let actions = section(text, ACTIONS)?.ok_or(ReportParseError::MissingSection {
            section: ACTIONS,
        })?;
        ParsedActions::parse(actions)?;

        let search = if section(text, STRATEGY_SEARCH_INFO)?.is_some() {
            SearchInfo::Single(json_section(text, STRATEGY_SEARCH_INFO)?)
        } else if section(text, ITERATIVE_OPTIMIZATION_INFO)?.is_some() {
            SearchInfo::Iterative(json_section(text, ITERATIVE_OPTIMIZATION_INFO)?)
        } else {
            return Err(ReportParseError::MissingSection {
                section: STRATEGY_SEARCH_INFO,
            });
        };

        Ok(Self {
            game_info,
            actions: actions.to_string(),
            search,
        })
    }

    pub fn parsed_actions(&self) -> Result<ParsedActions, ReportParseError> {
        ParsedActions::parse(&self.actions)
    }
}

fn wrap(name: &str, body: &str) -> String {
    format!("=== {name} ===\n{body}\n=== END {name} ===")
}

static SECTION_BLOCK: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

const SECTION_PATTERN: &str = r"(?s)=== ([A-Z ]+) ===\n(.*?)\n=== END ([A-Z ]+) ===";

/// Body of a named section, if present.
fn section<'t>(text: &'t str, name: &'static str) -> Result<Option<&'t str>, ReportParseError> {
    let block = cached_regex(&SECTION_BLOCK, SECTION_PATTERN)?;
    Ok(block
        .captures_iter(text)
        .find(|caps| &caps[1] == name && &caps[3] == name)
        .and_then(|caps| caps.get(2))
        .map(|body| body.as_str()))
}

fn json_section<T: DeserializeOwned>(
    text: &str,
    name: &'static str,
) -> Result<T, ReportParseError> {
    let body = section(text, name)?.ok_or(ReportParseError::MissingSection { section: name })?;
    serde_json::from_str(body).map_err(|source| ReportParseError::InvalidJson {
        section: name,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::Item;
    use crate::core::scenario::Platform;

    fn sample() -> Report {
        Report {
            game_info: GameInfo {
                platform: Platform::Pc,
                galaxies: 0,
                boosts: 5,
                has_sacrifice: true,
                game_time: "01:00.000".to_string(),
                ticks_passed: 1000,
                tick_duration: 0.06,
            },
            actions: "item: tier 1, amount:  1, total:   1, cost_one: 1e1, cost_amount: 1e1, cost_stack: 1e2, time: 00:00.000\nsacrifice: 2.5, time: 00:30.000".to_string(),
            search: SearchInfo::Iterative(IterativeOptimizationInfo::new("test cpu")),
        }
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let text = sample().to_text().unwrap();
        let game = text.find("=== GAME INFO ===").unwrap();
        let actions = text.find("=== ACTIONS ===").unwrap();
        let search = text.find("=== ITERATIVE OPTIMIZATION INFO ===").unwrap();
        assert!(game < actions && actions < search);
        assert!(text.contains("=== END ACTIONS ===\n\n=== ITERATIVE OPTIMIZATION INFO ==="));
        assert!(text.ends_with("=== END ITERATIVE OPTIMIZATION INFO ===\n"));
    }

    #[test]
    fn test_text_parses_back() {
        let report = sample();
        let parsed = Report::parse(&report.to_text().unwrap()).unwrap();
        assert_eq!(parsed, report);
        let actions = parsed.parsed_actions().unwrap();
        assert_eq!(actions.purchases, vec![Item::Tier(1)]);
        assert_eq!(actions.sacrifices, vec![2.5]);
    }

    #[test]
    fn test_empty_actions_section() {
        let mut report = sample();
        report.actions.clear();
        let parsed = Report::parse(&report.to_text().unwrap()).unwrap();
        assert!(parsed.actions.is_empty());
    }

    #[test]
    fn test_section_found_by_name_in_any_order() {
        let text = "=== B ===\nsecond\n=== END B ===\n\n=== A ===\nfirst\nline\n=== END A ===\n";
        assert_eq!(section(text, "A").unwrap(), Some("first\nline"));
        assert_eq!(section(text, "B").unwrap(), Some("second"));
        assert_eq!(section(text, "C").unwrap(), None);
        // unbalanced markers do not pair up
        assert_eq!(section("=== A ===\nx\n=== END B ===", "A").unwrap(), None);

        let report = sample().to_text().unwrap();
        for _ in 0..3 {
            assert_eq!(Report::parse(&report).unwrap(), sample());
        }
    }

    #[test]
    fn test_missing_section_is_named() {
        let text = sample().to_text().unwrap().replace("=== END ACTIONS ===", "");
        match Report::parse(&text) {
            Err(ReportParseError::MissingSection { section }) => assert_eq!(section, "ACTIONS"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_bad_json_is_named() {
        let text = sample()
            .to_text()
            .unwrap()
            .replace("\"boosts\": 5", "\"boosts\": \"five\"");
        match Report::parse(&text) {
            Err(ReportParseError::InvalidJson { section, .. }) => assert_eq!(section, "GAME INFO"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_missing_search_section() {
        let text = sample()
            .to_text()
            .unwrap()
            .replace("ITERATIVE OPTIMIZATION INFO", "SOMETHING ELSE");
        assert!(matches!(
            Report::parse(&text),
            Err(ReportParseError::MissingSection { section: "STRATEGY SEARCH INFO" })
        ));
    }
}
