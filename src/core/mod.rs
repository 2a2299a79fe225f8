//! Ruleset layer: reference tables, scenarios and validated per-run configuration.

pub mod balance;
pub mod item;
pub mod ruleset;
pub mod scenario;

pub use item::Item;
pub use ruleset::Ruleset;
pub use scenario::{Platform, Scenario};
