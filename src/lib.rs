//! Boostline - fastest action sequences for an incremental progression ruleset
//!
//! The engine advances many candidate timelines in lockstep, forks one
//! whenever several actions are admissible, prunes dominated timelines and
//! stops at the first tick on which some timeline wins. The optimizer
//! alternates between refining purchase order and sacrifice timing until
//! another round stops paying off.

pub mod build_info;
pub mod core;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod policy;
pub mod pool;
pub mod report;
pub mod telemetry;

pub use error::{Error, Result};
