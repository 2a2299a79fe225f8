//! Build metadata stamped into every report.

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `version (commit, date)`, shown by the CLI.
pub fn describe() -> String {
    format!("{PACKAGE_VERSION} ({BUILD_COMMIT}, {BUILD_DATE})")
}
