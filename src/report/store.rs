//! Reports on disk.
//!
//! Layout under the root:
//! `<policy>/<platform>/galaxy<g>/<platform>_galaxy<g>_boost<b>[_sac].txt`,
//! plus one `summary.json` per policy directory.

use super::time::format_time;
use super::{Report, GAME_INFO};
use crate::core::balance::SACRIFICE_MIN_BOOSTS;
use crate::core::scenario::{last_boost, Platform, Scenario};
use crate::error::{ConfigError, ReportParseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SUMMARY_FILE: &str = "summary.json";

/// Total game time per galaxy and overall, for every platform of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub description: Vec<String>,
    /// Platform, then galaxy count (or `total`), to `mm:ss.mmm`.
    pub times: BTreeMap<String, BTreeMap<String, String>>,
}

/// Read and parse one report file.
pub fn load_report(path: &Path) -> Result<Report> {
    let text = fs::read_to_string(path)?;
    let report = Report::parse(&text)?;
    debug!(path = %path.display(), "Report loaded");
    Ok(report)
}

/// Directory tree of saved reports.
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy_dir(&self, policy: &str) -> PathBuf {
        self.root.join(policy)
    }

    /// Where the report for a scenario lives. The `_sac` suffix marks
    /// reports of runs that allowed sacrifices.
    pub fn report_path(&self, policy: &str, scenario: &Scenario, has_sacrifice: bool) -> PathBuf {
        let platform = scenario.platform.as_str();
        let galaxies = scenario.galaxies;
        let suffix = if scenario.boosts >= SACRIFICE_MIN_BOOSTS && has_sacrifice {
            "_sac"
        } else {
            ""
        };
        self.policy_dir(policy)
            .join(platform)
            .join(format!("galaxy{galaxies}"))
            .join(format!(
                "{platform}_galaxy{galaxies}_boost{}{suffix}.txt",
                scenario.boosts
            ))
    }

    /// Write a report where its game info says it belongs.
    pub fn save(&self, policy: &str, report: &Report) -> Result<PathBuf> {
        let info = &report.game_info;
        let path = self.report_path(policy, &info.scenario(), info.has_sacrifice);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, report.to_text()?)?;
        debug!(path = %path.display(), "Report saved");
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<Report> {
        load_report(path)
    }

    /// The final report of a scenario: sacrifice reports from five boosts on.
    pub fn load_final(&self, policy: &str, scenario: &Scenario) -> Result<Report> {
        let path = self.report_path(policy, scenario, scenario.has_sacrifice());
        self.load(&path)
    }

    /// Add up the final game times of every scenario in range and write
    /// `summary.json` into the policy directory.
    pub fn write_summary(
        &self,
        policy: &str,
        description: Vec<String>,
        platforms: &[Platform],
        galaxies: &[u8],
    ) -> Result<StrategySummary> {
        let mut times = BTreeMap::new();
        for &platform in platforms {
            let mut per_galaxy = BTreeMap::new();
            let mut platform_total = 0.0;
            for &galaxy in galaxies {
                if last_boost(galaxy).is_none() {
                    return Err(ConfigError::UnsupportedGalaxies { galaxies: galaxy }.into());
                }
                let mut galaxy_total = 0.0;
                for scenario in Scenario::all_for(platform, galaxy) {
                    let report = self.load_final(policy, &scenario)?;
                    galaxy_total += report.game_info.game_seconds().ok_or_else(|| {
                        ReportParseError::MalformedLine {
                            section: GAME_INFO,
                            line: report.game_info.game_time.clone(),
                        }
                    })?;
                }
                debug!(%platform, galaxy, total = galaxy_total, "Galaxy summed");
                per_galaxy.insert(galaxy.to_string(), format_time(galaxy_total));
                platform_total += galaxy_total;
            }
            per_galaxy.insert("total".to_string(), format_time(platform_total));
            times.insert(platform.as_str().to_string(), per_galaxy);
        }

        let summary = StrategySummary { description, times };
        let dir = self.policy_dir(policy);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(SUMMARY_FILE), serde_json::to_string_pretty(&summary)?)?;
        Ok(summary)
    }
}
