//! Scenario selection: which progression variant a run simulates.

use crate::core::balance::{
    MAX_TIERS, MOBILE_TICK_SECONDS, PC_TICK_SECONDS, SACRIFICE_MIN_BOOSTS, START_ACHIEVEMENTS,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client platform; decides tick length and the tier multiplier bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Pc,
    Mobile,
}

impl Platform {
    pub fn all() -> [Platform; 2] {
        [Platform::Pc, Platform::Mobile]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::Mobile => "mobile",
        }
    }

    /// Seconds of game time per tick.
    pub fn tick_duration(self) -> f64 {
        match self {
            Platform::Pc => PC_TICK_SECONDS,
            Platform::Mobile => MOBILE_TICK_SECONDS,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progression stage: platform plus galaxies and boosts already owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    pub platform: Platform,
    pub galaxies: u8,
    pub boosts: u8,
}

impl Scenario {
    pub fn new(platform: Platform, galaxies: u8, boosts: u8) -> Self {
        Self {
            platform,
            galaxies,
            boosts,
        }
    }

    /// Active tier count: 4 plus one per boost, capped at 8.
    pub fn active_tiers(&self) -> usize {
        (4 + self.boosts as usize).min(MAX_TIERS)
    }

    /// Whether the sacrifice mechanic exists in this scenario.
    pub fn has_sacrifice(&self) -> bool {
        self.boosts >= SACRIFICE_MIN_BOOSTS
    }

    /// Top tier purchases that finish the scenario.
    ///
    /// On the last boost of a galaxy the galaxy requirement replaces the
    /// boost requirement.
    pub fn win_threshold(&self) -> u32 {
        if last_boost(self.galaxies) == Some(self.boosts) {
            match self.galaxies {
                0 => return 80,
                1 => return 140,
                _ => return 200,
            }
        }
        if self.boosts <= 4 {
            20
        } else {
            20 + (self.boosts as u32 - 4) * 15
        }
    }

    /// Achievements owned when the scenario starts.
    pub fn start_achievements(&self) -> u32 {
        let mut amount = START_ACHIEVEMENTS + self.start_tier_achievements();
        match self.galaxies {
            0 => {
                if self.boosts >= 6 {
                    amount += 1;
                }
                if self.boosts >= 7 {
                    amount += 2;
                }
                if self.boosts >= 8 {
                    amount += 1;
                }
            }
            1 => {
                amount += 5;
                if self.boosts >= 10 {
                    amount += 2;
                }
                if self.boosts >= 12 {
                    amount += 1;
                }
            }
            _ => {
                amount += 9;
                if self.boosts >= 15 {
                    amount += 1;
                }
            }
        }
        amount
    }

    /// "Buy tier N" achievements already unlocked at the start.
    fn start_tier_achievements(&self) -> u32 {
        if self.galaxies > 0 {
            return 8;
        }
        match self.boosts {
            0 => 0,
            b if b >= 5 => 8,
            b => 3 + b as u32,
        }
    }

    /// Every scenario of the reference variant, in sweep order.
    pub fn all_for(platform: Platform, galaxies: u8) -> Vec<Scenario> {
        let last = last_boost(galaxies).unwrap_or(0);
        (0..=last)
            .map(|boosts| Scenario::new(platform, galaxies, boosts))
            .collect()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} galaxy{} boost{}",
            self.platform, self.galaxies, self.boosts
        )
    }
}

/// Galaxy counts covered by the reference tables.
pub const GALAXY_RANGE: [u8; 3] = [0, 1, 2];

/// Last boost worth simulating for a galaxy count.
pub fn last_boost(galaxies: u8) -> Option<u8> {
    match galaxies {
        0 => Some(8),
        1 => Some(12),
        2 => Some(16),
        _ => None,
    }
}
