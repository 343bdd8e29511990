//! Engine configuration
//!
//! Defaults, optional JSON file, then environment overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FeatureError, Result};

/// Environment variable holding a comma-separated list of grid sentinels
pub const ENV_SENTINELS: &str = "F1_FEATURES_SENTINELS";
/// Environment variable enabling lenient status text mapping
pub const ENV_LENIENT_STATUS: &str = "F1_FEATURES_LENIENT_STATUS";

/// Normalization settings for the feature engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Raw starting positions meaning "unknown" (pit-lane start, missing grid)
    pub start_position_sentinels: Vec<i64>,
    /// Finishing positions up to this value count as a podium
    pub podium_cutoff: u32,
    /// Map unrecognized non-empty status text to Retired instead of failing
    pub lenient_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_position_sentinels: vec![0],
            podium_cutoff: 3,
            lenient_status: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            FeatureError::Config(format!(
                "invalid config JSON in {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(
            std::env::var(ENV_SENTINELS).ok().as_deref(),
            std::env::var(ENV_LENIENT_STATUS).ok().as_deref(),
        )
    }

    fn with_overrides(mut self, sentinels: Option<&str>, lenient: Option<&str>) -> Result<Self> {
        if let Some(raw) = sentinels {
            self.start_position_sentinels = parse_sentinels(raw)?;
        }
        if let Some(raw) = lenient {
            self.lenient_status = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(FeatureError::Config(format!(
                        "{} must be a boolean, got '{}'",
                        ENV_LENIENT_STATUS, other
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.podium_cutoff == 0 {
            return Err(FeatureError::Config(
                "podium_cutoff must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_start_sentinel(&self, grid: i64) -> bool {
        self.start_position_sentinels.contains(&grid)
    }
}

/// Parse a comma-separated sentinel list such as "0,-1"
pub fn parse_sentinels(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                FeatureError::Config(format!("invalid starting-position sentinel '{}'", s))
            })
        })
        .collect()
}

/// Inclusive range of seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl SeasonRange {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(FeatureError::Config(format!(
                "season range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, season: i32) -> bool {
        (self.start..=self.end).contains(&season)
    }
}

impl std::str::FromStr for SeasonRange {
    type Err = FeatureError;

    /// Accepts "2018-2022" or a single season "2023"
    fn from_str(s: &str) -> Result<Self> {
        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| FeatureError::Config(format!("invalid season '{}'", v.trim())))
        };
        match s.split_once('-') {
            Some((start, end)) => Self::new(parse(start)?, parse(end)?),
            None => {
                let season = parse(s)?;
                Self::new(season, season)
            }
        }
    }
}

impl std::fmt::Display for SeasonRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Train/test season windows for time-based evaluation splits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub train: SeasonRange,
    pub test: SeasonRange,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train: SeasonRange { start: 2018, end: 2022 },
            test: SeasonRange { start: 2023, end: 2024 },
        }
    }
}
