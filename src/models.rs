use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::FeatureError;

/// Driver result for one race, as delivered by the ingestion/join step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRaceRecord {
    pub season: i32,
    pub round: u32,
    pub race_id: u32,
    pub driver_id: u32,
    pub constructor_id: u32,
    /// Starting grid slot, possibly a sentinel (0 = unknown / pit lane)
    pub grid: Option<i64>,
    /// Classification order (1-based); None when the source carries a non-finish marker
    pub position_order: Option<u32>,
    pub points: f64,
    /// Status text, e.g. "Finished", "+1 Lap", "Did not start"
    pub status: String,
}

/// Outcome category of a race entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Finished,
    Retired,
    DidNotStart,
    Other,
}

fn lapped_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+\d+\s+laps?$").expect("valid lapped-status pattern"))
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Finished => "finished",
            OutcomeStatus::Retired => "retired",
            OutcomeStatus::DidNotStart => "did-not-start",
            OutcomeStatus::Other => "other",
        }
    }
}

impl FromStr for OutcomeStatus {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        match text.as_str() {
            "finished" | "classified" => Ok(OutcomeStatus::Finished),
            "retired" | "dnf" => Ok(OutcomeStatus::Retired),
            "did-not-start" | "did not start" | "dns" => Ok(OutcomeStatus::DidNotStart),
            "other" => Ok(OutcomeStatus::Other),
            t if lapped_pattern().is_match(t) => Ok(OutcomeStatus::Finished),
            _ => Err(FeatureError::Validation(format!(
                "Unrecognized outcome status '{}'",
                s.trim()
            ))),
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a record in the single total order used for causal features.
///
/// Field order matters: the derived `Ord` compares season, then round, then
/// input sequence position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderingKey {
    pub season: i32,
    pub round: u32,
    pub sequence: usize,
}

impl OrderingKey {
    pub fn race_slot(&self) -> (i32, u32) {
        (self.season, self.round)
    }
}

/// Record after sentinel resolution and outcome flag derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub key: OrderingKey,
    pub race_id: u32,
    pub driver_id: u32,
    pub constructor_id: u32,
    pub grid: Option<i64>,
    pub grid_clean: Option<u32>,
    pub position_order: Option<u32>,
    pub points: f64,
    pub status: OutcomeStatus,
    pub is_podium: bool,
    pub is_finished: bool,
    pub is_dnf: bool,
    pub is_dns: bool,
    /// Post-race only: grid_clean - position_order
    pub position_gain: Option<i64>,
}

/// One constructor's combined result in one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConstructorSummary {
    pub race_id: u32,
    pub constructor_id: u32,
    pub key: OrderingKey,
    pub entries: usize,
    pub finishers: usize,
    pub total_points: f64,
    pub mean_points: f64,
    /// None when no car of this constructor finished the race
    pub mean_finish_position: Option<f64>,
}

/// Output row: the normalized record plus strictly-prior history features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub season: i32,
    pub round: u32,
    pub race_id: u32,
    pub driver_id: u32,
    pub constructor_id: u32,
    pub grid: Option<i64>,
    pub position_order: Option<u32>,
    pub points: f64,
    pub status: OutcomeStatus,

    // Cleaned / derived
    pub grid_clean: Option<u32>,
    pub is_podium: bool,
    pub is_finished: bool,
    pub is_dnf: bool,
    pub is_dns: bool,
    pub position_gain: Option<i64>,

    // Driver history
    pub driver_races_past: u32,
    pub driver_avg_points_past: Option<f64>,
    pub driver_consistency_past: Option<f64>,

    // Constructor history (race level)
    pub constructor_races_past: u32,
    pub constructor_strength_past: Option<f64>,
    pub constructor_avg_finish_past: Option<f64>,
}
