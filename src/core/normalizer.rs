//! Record normalization
//!
//! Resolves sentinel starting positions and derives per-record outcome flags.

use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{validate_grid, validate_points, validate_position_order, validate_round, FeatureError, Result};
use crate::models::{NormalizedRecord, OrderingKey, OutcomeStatus, RawRaceRecord};

/// Turns raw records into typed, flag-carrying records
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    config: EngineConfig,
}

impl RecordNormalizer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Normalize one record. `sequence` is its position in the input set.
    pub fn normalize(&self, raw: &RawRaceRecord, sequence: usize) -> Result<NormalizedRecord> {
        validate_round(raw.round)?;
        validate_points(raw.points)?;
        if let Some(grid) = raw.grid {
            validate_grid(grid)?;
        }
        if let Some(position) = raw.position_order {
            validate_position_order(position)?;
        }

        let status = self.parse_status(&raw.status)?;
        let grid_clean = self.clean_grid(raw.grid);

        let is_podium = raw
            .position_order
            .map_or(false, |p| p <= self.config.podium_cutoff);
        let is_finished = status == OutcomeStatus::Finished;
        let is_dns = status == OutcomeStatus::DidNotStart;
        let is_dnf = !is_finished && !is_dns;

        let position_gain = match (grid_clean, raw.position_order) {
            (Some(grid), Some(position)) => Some(grid as i64 - position as i64),
            _ => None,
        };

        Ok(NormalizedRecord {
            key: OrderingKey {
                season: raw.season,
                round: raw.round,
                sequence,
            },
            race_id: raw.race_id,
            driver_id: raw.driver_id,
            constructor_id: raw.constructor_id,
            grid: raw.grid,
            grid_clean,
            position_order: raw.position_order,
            points: raw.points,
            status,
            is_podium,
            is_finished,
            is_dnf,
            is_dns,
            position_gain,
        })
    }

    /// Normalize a whole record set, failing on the first invalid record
    pub fn normalize_all(&self, raws: &[RawRaceRecord]) -> Result<Vec<NormalizedRecord>> {
        raws.iter()
            .enumerate()
            .map(|(i, raw)| {
                self.normalize(raw, i).map_err(|e| match e {
                    FeatureError::Validation(msg) => FeatureError::Validation(format!(
                        "record {} (race {}, driver {}): {}",
                        i, raw.race_id, raw.driver_id, msg
                    )),
                    other => other,
                })
            })
            .collect()
    }

    /// Sentinel grid values mean "unknown", never "pole"
    fn clean_grid(&self, grid: Option<i64>) -> Option<u32> {
        grid.filter(|g| !self.config.is_start_sentinel(*g))
            .and_then(|g| u32::try_from(g).ok())
    }

    fn parse_status(&self, text: &str) -> Result<OutcomeStatus> {
        match text.parse::<OutcomeStatus>() {
            Ok(status) => Ok(status),
            Err(e) => {
                if self.config.lenient_status && !text.trim().is_empty() {
                    warn!("Mapping unrecognized status '{}' to retired", text.trim());
                    Ok(OutcomeStatus::Retired)
                } else {
                    Err(e)
                }
            }
        }
    }
}
