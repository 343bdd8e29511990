//! Feature engine
//!
//! Runs normalize -> order -> reduce -> expand -> assemble over one fully
//! materialized record set. Every run recomputes all history from scratch.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::assembler::FeatureAssembler;
use super::history::{constructor_histories, driver_histories};
use super::normalizer::RecordNormalizer;
use super::ordering::TemporalOrderer;
use super::reducer::RaceLevelReducer;
use crate::config::EngineConfig;
use crate::error::{FeatureError, Result};
use crate::models::{FeatureRow, NormalizedRecord, RawRaceRecord};

/// Engine entry point
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    normalizer: RecordNormalizer,
}

impl FeatureEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: RecordNormalizer::new(config),
        })
    }

    pub fn with_defaults() -> Self {
        Self {
            normalizer: RecordNormalizer::with_defaults(),
        }
    }

    /// Compute the feature table for a complete record set
    pub fn build(&self, raws: &[RawRaceRecord]) -> Result<FeatureTable> {
        info!("Building features for {} records", raws.len());

        let records = self.normalizer.normalize_all(raws)?;
        check_row_identity(&records)?;

        let order = TemporalOrderer::order(&records)?;
        let summaries = RaceLevelReducer::reduce(&records, &order)?;
        debug!(
            "Reduced {} records to {} constructor-race summaries",
            records.len(),
            summaries.len()
        );

        let drivers = driver_histories(&records, &order)?;
        let constructors = constructor_histories(&summaries)?;

        let rows = FeatureAssembler::new(&drivers, &constructors, &summaries)
            .assemble(&records, &order)?;

        info!("Built {} feature rows", rows.len());
        Ok(FeatureTable { rows })
    }
}

/// (driver_id, race_id) identifies a row; a repeat means malformed input
fn check_row_identity(records: &[NormalizedRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert((record.driver_id, record.race_id)) {
            return Err(FeatureError::Validation(format!(
                "driver {} appears more than once in race {}",
                record.driver_id, record.race_id
            )));
        }
    }
    Ok(())
}

/// Engine output: one row per input record, in temporal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

/// Overview of a feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows: usize,
    pub seasons: Vec<i32>,
    pub races: usize,
    pub drivers: usize,
    pub constructors: usize,
    /// Missing count per optional column
    pub missing: Vec<(String, usize)>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureRow> {
        self.rows.iter()
    }

    /// Look up a row by its identity
    pub fn get(&self, driver_id: u32, race_id: u32) -> Option<&FeatureRow> {
        self.rows
            .iter()
            .find(|r| r.driver_id == driver_id && r.race_id == race_id)
    }

    /// Rows keyed by (driver_id, race_id)
    pub fn by_identity(&self) -> HashMap<(u32, u32), &FeatureRow> {
        self.rows.iter().map(|r| ((r.driver_id, r.race_id), r)).collect()
    }

    pub fn summary(&self) -> TableSummary {
        let mut seasons: Vec<i32> = self.rows.iter().map(|r| r.season).collect();
        seasons.sort_unstable();
        seasons.dedup();

        let distinct = |f: fn(&FeatureRow) -> u32| -> usize {
            self.rows.iter().map(f).collect::<HashSet<_>>().len()
        };
        let missing = |f: fn(&FeatureRow) -> bool| -> usize {
            self.rows.iter().filter(|r| f(r)).count()
        };

        TableSummary {
            rows: self.rows.len(),
            seasons,
            races: distinct(|r| r.race_id),
            drivers: distinct(|r| r.driver_id),
            constructors: distinct(|r| r.constructor_id),
            missing: vec![
                ("grid_clean".to_string(), missing(|r| r.grid_clean.is_none())),
                (
                    "driver_avg_points_past".to_string(),
                    missing(|r| r.driver_avg_points_past.is_none()),
                ),
                (
                    "driver_consistency_past".to_string(),
                    missing(|r| r.driver_consistency_past.is_none()),
                ),
                (
                    "constructor_strength_past".to_string(),
                    missing(|r| r.constructor_strength_past.is_none()),
                ),
                (
                    "constructor_avg_finish_past".to_string(),
                    missing(|r| r.constructor_avg_finish_past.is_none()),
                ),
            ],
        }
    }
}
