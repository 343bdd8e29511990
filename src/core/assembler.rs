//! Feature assembly
//!
//! Joins driver and constructor history back onto each normalized record.

use std::collections::HashMap;

use super::history::{ConstructorHistory, DriverHistory, HistoryIndex};
use super::ordering::TemporalOrderer;
use crate::error::{FeatureError, Result};
use crate::models::{FeatureRow, NormalizedRecord, OrderingKey, RaceConstructorSummary};

pub struct FeatureAssembler<'a> {
    drivers: &'a HistoryIndex<DriverHistory>,
    constructors: &'a HistoryIndex<ConstructorHistory>,
    /// (race_id, constructor_id) -> race-level ordering key
    race_keys: HashMap<(u32, u32), OrderingKey>,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(
        drivers: &'a HistoryIndex<DriverHistory>,
        constructors: &'a HistoryIndex<ConstructorHistory>,
        summaries: &[RaceConstructorSummary],
    ) -> Self {
        let race_keys = summaries
            .iter()
            .map(|s| ((s.race_id, s.constructor_id), s.key))
            .collect();
        Self {
            drivers,
            constructors,
            race_keys,
        }
    }

    /// Build one feature row per record, in temporal order
    pub fn assemble(&self, records: &[NormalizedRecord], order: &[usize]) -> Result<Vec<FeatureRow>> {
        TemporalOrderer::resolve(records, order)?
            .into_iter()
            .map(|record| self.assemble_one(record))
            .collect()
    }

    pub fn assemble_one(&self, record: &NormalizedRecord) -> Result<FeatureRow> {
        let driver = self
            .drivers
            .get(&(record.driver_id, record.key))
            .ok_or_else(|| {
                FeatureError::Integrity(format!(
                    "driver {} has no history entry at {:?}",
                    record.driver_id, record.key
                ))
            })?;

        let race_key = self
            .race_keys
            .get(&(record.race_id, record.constructor_id))
            .ok_or_else(|| {
                FeatureError::Integrity(format!(
                    "constructor {} has no race summary for race {}",
                    record.constructor_id, record.race_id
                ))
            })?;
        let constructor = self
            .constructors
            .get(&(record.constructor_id, *race_key))
            .ok_or_else(|| {
                FeatureError::Integrity(format!(
                    "constructor {} has no history entry at {:?}",
                    record.constructor_id, race_key
                ))
            })?;

        Ok(FeatureRow {
            season: record.key.season,
            round: record.key.round,
            race_id: record.race_id,
            driver_id: record.driver_id,
            constructor_id: record.constructor_id,
            grid: record.grid,
            position_order: record.position_order,
            points: record.points,
            status: record.status,
            grid_clean: record.grid_clean,
            is_podium: record.is_podium,
            is_finished: record.is_finished,
            is_dnf: record.is_dnf,
            is_dns: record.is_dns,
            position_gain: record.position_gain,
            driver_races_past: driver.races_past,
            driver_avg_points_past: driver.avg_points_past,
            driver_consistency_past: driver.consistency_past,
            constructor_races_past: constructor.races_past,
            constructor_strength_past: constructor.strength_past,
            constructor_avg_finish_past: constructor.avg_finish_past,
        })
    }
}
