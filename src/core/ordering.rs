//! Temporal ordering
//!
//! Every causal computation walks records in this single total order:
//! season, then round, then input position.

use std::collections::HashMap;

use crate::error::{FeatureError, Result};
use crate::models::NormalizedRecord;

pub struct TemporalOrderer;

impl TemporalOrderer {
    /// Return record indices in temporal order.
    ///
    /// Fails if one race id is reported under two different (season, round) slots.
    pub fn order(records: &[NormalizedRecord]) -> Result<Vec<usize>> {
        Self::check_race_slots(records)?;

        let mut order: Vec<usize> = (0..records.len()).collect();
        // Stable, and sequence is part of the key, so the order is total
        order.sort_by_key(|&i| records[i].key);
        Ok(order)
    }

    /// Look up records in `order`, failing on an index past the end
    pub fn resolve<'r>(records: &'r [NormalizedRecord], order: &[usize]) -> Result<Vec<&'r NormalizedRecord>> {
        order
            .iter()
            .map(|&i| {
                records.get(i).ok_or_else(|| {
                    FeatureError::Integrity(format!(
                        "order index {} out of range for {} records",
                        i,
                        records.len()
                    ))
                })
            })
            .collect()
    }

    fn check_race_slots(records: &[NormalizedRecord]) -> Result<()> {
        let mut slots: HashMap<u32, (i32, u32)> = HashMap::new();
        for record in records {
            let slot = record.key.race_slot();
            match slots.get(&record.race_id) {
                Some(&seen) if seen != slot => {
                    return Err(FeatureError::Validation(format!(
                        "race {} appears as season {} round {} and season {} round {}",
                        record.race_id, seen.0, seen.1, slot.0, slot.1
                    )));
                }
                Some(_) => {}
                None => {
                    slots.insert(record.race_id, slot);
                }
            }
        }
        Ok(())
    }
}
