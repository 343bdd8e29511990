//! Driver and constructor history passes
//!
//! Both passes feed the same expanding aggregator. Drivers are observed once
//! per record; constructors once per race-level summary.

use std::collections::HashMap;

use tracing::debug;

use super::expanding::{ExpandingAggregator, ExpandingStats, Observation};
use super::ordering::TemporalOrderer;
use crate::error::Result;
use crate::models::{NormalizedRecord, OrderingKey, RaceConstructorSummary};

/// Driver features for one record, from strictly earlier records
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverHistory {
    pub races_past: u32,
    pub avg_points_past: Option<f64>,
    pub consistency_past: Option<f64>,
}

/// Constructor features for one race, from strictly earlier races
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructorHistory {
    pub races_past: u32,
    pub strength_past: Option<f64>,
    pub avg_finish_past: Option<f64>,
}

/// Histories keyed by (entity id, ordering key)
pub type HistoryIndex<T> = HashMap<(u32, OrderingKey), T>;

/// Run the driver passes: points (count, mean) and finishing position (std).
pub fn driver_histories(
    records: &[NormalizedRecord],
    order: &[usize],
) -> Result<HistoryIndex<DriverHistory>> {
    let ordered = TemporalOrderer::resolve(records, order)?;
    let points = ExpandingAggregator::run(
        ordered
            .iter()
            .map(|r| Observation::new(r.driver_id, r.key, Some(r.points))),
    )?;
    let positions = ExpandingAggregator::run(
        ordered
            .iter()
            .map(|r| Observation::new(r.driver_id, r.key, r.position_order.map(f64::from))),
    )?;

    let index: HistoryIndex<DriverHistory> = ordered
        .iter()
        .zip(points.iter().zip(positions.iter()))
        .map(|(r, (p, pos))| ((r.driver_id, r.key), driver_entry(p, pos)))
        .collect();

    debug!("Driver history: {} entries", index.len());
    Ok(index)
}

fn driver_entry(points: &ExpandingStats, positions: &ExpandingStats) -> DriverHistory {
    DriverHistory {
        races_past: points.count,
        avg_points_past: points.mean,
        consistency_past: positions.std_dev,
    }
}

/// Run the constructor passes over race-level summaries (already key-sorted).
pub fn constructor_histories(
    summaries: &[RaceConstructorSummary],
) -> Result<HistoryIndex<ConstructorHistory>> {
    let strength = ExpandingAggregator::run(
        summaries
            .iter()
            .map(|s| Observation::new(s.constructor_id, s.key, Some(s.total_points))),
    )?;
    let finish = ExpandingAggregator::run(
        summaries
            .iter()
            .map(|s| Observation::new(s.constructor_id, s.key, s.mean_finish_position)),
    )?;

    let index: HistoryIndex<ConstructorHistory> = summaries
        .iter()
        .zip(strength.iter().zip(finish.iter()))
        .map(|(s, (st, fin))| {
            (
                (s.constructor_id, s.key),
                ConstructorHistory {
                    races_past: st.count,
                    strength_past: st.mean,
                    avg_finish_past: fin.mean,
                },
            )
        })
        .collect();

    debug!("Constructor history: {} race entries", index.len());
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutcomeStatus;

    fn record(sequence: usize, round: u32, driver_id: u32, position: u32, points: f64) -> NormalizedRecord {
        NormalizedRecord {
            key: OrderingKey {
                season: 2021,
                round,
                sequence,
            },
            race_id: 1050 + round,
            driver_id,
            constructor_id: 131,
            grid: Some(position as i64),
            grid_clean: Some(position),
            position_order: Some(position),
            points,
            status: OutcomeStatus::Finished,
            is_podium: position <= 3,
            is_finished: true,
            is_dnf: false,
            is_dns: false,
            position_gain: Some(0),
        }
    }

    #[test]
    fn test_driver_histories() {
        let records = vec![
            record(0, 1, 1, 1, 25.0),
            record(1, 2, 1, 3, 15.0),
            record(2, 3, 1, 2, 18.0),
        ];
        let index = driver_histories(&records, &[0, 1, 2]).unwrap();

        let first = index[&(1, records[0].key)];
        assert_eq!(first.races_past, 0);
        assert_eq!(first.avg_points_past, None);
        assert_eq!(first.consistency_past, None);

        let third = index[&(1, records[2].key)];
        assert_eq!(third.races_past, 2);
        assert!((third.avg_points_past.unwrap() - 20.0).abs() < 1e-9);
        // std of positions [1, 3]
        assert!((third.consistency_past.unwrap() - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_constructor_histories_skip_missing_finish() {
        let key = |round: u32| OrderingKey {
            season: 2021,
            round,
            sequence: round as usize,
        };
        let summary = |round: u32, total: f64, finish: Option<f64>| RaceConstructorSummary {
            race_id: 1050 + round,
            constructor_id: 131,
            key: key(round),
            entries: 2,
            finishers: if finish.is_some() { 2 } else { 0 },
            total_points: total,
            mean_points: total / 2.0,
            mean_finish_position: finish,
        };
        let summaries = vec![
            summary(1, 43.0, Some(1.5)),
            summary(2, 0.0, None),
            summary(3, 30.0, Some(4.0)),
        ];
        let index = constructor_histories(&summaries).unwrap();

        let third = index[&(131, key(3))];
        assert_eq!(third.races_past, 2);
        assert!((third.strength_past.unwrap() - 21.5).abs() < 1e-9);
        assert!((third.avg_finish_past.unwrap() - 1.5).abs() < 1e-9);
    }
}
