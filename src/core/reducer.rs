//! Race-level constructor reduction
//!
//! Collapses all cars of one constructor in one race into a single summary,
//! so constructor history advances once per race rather than once per car.

use std::collections::HashMap;

use super::ordering::TemporalOrderer;
use crate::error::Result;
use crate::models::{NormalizedRecord, OrderingKey, RaceConstructorSummary};

#[derive(Default)]
struct GroupAccumulator {
    key: Option<OrderingKey>,
    entries: usize,
    finishers: usize,
    total_points: f64,
    finish_sum: f64,
}

pub struct RaceLevelReducer;

impl RaceLevelReducer {
    /// Reduce records (visited in `order`) to one summary per (race, constructor),
    /// sorted by the key of each group's earliest record.
    pub fn reduce(records: &[NormalizedRecord], order: &[usize]) -> Result<Vec<RaceConstructorSummary>> {
        let mut groups: HashMap<(u32, u32), GroupAccumulator> = HashMap::new();

        for record in TemporalOrderer::resolve(records, order)? {
            let acc = groups
                .entry((record.race_id, record.constructor_id))
                .or_default();

            // Visiting in temporal order: the first record seen holds the smallest key
            if acc.key.is_none() {
                acc.key = Some(record.key);
            }
            acc.entries += 1;
            acc.total_points += record.points;

            // Non-finishers add points but not a finishing position
            if record.is_finished {
                if let Some(position) = record.position_order {
                    acc.finishers += 1;
                    acc.finish_sum += position as f64;
                }
            }
        }

        let mut summaries: Vec<RaceConstructorSummary> = groups
            .into_iter()
            .filter_map(|((race_id, constructor_id), acc)| {
                let key = acc.key?;
                Some(RaceConstructorSummary {
                    race_id,
                    constructor_id,
                    key,
                    entries: acc.entries,
                    finishers: acc.finishers,
                    total_points: acc.total_points,
                    mean_points: acc.total_points / acc.entries as f64,
                    mean_finish_position: if acc.finishers > 0 {
                        Some(acc.finish_sum / acc.finishers as f64)
                    } else {
                        None
                    },
                })
            })
            .collect();

        // Keys carry unique sequence numbers, so this sort is total
        summaries.sort_by_key(|s| s.key);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use crate::models::OutcomeStatus;

    fn record(
        sequence: usize,
        round: u32,
        constructor_id: u32,
        position: Option<u32>,
        points: f64,
        status: OutcomeStatus,
    ) -> NormalizedRecord {
        NormalizedRecord {
            key: OrderingKey {
                season: 2023,
                round,
                sequence,
            },
            race_id: 1000 + round,
            driver_id: sequence as u32,
            constructor_id,
            grid: None,
            grid_clean: None,
            position_order: position,
            points,
            status,
            is_podium: position.map_or(false, |p| p <= 3),
            is_finished: status == OutcomeStatus::Finished,
            is_dnf: status == OutcomeStatus::Retired,
            is_dns: status == OutcomeStatus::DidNotStart,
            position_gain: None,
        }
    }

    #[test]
    fn test_teammates_collapse_to_one_summary() {
        let records = vec![
            record(0, 1, 9, Some(1), 25.0, OutcomeStatus::Finished),
            record(1, 1, 9, Some(4), 12.0, OutcomeStatus::Finished),
            record(2, 1, 6, Some(2), 18.0, OutcomeStatus::Finished),
        ];
        let summaries = RaceLevelReducer::reduce(&records, &[0, 1, 2]).unwrap();

        assert_eq!(summaries.len(), 2);
        let red_bull = summaries.iter().find(|s| s.constructor_id == 9).unwrap();
        assert_eq!(red_bull.entries, 2);
        assert_eq!(red_bull.finishers, 2);
        assert!((red_bull.total_points - 37.0).abs() < 1e-9);
        assert!((red_bull.mean_points - 18.5).abs() < 1e-9);
        assert!((red_bull.mean_finish_position.unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(red_bull.key.sequence, 0);
    }

    #[test]
    fn test_non_finishers_excluded_from_position_mean() {
        let records = vec![
            record(0, 1, 9, Some(3), 15.0, OutcomeStatus::Finished),
            record(1, 1, 9, Some(19), 0.0, OutcomeStatus::Retired),
        ];
        let summaries = RaceLevelReducer::reduce(&records, &[0, 1]).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].entries, 2);
        assert_eq!(summaries[0].finishers, 1);
        assert!((summaries[0].mean_finish_position.unwrap() - 3.0).abs() < 1e-9);
        assert!((summaries[0].total_points - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_finishers_is_missing_not_zero() {
        let records = vec![
            record(0, 1, 3, Some(18), 0.0, OutcomeStatus::Retired),
            record(1, 1, 3, None, 0.0, OutcomeStatus::DidNotStart),
        ];
        let summaries = RaceLevelReducer::reduce(&records, &[0, 1]).unwrap();

        assert_eq!(summaries[0].finishers, 0);
        assert_eq!(summaries[0].mean_finish_position, None);
    }

    #[test]
    fn test_summaries_sorted_by_race() {
        let records = vec![
            record(0, 2, 9, Some(1), 25.0, OutcomeStatus::Finished),
            record(1, 1, 9, Some(2), 18.0, OutcomeStatus::Finished),
            record(2, 1, 6, Some(1), 25.0, OutcomeStatus::Finished),
        ];
        // Temporal order: round 1 records first
        let summaries = RaceLevelReducer::reduce(&records, &[1, 2, 0]).unwrap();

        let keys: Vec<_> = summaries.iter().map(|s| (s.key.round, s.constructor_id)).collect();
        assert_eq!(keys, vec![(1, 9), (1, 6), (2, 9)]);
    }

    #[test]
    fn test_group_key_is_earliest_record() {
        let records = vec![
            record(4, 1, 9, Some(2), 18.0, OutcomeStatus::Finished),
            record(7, 1, 9, Some(5), 10.0, OutcomeStatus::Finished),
        ];
        let summaries = RaceLevelReducer::reduce(&records, &[0, 1]).unwrap();
        assert_eq!(summaries[0].key.sequence, 4);
    }

    #[test]
    fn test_out_of_range_order_is_integrity_error() {
        let records = vec![record(0, 1, 9, Some(1), 25.0, OutcomeStatus::Finished)];
        let err = RaceLevelReducer::reduce(&records, &[0, 3]).unwrap_err();
        assert!(matches!(err, FeatureError::Integrity(_)));
    }
}
