//! Expanding (strictly prior) per-entity statistics
//!
//! For every observation the aggregator first emits the entity's statistics
//! over all earlier observations, and only then folds the current value into
//! the entity's running state. A value therefore never influences its own
//! row, nor any row at an earlier or equal key.
//!
//! # Example
//!
//! ```
//! use f1_features::core::expanding::{ExpandingAggregator, Observation};
//! use f1_features::models::OrderingKey;
//!
//! let key = |round| OrderingKey { season: 2023, round, sequence: round as usize };
//! let stats = ExpandingAggregator::run(vec![
//!     Observation::new(1u32, key(1), Some(25.0)),
//!     Observation::new(1u32, key(2), Some(18.0)),
//! ])
//! .unwrap();
//!
//! assert_eq!(stats[0].count, 0);
//! assert_eq!(stats[0].mean, None);
//! assert_eq!(stats[1].mean, Some(25.0));
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{FeatureError, Result};
use crate::models::OrderingKey;

/// One (entity, key, value) triple. `None` values count as an appearance
/// but do not enter mean/std.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<K> {
    pub entity: K,
    pub key: OrderingKey,
    pub value: Option<f64>,
}

impl<K> Observation<K> {
    pub fn new(entity: K, key: OrderingKey, value: Option<f64>) -> Self {
        Self { entity, key, value }
    }
}

/// Statistics over an entity's strictly prior observations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandingStats {
    /// Prior appearances of the entity
    pub count: u32,
    /// Prior appearances that carried a value
    pub samples: u32,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); None below two samples
    pub std_dev: Option<f64>,
}

impl ExpandingStats {
    pub const EMPTY: ExpandingStats = ExpandingStats {
        count: 0,
        samples: 0,
        mean: None,
        std_dev: None,
    };
}

/// Running state for one entity
#[derive(Debug, Clone, Default)]
struct EntityHistory {
    count: u32,
    samples: u32,
    sum: f64,
    sum_sq: f64,
    last_key: Option<OrderingKey>,
}

impl EntityHistory {
    fn snapshot(&self) -> ExpandingStats {
        let n = self.samples as f64;
        let mean = if self.samples > 0 {
            Some(self.sum / n)
        } else {
            None
        };
        let std_dev = if self.samples > 1 {
            // Sum-of-squares form; clamp rounding noise below zero
            let variance = ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0);
            Some(variance.sqrt())
        } else {
            None
        };
        ExpandingStats {
            count: self.count,
            samples: self.samples,
            mean,
            std_dev,
        }
    }

    fn update(&mut self, key: OrderingKey, value: Option<f64>) {
        self.count += 1;
        if let Some(v) = value {
            self.samples += 1;
            self.sum += v;
            self.sum_sq += v * v;
        }
        self.last_key = Some(key);
    }
}

/// Single-pass emit-before-update aggregator.
///
/// State lives only for the lifetime of one aggregator; build a new one per pass.
#[derive(Debug)]
pub struct ExpandingAggregator<K> {
    histories: HashMap<K, EntityHistory>,
    last_key: Option<OrderingKey>,
}

impl<K> Default for ExpandingAggregator<K> {
    fn default() -> Self {
        Self {
            histories: HashMap::new(),
            last_key: None,
        }
    }
}

impl<K> ExpandingAggregator<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the entity's prior statistics, then record this observation.
    ///
    /// Observations must arrive in non-decreasing key order, and an entity may
    /// not be observed twice at the same key.
    pub fn observe(&mut self, observation: &Observation<K>) -> Result<ExpandingStats> {
        if let Some(last) = self.last_key {
            if observation.key < last {
                return Err(FeatureError::Integrity(format!(
                    "observation for {:?} at {:?} arrived after {:?}",
                    observation.entity, observation.key, last
                )));
            }
        }
        self.last_key = Some(observation.key);

        let history = self.histories.entry(observation.entity.clone()).or_default();
        if history.last_key == Some(observation.key) {
            return Err(FeatureError::Integrity(format!(
                "{:?} observed twice at {:?}",
                observation.entity, observation.key
            )));
        }

        let stats = history.snapshot();
        history.update(observation.key, observation.value);
        Ok(stats)
    }

    /// Run a complete pass; output is aligned with the input sequence
    pub fn run<I>(observations: I) -> Result<Vec<ExpandingStats>>
    where
        I: IntoIterator<Item = Observation<K>>,
    {
        let mut aggregator = Self::new();
        observations
            .into_iter()
            .map(|obs| aggregator.observe(&obs))
            .collect()
    }

    /// Number of distinct entities seen so far
    pub fn entities(&self) -> usize {
        self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(round: u32) -> OrderingKey {
        OrderingKey {
            season: 2023,
            round,
            sequence: round as usize,
        }
    }

    #[test]
    fn test_numeric_example() {
        let obs = vec![
            Observation::new("ver", key(1), Some(25.0)),
            Observation::new("ver", key(2), Some(18.0)),
            Observation::new("ver", key(3), Some(25.0)),
            Observation::new("ver", key(4), Some(0.0)),
        ];
        let stats = ExpandingAggregator::run(obs).unwrap();

        assert_eq!(stats[3].count, 3);
        assert!((stats[3].mean.unwrap() - 22.6667).abs() < 1e-4);
        assert!((stats[3].std_dev.unwrap() - 4.0415).abs() < 1e-3);
    }

    #[test]
    fn test_first_appearance_is_empty() {
        let stats = ExpandingAggregator::run(vec![Observation::new(7u32, key(1), Some(10.0))]).unwrap();
        assert_eq!(stats[0], ExpandingStats::EMPTY);
    }

    #[test]
    fn test_single_prior_has_no_std() {
        let stats = ExpandingAggregator::run(vec![
            Observation::new(7u32, key(1), Some(10.0)),
            Observation::new(7u32, key(2), Some(4.0)),
        ])
        .unwrap();
        assert_eq!(stats[1].count, 1);
        assert_eq!(stats[1].mean, Some(10.0));
        assert_eq!(stats[1].std_dev, None);
    }

    #[test]
    fn test_constant_values_give_zero_std() {
        let obs: Vec<_> = (1..=5).map(|r| Observation::new(1u32, key(r), Some(0.1))).collect();
        let stats = ExpandingAggregator::run(obs).unwrap();
        let std = stats[4].std_dev.unwrap();
        assert!(std >= 0.0);
        assert!(std < 1e-6);
    }

    #[test]
    fn test_entities_are_independent() {
        let obs = vec![
            Observation::new(1u32, key(1), Some(25.0)),
            Observation::new(2u32, key(2), Some(1.0)),
            Observation::new(1u32, key(3), Some(18.0)),
            Observation::new(2u32, key(4), Some(3.0)),
        ];
        let stats = ExpandingAggregator::run(obs).unwrap();

        assert_eq!(stats[1].count, 0);
        assert_eq!(stats[2].mean, Some(25.0));
        assert_eq!(stats[3].mean, Some(1.0));
    }

    #[test]
    fn test_missing_values_count_but_do_not_average() {
        let obs = vec![
            Observation::new(1u32, key(1), None),
            Observation::new(1u32, key(2), Some(4.0)),
            Observation::new(1u32, key(3), Some(6.0)),
        ];
        let stats = ExpandingAggregator::run(obs).unwrap();

        assert_eq!(stats[1].count, 1);
        assert_eq!(stats[1].samples, 0);
        assert_eq!(stats[1].mean, None);
        assert_eq!(stats[2].count, 2);
        assert_eq!(stats[2].samples, 1);
        assert_eq!(stats[2].mean, Some(4.0));
    }

    #[test]
    fn test_count_increases_by_one() {
        let obs: Vec<_> = (1..=10)
            .map(|r| Observation::new(1u32, key(r), Some(r as f64)))
            .collect();
        let stats = ExpandingAggregator::run(obs).unwrap();
        for (i, s) in stats.iter().enumerate() {
            assert_eq!(s.count, i as u32);
        }
    }

    #[test]
    fn test_out_of_order_input_rejected() {
        let err = ExpandingAggregator::run(vec![
            Observation::new(1u32, key(2), Some(1.0)),
            Observation::new(2u32, key(1), Some(1.0)),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::Integrity(_)));
    }

    #[test]
    fn test_same_entity_same_key_rejected() {
        let err = ExpandingAggregator::run(vec![
            Observation::new(1u32, key(2), Some(1.0)),
            Observation::new(1u32, key(2), Some(1.0)),
        ])
        .unwrap_err();
        assert!(matches!(err, FeatureError::Integrity(_)));
    }

    #[test]
    fn test_emit_before_update_on_streaming_use() {
        let mut aggregator = ExpandingAggregator::new();
        let first = aggregator.observe(&Observation::new(1u32, key(1), Some(8.0))).unwrap();
        let second = aggregator.observe(&Observation::new(1u32, key(2), Some(2.0))).unwrap();

        assert_eq!(first.mean, None);
        assert_eq!(second.mean, Some(8.0));
        assert_eq!(aggregator.entities(), 1);
    }
}
