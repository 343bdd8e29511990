//! Model-input imputation
//!
//! Feature rows keep missing history as `None`. Regression models need dense
//! inputs, so this step fills history gaps with zero (no history means no
//! points) or with medians fitted on training seasons only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::split::Seasonal;
use crate::config::SeasonRange;
use crate::error::{FeatureError, Result};
use crate::models::FeatureRow;

/// Median fill values, fitted on training seasons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainMedians {
    pub driver_consistency_past: Option<f64>,
    pub constructor_avg_finish_past: Option<f64>,
}

impl TrainMedians {
    pub fn fit(rows: &[FeatureRow], train: SeasonRange) -> Self {
        let in_train = move || rows.iter().filter(move |r| train.contains(r.season));
        let medians = Self {
            driver_consistency_past: median(in_train().filter_map(|r| r.driver_consistency_past).collect()),
            constructor_avg_finish_past: median(
                in_train().filter_map(|r| r.constructor_avg_finish_past).collect(),
            ),
        };
        debug!("Fitted train medians over {}: {:?}", train, medians);
        medians
    }
}

/// Median of the values; mean of the middle pair for even counts
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Dense model input derived from a feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub season: i32,
    pub race_id: u32,
    pub driver_id: u32,
    pub constructor_id: u32,
    pub grid_clean: Option<u32>,
    pub driver_races_past: f64,
    pub driver_avg_points_past: f64,
    pub driver_consistency_past: f64,
    pub constructor_races_past: f64,
    pub constructor_strength_past: f64,
    pub constructor_avg_finish_past: f64,
    /// Regression target
    pub points: f64,
}

impl Seasonal for ModelInput {
    fn season(&self) -> i32 {
        self.season
    }
}

impl ModelInput {
    /// Flatten the numeric features (grid excluded, it may be missing)
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.driver_races_past,
            self.driver_avg_points_past,
            self.driver_consistency_past,
            self.constructor_races_past,
            self.constructor_strength_past,
            self.constructor_avg_finish_past,
        ]
    }
}

/// Names matching `ModelInput::to_vec` order
pub fn get_model_feature_names() -> Vec<&'static str> {
    vec![
        "driver_races_past",
        "driver_avg_points_past",
        "driver_consistency_past",
        "constructor_races_past",
        "constructor_strength_past",
        "constructor_avg_finish_past",
    ]
}

pub struct Imputer {
    medians: TrainMedians,
}

impl Imputer {
    pub fn new(medians: TrainMedians) -> Self {
        Self { medians }
    }

    pub fn fit(rows: &[FeatureRow], train: SeasonRange) -> Self {
        Self::new(TrainMedians::fit(rows, train))
    }

    pub fn medians(&self) -> &TrainMedians {
        &self.medians
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Vec<ModelInput>> {
        rows.iter().map(|r| self.transform_one(r)).collect()
    }

    pub fn transform_one(&self, row: &FeatureRow) -> Result<ModelInput> {
        Ok(ModelInput {
            season: row.season,
            race_id: row.race_id,
            driver_id: row.driver_id,
            constructor_id: row.constructor_id,
            grid_clean: row.grid_clean,
            driver_races_past: row.driver_races_past as f64,
            driver_avg_points_past: row.driver_avg_points_past.unwrap_or(0.0),
            driver_consistency_past: fill(
                row.driver_consistency_past,
                self.medians.driver_consistency_past,
                "driver_consistency_past",
            )?,
            constructor_races_past: row.constructor_races_past as f64,
            constructor_strength_past: row.constructor_strength_past.unwrap_or(0.0),
            constructor_avg_finish_past: fill(
                row.constructor_avg_finish_past,
                self.medians.constructor_avg_finish_past,
                "constructor_avg_finish_past",
            )?,
            points: row.points,
        })
    }
}

fn fill(value: Option<f64>, median: Option<f64>, column: &str) -> Result<f64> {
    value.or(median).ok_or_else(|| {
        FeatureError::Imputation(format!(
            "{} is missing and no training median is available",
            column
        ))
    })
}
