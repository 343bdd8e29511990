//! Time-based train/test split
//!
//! Splits by season window instead of at random, so no test season can leak
//! into training.

use crate::config::{SeasonRange, SplitConfig};
use crate::error::{FeatureError, Result};
use crate::models::FeatureRow;

/// Rows that carry a season
pub trait Seasonal {
    fn season(&self) -> i32;
}

impl Seasonal for FeatureRow {
    fn season(&self) -> i32 {
        self.season
    }
}

/// Train and test partitions, borrowed from the input
#[derive(Debug)]
pub struct TimeSplit<'a, T> {
    pub train: Vec<&'a T>,
    pub test: Vec<&'a T>,
}

/// Partition rows by the configured season windows.
///
/// Rows outside both windows are dropped. Fails if either side is empty.
pub fn time_based_split<'a, T: Seasonal>(rows: &'a [T], config: &SplitConfig) -> Result<TimeSplit<'a, T>> {
    let select = |range: &SeasonRange| -> Vec<&'a T> {
        rows.iter().filter(|r| range.contains(r.season())).collect()
    };
    let train = select(&config.train);
    let test = select(&config.test);

    if train.is_empty() || test.is_empty() {
        return Err(FeatureError::Split(format!(
            "time split produced an empty set: train rows {} ({}), test rows {} ({})",
            train.len(),
            config.train,
            test.len(),
            config.test
        )));
    }

    Ok(TimeSplit { train, test })
}
