//! F1 Features - leakage-free historical features for race results
//!
//! This library provides:
//! - Record normalization (grid sentinels, outcome flags)
//! - A single deterministic temporal order over all records
//! - Race-level constructor reduction and expanding per-entity statistics
//! - Feature table assembly, CSV import/export, imputation and season splits
//!
//! # Example
//!
//! ```
//! use f1_features::{FeatureEngine, RawRaceRecord};
//!
//! let record = |round: u32, race_id: u32, points: f64| RawRaceRecord {
//!     season: 2023,
//!     round,
//!     race_id,
//!     driver_id: 830,
//!     constructor_id: 9,
//!     grid: Some(1),
//!     position_order: Some(1),
//!     points,
//!     status: "Finished".to_string(),
//! };
//!
//! let table = FeatureEngine::with_defaults()
//!     .build(&[record(1, 1098, 25.0), record(2, 1099, 25.0)])
//!     .unwrap();
//!
//! let second = table.get(830, 1099).unwrap();
//! assert_eq!(second.driver_races_past, 1);
//! assert_eq!(second.driver_avg_points_past, Some(25.0));
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod modeling;
pub mod models;

// Re-export commonly used types
pub use crate::config::{EngineConfig, SeasonRange, SplitConfig};
pub use crate::core::{FeatureEngine, FeatureTable, TableSummary};
pub use crate::error::{FeatureError, Result};
pub use crate::models::{FeatureRow, OrderingKey, OutcomeStatus, RawRaceRecord};
