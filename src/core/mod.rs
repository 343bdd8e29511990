//! Temporal feature derivation engine

pub mod assembler;
pub mod expanding;
pub mod history;
pub mod normalizer;
pub mod ordering;
pub mod pipeline;
pub mod reducer;

// Re-export commonly used types
pub use assembler::FeatureAssembler;
pub use expanding::{ExpandingAggregator, ExpandingStats, Observation};
pub use history::{ConstructorHistory, DriverHistory};
pub use normalizer::RecordNormalizer;
pub use ordering::TemporalOrderer;
pub use pipeline::{FeatureEngine, FeatureTable, TableSummary};
pub use reducer::RaceLevelReducer;
