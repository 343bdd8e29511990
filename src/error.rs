use polars::prelude::PolarsError;
use thiserror::Error;

/// Feature engine error types
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Malformed upstream input (unknown status, missing identifier, bad value)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Broken ordering/seeding invariant inside the engine
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Missing value could not be filled for model input
    #[error("Imputation error: {0}")]
    Imputation(String),

    /// Season split produced an unusable partition
    #[error("Split error: {0}")]
    Split(String),

    /// Invalid engine configuration
    #[error("Config error: {0}")]
    Config(String),

    #[error("Data frame error: {0}")]
    Data(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeatureError>;

/// Validation functions
pub fn validate_points(points: f64) -> Result<()> {
    if !points.is_finite() || points < 0.0 {
        return Err(FeatureError::Validation(format!(
            "Points must be a non-negative number, got {}",
            points
        )));
    }
    Ok(())
}

pub fn validate_round(round: u32) -> Result<()> {
    if round == 0 {
        return Err(FeatureError::Validation(
            "Round must be 1-based, got 0".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_grid(grid: i64) -> Result<()> {
    if grid < 0 {
        return Err(FeatureError::Validation(format!(
            "Starting position must be non-negative, got {}",
            grid
        )));
    }
    Ok(())
}

pub fn validate_position_order(position: u32) -> Result<()> {
    if position == 0 {
        return Err(FeatureError::Validation(
            "Finishing position must be 1-based, got 0".to_string(),
        ));
    }
    Ok(())
}
