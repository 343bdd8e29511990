//! Data loading and feature table export

pub mod csv_loader;
pub mod writer;

// Re-export commonly used functions
pub use csv_loader::{load_records, records_from_dataframe};
pub use writer::{
    model_inputs_to_dataframe, to_dataframe, write_csv, write_csv_to, write_model_csv, FEATURE_COLUMNS,
};
