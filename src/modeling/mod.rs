//! Model-facing helpers: imputation and time-based splits

pub mod impute;
pub mod split;

pub use impute::{get_model_feature_names, Imputer, ModelInput, TrainMedians};
pub use split::{time_based_split, Seasonal, TimeSplit};
