//! Unsupervised anomaly model for consumer behaviour profiles.

mod isolation;
mod scaler;

pub use isolation::{average_path_length, IsolationForest};
pub use scaler::RobustScaler;
