use crate::core::clustering::day_clusterer::ClusteringError;
use crate::core::clustering::normalise::NormaliseError;
use crate::core::reduction::ReductionError;
use crate::core::space_heat_demand::calibration::CalibrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypicalDaysError {
    #[error("Input was considered invalid due to error: {0}")]
    InvalidInput(#[from] anyhow::Error),
    #[error("Typical days are selected from a full year of {expected} days, got {days}")]
    IncompleteYear { days: usize, expected: usize },
    #[error("Error while normalising weather features: {0}")]
    Normalise(#[from] NormaliseError),
    #[error("Error while clustering days: {0}")]
    Clustering(#[from] ClusteringError),
    #[error("Error while reducing cluster labels: {0}")]
    Reduction(#[from] ReductionError),
    #[error("Error while calibrating heat load: {0}")]
    Calibration(#[from] CalibrationError),
}
