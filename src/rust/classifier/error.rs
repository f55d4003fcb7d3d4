use std::fmt;

/// Represents the different types of errors that can occur while training or
/// querying a classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Error occurred during fitting
    TrainingError(String),
    /// Error occurred while making predictions
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// The classifier was queried before being fitted
    NotFitted,
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrainingError(msg) => write!(f, "Training error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::NotFitted => write!(f, "Classifier has not been fitted"),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<linfa_svm::SvmError> for ClassifierError {
    fn from(err: linfa_svm::SvmError) -> Self {
        ClassifierError::TrainingError(err.to_string())
    }
}
