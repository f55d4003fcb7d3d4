use std::io;
use std::path::PathBuf;

use crate::classifier::ClassifierError;
use crate::model_manager::ModelError;

/// Failures that abort a classification run.
///
/// Nothing in the pipeline retries or skips: every variant is fatal and is
/// propagated to the binary, which reports it and exits.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Dataset directory missing for class '{class}': {path:?}")]
    MissingDatasetDirectory { class: String, path: PathBuf },
    #[error("Sample image not found: {0:?}")]
    MissingSampleImage(PathBuf),
    #[error("Feature extraction failed: {0}")]
    FeatureExtractionFailure(String),
    #[error("Download failed: {0}")]
    DownloadFailure(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    #[error("Inconsistent labels: {0}")]
    LabelMismatch(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid dataset manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Report rendering failed: {0}")]
    Report(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        PipelineError::DownloadFailure(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::DownloadFailure(err.to_string())
    }
}

impl From<ort::Error> for PipelineError {
    fn from(err: ort::Error) -> Self {
        PipelineError::FeatureExtractionFailure(err.to_string())
    }
}
