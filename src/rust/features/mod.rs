use std::path::PathBuf;

use ndarray::Array2;

use crate::dataset::ImageRecord;
use crate::error::PipelineError;

pub mod onnx;
pub mod preprocessing;

pub use onnx::OnnxFeatureExtractor;

/// Turns images into fixed-length feature vectors.
///
/// Implementations return one row per input path, in input order, and every
/// row of a run has the same length.
pub trait FeatureExtractor {
    /// Length of the produced vectors, if known before the first extraction
    fn feature_size(&self) -> Option<usize>;

    /// Extracts one feature row per image
    ///
    /// # Errors
    /// - `FeatureExtractionFailure` if any image cannot be read or processed
    fn extract(&self, paths: &[PathBuf]) -> Result<Array2<f32>, PipelineError>;
}

/// Extracts the features of every record, keeping record order
pub fn extract_records(
    extractor: &dyn FeatureExtractor,
    records: &[ImageRecord],
) -> Result<Array2<f32>, PipelineError> {
    let paths: Vec<PathBuf> = records.iter().map(|r| r.path.clone()).collect();
    extractor.extract(&paths)
}

/// Stacks per-image vectors into a matrix, rejecting ragged input
pub fn stack_features(rows: Vec<Vec<f32>>) -> Result<Array2<f32>, PipelineError> {
    let n_rows = rows.len();
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(pos) = rows.iter().position(|r| r.len() != width) {
        return Err(PipelineError::FeatureExtractionFailure(format!(
            "Feature vector {} has length {}, expected {}",
            pos, rows[pos].len(), width
        )));
    }
    let data: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, width), data)
        .map_err(|e| PipelineError::FeatureExtractionFailure(format!("Failed to stack features: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_features() {
        let matrix = stack_features(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(matrix.dim(), (3, 2));
        assert_eq!(matrix[[2, 1]], 6.0);
    }

    #[test]
    fn test_stack_rejects_ragged_rows() {
        let result = stack_features(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(PipelineError::FeatureExtractionFailure(_))));
    }

    #[test]
    fn test_stack_empty() {
        let matrix = stack_features(Vec::new()).unwrap();
        assert_eq!(matrix.dim(), (0, 0));
    }
}
