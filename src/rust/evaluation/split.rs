use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// Rows and labels divided into disjoint training and test partitions
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f32>,
    pub x_test: Array2<f32>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
}

/// Number of rows reserved for testing: `ceil(test_fraction * n_samples)`
pub fn test_count(n_samples: usize, test_fraction: f64) -> usize {
    (n_samples as f64 * test_fraction).ceil() as usize
}

/// Shuffles indices with optional random seed.
fn shuffle_indices(n_samples: usize, seed: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();

    if let Some(seed) = seed {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    } else {
        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);
    }

    indices
}

/// Randomly splits index-aligned rows and labels into training and test sets.
///
/// The shuffle ignores labels, so small datasets can end up with classes
/// missing from either side. Without a seed every call draws a new split.
///
/// # Errors
/// - `InvalidConfig` if `test_fraction` is not strictly between 0 and 1
/// - `LabelMismatch` if rows and labels differ in length
/// - `InsufficientData` if either side would be empty
pub fn train_test_split(
    x: ArrayView2<'_, f32>,
    y: &[usize],
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit, PipelineError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "Test fraction must be between 0 and 1, got {}", test_fraction
        )));
    }

    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(PipelineError::LabelMismatch(format!(
            "Features and labels must have the same number of samples, got {} and {}",
            n_samples, y.len()
        )));
    }

    let n_test = test_count(n_samples, test_fraction);
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "Split would result in empty train or test set (n_train={}, n_test={})",
            n_train, n_test
        )));
    }

    let indices = shuffle_indices(n_samples, seed);
    let (test_indices, train_indices) = indices.split_at(n_test);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), train_indices),
        x_test: x.select(Axis(0), test_indices),
        y_train: train_indices.iter().map(|&i| y[i]).collect(),
        y_test: test_indices.iter().map(|&i| y[i]).collect(),
    })
}
