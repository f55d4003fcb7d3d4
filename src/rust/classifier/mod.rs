use ndarray::ArrayView2;

mod error;
pub mod svm;

pub use error::ClassifierError;
pub use svm::{RbfSvm, SvmParams};

/// A supervised classifier over feature rows: fitted once, then queried.
///
/// Labels are class indices. Rows of `x` line up with entries of `y`.
pub trait Classifier {
    /// Trains on the given rows, replacing any previous fit
    fn fit(&mut self, x: ArrayView2<'_, f32>, y: &[usize]) -> Result<(), ClassifierError>;

    /// Predicts one label per row
    fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Vec<usize>, ClassifierError>;
}
