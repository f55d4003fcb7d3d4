//! Support vector classification with a gaussian (RBF) kernel.
//!
//! Multiclass problems are reduced to one binary machine per class
//! (one-vs-rest), each trained with `linfa-svm`. A row is assigned the class
//! whose machine reports the largest decision value
//!
//! ```text
//! f(x) = Σ αᵢ·exp(-γ‖x - xᵢ‖²) - ρ
//! ```

use linfa::prelude::*;
use linfa::Dataset;
use linfa_svm::Svm;
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{Classifier, ClassifierError};

/// Hyperparameters of [`RbfSvm`]
#[derive(Debug, Clone, PartialEq)]
pub struct SvmParams {
    /// Penalty for misclassified training rows
    pub c: f64,
    /// Kernel width. `None` uses `1 / n_features`.
    pub gamma: Option<f64>,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self { c: 1.0, gamma: None }
    }
}

/// Binary machine separating one class from all others
#[derive(Debug, Clone)]
struct OneVsRest {
    label: usize,
    alpha: Vec<f64>,
    rho: f64,
}

#[derive(Debug, Clone)]
struct FittedModel {
    support_vectors: Array2<f64>,
    gamma: f64,
    machines: Vec<OneVsRest>,
}

/// One-vs-rest RBF support vector classifier
#[derive(Debug, Clone, Default)]
pub struct RbfSvm {
    params: SvmParams,
    model: Option<FittedModel>,
}

impl RbfSvm {
    pub fn new(params: SvmParams) -> Self {
        Self { params, model: None }
    }

    pub fn params(&self) -> &SvmParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Labels seen during fitting, ascending
    pub fn classes(&self) -> Vec<usize> {
        self.model.as_ref()
            .map(|m| m.machines.iter().map(|c| c.label).collect())
            .unwrap_or_default()
    }

    /// Kernel width in use, once fitted
    pub fn gamma(&self) -> Option<f64> {
        self.model.as_ref().map(|m| m.gamma)
    }

    fn validate_training_data(x: &ArrayView2<'_, f32>, y: &[usize]) -> Result<Vec<usize>, ClassifierError> {
        if x.nrows() == 0 {
            return Err(ClassifierError::ValidationError("Training set cannot be empty".into()));
        }
        if x.nrows() != y.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Features and labels must have the same length, got {} and {}",
                x.nrows(), y.len()
            )));
        }
        if x.ncols() == 0 {
            return Err(ClassifierError::ValidationError("Feature vectors cannot be empty".into()));
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::ValidationError(format!(
                "Training set must contain at least 2 classes, found {}",
                classes.len()
            )));
        }
        Ok(classes)
    }
}

fn kernel_row(model: &FittedModel, x: ArrayView1<'_, f64>) -> Array1<f64> {
    model.support_vectors.rows()
        .into_iter()
        .map(|sv| {
            let sq_dist: f64 = sv.iter().zip(x.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
            (-model.gamma * sq_dist).exp()
        })
        .collect()
}

impl Classifier for RbfSvm {
    fn fit(&mut self, x: ArrayView2<'_, f32>, y: &[usize]) -> Result<(), ClassifierError> {
        let classes = Self::validate_training_data(&x, y)?;
        if self.params.c <= 0.0 {
            return Err(ClassifierError::ValidationError(format!("C must be positive, got {}", self.params.c)));
        }

        let gamma = self.params.gamma.unwrap_or(1.0 / x.ncols() as f64);
        if gamma <= 0.0 {
            return Err(ClassifierError::ValidationError(format!("Gamma must be positive, got {}", gamma)));
        }
        let records: Array2<f64> = x.mapv(f64::from);
        info!(
            "Fitting RBF SVM: {} rows, {} features, {} classes (C={}, gamma={})",
            records.nrows(), records.ncols(), classes.len(), self.params.c, gamma
        );

        let mut machines = Vec::with_capacity(classes.len());
        for &label in &classes {
            let targets: Array1<bool> = y.iter().map(|&l| l == label).collect();
            let dataset = Dataset::new(records.clone(), targets);

            // linfa's gaussian kernel divides by its width instead of multiplying
            let svm = Svm::<f64, bool>::params()
                .pos_neg_weights(self.params.c, self.params.c)
                .gaussian_kernel(1.0 / gamma)
                .fit(&dataset)?;
            debug!("Class {}: rho={}", label, svm.rho);

            machines.push(OneVsRest {
                label,
                alpha: svm.alpha.clone(),
                rho: svm.rho,
            });
        }

        self.model = Some(FittedModel {
            support_vectors: records,
            gamma,
            machines,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Vec<usize>, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotFitted)?;
        if x.ncols() != model.support_vectors.ncols() {
            return Err(ClassifierError::ValidationError(format!(
                "Expected {} features per row, got {}",
                model.support_vectors.ncols(), x.ncols()
            )));
        }

        let rows = x.mapv(f64::from);
        let mut predictions = Vec::with_capacity(rows.nrows());
        for row in rows.rows() {
            let kernel = kernel_row(model, row);

            let mut best: Option<(usize, f64)> = None;
            for machine in &model.machines {
                let score: f64 = machine.alpha.iter()
                    .zip(kernel.iter())
                    .map(|(a, k)| a * k)
                    .sum::<f64>() - machine.rho;
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((machine.label, score));
                }
            }

            let (label, _) = best.ok_or_else(|| {
                ClassifierError::PredictionError("No trained machines available".into())
            })?;
            predictions.push(label);
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Three tight clusters around (0,0), (6,6) and (0,6)
    fn clusters() -> (Array2<f32>, Vec<usize>) {
        let offsets = [(0.0, 0.0), (0.3, -0.2), (-0.25, 0.3), (0.2, 0.25), (-0.3, -0.3)];
        let centres = [(0.0, 0.0), (6.0, 6.0), (0.0, 6.0)];
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for (label, (cx, cy)) in centres.iter().enumerate() {
            for (dx, dy) in offsets {
                data.push(cx + dx);
                data.push(cy + dy);
                labels.push(label);
            }
        }
        (Array2::from_shape_vec((labels.len(), 2), data).unwrap(), labels)
    }

    #[test]
    fn test_fit_and_predict_separable_clusters() {
        let (x, y) = clusters();
        let mut svm = RbfSvm::default();
        svm.fit(x.view(), &y).unwrap();

        assert!(svm.is_fitted());
        assert_eq!(svm.classes(), vec![0, 1, 2]);
        assert_eq!(svm.gamma(), Some(0.5));

        let queries = array![[0.1f32, 0.1], [5.9, 6.1], [0.1, 5.8]];
        assert_eq!(svm.predict(queries.view()).unwrap(), vec![0, 1, 2]);
        assert_eq!(svm.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_predict_before_fit() {
        let svm = RbfSvm::default();
        let queries = array![[0.0f32, 0.0]];
        assert_eq!(svm.predict(queries.view()), Err(ClassifierError::NotFitted));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0f32, 1.0], [1.0, 0.0]];
        let mut svm = RbfSvm::default();
        assert!(matches!(svm.fit(x.view(), &[3, 3]), Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let x = array![[0.0f32, 1.0], [1.0, 0.0]];
        let mut svm = RbfSvm::default();
        assert!(matches!(svm.fit(x.view(), &[0]), Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_feature_width_checked_on_predict() {
        let (x, y) = clusters();
        let mut svm = RbfSvm::new(SvmParams { c: 1.0, gamma: Some(0.5) });
        svm.fit(x.view(), &y).unwrap();

        let queries = array![[0.0f32, 0.0, 0.0]];
        assert!(matches!(svm.predict(queries.view()), Err(ClassifierError::ValidationError(_))));
    }
}
