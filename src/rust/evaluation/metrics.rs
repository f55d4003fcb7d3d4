use crate::error::PipelineError;

/// Fraction of predictions equal to the true label, in [0, 1].
///
/// Returns 0.0 for empty input.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Accuracy as a percentage rounded to one decimal place
pub fn accuracy_percent(y_true: &[usize], y_pred: &[usize]) -> f64 {
    (accuracy(y_true, y_pred) * 1000.0).round() / 10.0
}

/// Counts of (true label, predicted label) pairs.
///
/// Sized to the whole class universe so rows and columns mean the same class
/// in every run; [`ConfusionMatrix::restrict_to_observed`] gives the compact
/// view over labels that actually occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n_classes: usize,
    /// Row-major, `counts[t * n_classes + p]`
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Tallies the pairs of `y_true` and `y_pred`
    ///
    /// # Errors
    /// - `LabelMismatch` if the slices differ in length or hold a label
    ///   outside `0..n_classes`
    pub fn new(n_classes: usize, y_true: &[usize], y_pred: &[usize]) -> Result<Self, PipelineError> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::LabelMismatch(format!(
                "True and predicted labels must have the same length, got {} and {}",
                y_true.len(), y_pred.len()
            )));
        }

        let mut counts = vec![0usize; n_classes * n_classes];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t >= n_classes || p >= n_classes {
                return Err(PipelineError::LabelMismatch(format!(
                    "Label pair ({}, {}) outside of {} classes", t, p, n_classes
                )));
            }
            counts[t * n_classes + p] += 1;
        }
        Ok(Self { n_classes, counts })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of examples with true label `t` predicted as `p`
    pub fn get(&self, t: usize, p: usize) -> usize {
        if t >= self.n_classes || p >= self.n_classes {
            return 0;
        }
        self.counts[t * self.n_classes + p]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|i| self.get(i, i)).sum()
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Sorted labels that occur as a true or a predicted label
    pub fn observed_labels(&self) -> Vec<usize> {
        (0..self.n_classes)
            .filter(|&i| (0..self.n_classes).any(|j| self.get(i, j) > 0 || self.get(j, i) > 0))
            .collect()
    }

    /// Compact matrix over [`observed_labels`](Self::observed_labels) only,
    /// returned with the labels its rows and columns stand for
    pub fn restrict_to_observed(&self) -> (Vec<usize>, Vec<Vec<usize>>) {
        let labels = self.observed_labels();
        let rows = labels.iter()
            .map(|&t| labels.iter().map(|&p| self.get(t, p)).collect())
            .collect();
        (labels, rows)
    }

    /// Full matrix as rows indexed by true label
    pub fn rows(&self) -> Vec<Vec<usize>> {
        self.counts.chunks(self.n_classes.max(1))
            .take(self.n_classes)
            .map(<[usize]>::to_vec)
            .collect()
    }
}
