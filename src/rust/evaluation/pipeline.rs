use std::path::PathBuf;

use log::info;
use ndarray::ArrayView2;

use super::metrics::{accuracy_percent, ConfusionMatrix};
use super::split::train_test_split;
use crate::classifier::Classifier;
use crate::config::PipelineConfig;
use crate::dataset::ImageRecord;
use crate::error::PipelineError;
use crate::features::{extract_records, FeatureExtractor};

/// Outcome of one train/test evaluation
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Test accuracy in percent, rounded to one decimal place
    pub accuracy_percent: f64,
    pub y_true: Vec<usize>,
    pub y_pred: Vec<usize>,
    pub confusion: ConfusionMatrix,
    pub n_train: usize,
    pub n_test: usize,
}

/// A sample image with the class the trained classifier assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePrediction {
    pub path: PathBuf,
    pub label: usize,
    pub class_name: String,
}

/// Splits labelled features, fits a classifier on the training part and
/// scores it on the held-out part.
pub struct EvaluationPipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> EvaluationPipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Evaluates `classifier` on index-aligned feature rows and labels.
    ///
    /// The classifier is left fitted on the training partition so it can be
    /// reused for further predictions.
    ///
    /// # Errors
    /// - `LabelMismatch` if rows and labels differ in length or a label is
    ///   not a valid class index
    /// - `InsufficientData` if the split leaves a side empty
    /// - `Classifier` if fitting or prediction fails
    pub fn run(
        &self,
        classifier: &mut dyn Classifier,
        features: ArrayView2<'_, f32>,
        labels: &[usize],
    ) -> Result<EvaluationReport, PipelineError> {
        let n_classes = self.config.num_classes();
        if let Some(bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(PipelineError::LabelMismatch(format!(
                "Label {} is not a valid index into {} classes", bad, n_classes
            )));
        }

        let split = train_test_split(features, labels, self.config.test_fraction, self.config.seed)?;
        info!(
            "Split {} examples into {} training and {} test",
            labels.len(), split.y_train.len(), split.y_test.len()
        );

        classifier.fit(split.x_train.view(), &split.y_train)?;
        let y_pred = classifier.predict(split.x_test.view())?;

        let confusion = ConfusionMatrix::new(n_classes, &split.y_test, &y_pred)?;
        let accuracy_percent = accuracy_percent(&split.y_test, &y_pred);
        info!("Test accuracy: {:.1}%", accuracy_percent);

        Ok(EvaluationReport {
            accuracy_percent,
            n_train: split.y_train.len(),
            n_test: split.y_test.len(),
            y_true: split.y_test,
            y_pred,
            confusion,
        })
    }

    /// Extracts features for `records` and evaluates `classifier` on them
    pub fn run_on_records(
        &self,
        extractor: &dyn FeatureExtractor,
        classifier: &mut dyn Classifier,
        records: &[ImageRecord],
    ) -> Result<EvaluationReport, PipelineError> {
        let features = extract_records(extractor, records)?;
        let labels: Vec<usize> = records.iter().map(|r| r.label).collect();
        self.run(classifier, features.view(), &labels)
    }
}

/// Runs the configured sample meals through the extractor and an already
/// fitted classifier.
///
/// # Errors
/// - `MissingSampleImage` if a sample file does not exist
/// - any extraction or prediction error
pub fn classify_samples(
    extractor: &dyn FeatureExtractor,
    classifier: &dyn Classifier,
    config: &PipelineConfig,
) -> Result<Vec<SamplePrediction>, PipelineError> {
    if config.sample_meals.is_empty() {
        return Ok(Vec::new());
    }
    let paths: Vec<PathBuf> = config.sample_meals.iter().map(|p| config.resolve(p)).collect();
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        return Err(PipelineError::MissingSampleImage(missing.clone()));
    }

    let features = extractor.extract(&paths)?;
    let labels = classifier.predict(features.view())?;

    paths.into_iter()
        .zip(labels)
        .map(|(path, label)| {
            let class_name = config.class_name(label)
                .ok_or_else(|| PipelineError::LabelMismatch(format!("Predicted unknown label {}", label)))?
                .to_string();
            Ok(SamplePrediction { path, label, class_name })
        })
        .collect()
}
