//! Held-out evaluation of a classifier over extracted features.

pub mod metrics;
pub mod pipeline;
pub mod split;

pub use metrics::{accuracy, accuracy_percent, ConfusionMatrix};
pub use pipeline::{classify_samples, EvaluationPipeline, EvaluationReport, SamplePrediction};
pub use split::{test_count, train_test_split, TrainTestSplit};
