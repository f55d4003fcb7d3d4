//! Cuisine classification of meal photos.
//!
//! Images are sorted into one directory per cuisine. Each image is turned into
//! a feature vector by a pretrained ONNX image network, and a one-vs-rest RBF
//! support vector classifier is trained on those vectors and scored on a
//! held-out tenth of the data.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cuisine_classifier::{
//!     assign_labels, BuiltinModel, EvaluationPipeline, ModelManager, OnnxFeatureExtractor,
//!     PipelineConfig, RbfSvm, RuntimeConfig,
//! };
//!
//! let config = PipelineConfig::default();
//! let model = BuiltinModel::ResNet50;
//! let model_path = ModelManager::new_default()?.require_model(&model.get_model_info().name)?;
//! let extractor = OnnxFeatureExtractor::new(
//!     &model_path,
//!     model.characteristics(),
//!     &RuntimeConfig::default(),
//!     None,
//! )?;
//!
//! let records = assign_labels(&config)?;
//! let mut classifier = RbfSvm::default();
//! let report = EvaluationPipeline::new(&config).run_on_records(&extractor, &mut classifier, &records)?;
//! println!("Accuracy: {:.1}%", report.accuracy_percent);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod model_manager;
pub mod models;
pub mod report;
mod runtime;

pub use classifier::{Classifier, ClassifierError, RbfSvm, SvmParams};
pub use config::{PipelineConfig, DEFAULT_CUISINES, DEFAULT_TEST_FRACTION};
pub use dataset::{assign_labels, prepare_data_set, DatasetManifest, ImageRecord};
pub use error::PipelineError;
pub use evaluation::{
    classify_samples, ConfusionMatrix, EvaluationPipeline, EvaluationReport, SamplePrediction,
};
pub use features::{FeatureExtractor, OnnxFeatureExtractor};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
