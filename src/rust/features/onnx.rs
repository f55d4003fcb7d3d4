use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::preprocessing::{image_to_tensor, load_image};
use super::{stack_features, FeatureExtractor};
use crate::error::PipelineError;
use crate::models::ModelCharacteristics;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Feature extractor backed by a pretrained network in ONNX format.
///
/// Each image is run through the network on its own and the chosen output is
/// flattened into the image's feature vector. The network should be a headless
/// export whose output is an intermediate activation such as a pooling layer;
/// the first graph output is read unless `output_name` picks another one.
#[derive(Debug)]
pub struct OnnxFeatureExtractor {
    model_path: PathBuf,
    session: Session,
    input_name: String,
    output_name: Option<String>,
    characteristics: ModelCharacteristics,
}

impl OnnxFeatureExtractor {
    /// Loads the network from `model_path`
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `characteristics` - Input size and normalisation of the network
    /// * `runtime_config` - ONNX Runtime threading and optimisation settings
    /// * `output_name` - Graph output to read features from; the first output when `None`
    ///
    /// # Errors
    /// - `FeatureExtractionFailure` if the file is missing, fails to load,
    ///   or lacks the requested input/output
    pub fn new(
        model_path: &Path,
        characteristics: ModelCharacteristics,
        runtime_config: &RuntimeConfig,
        output_name: Option<String>,
    ) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::FeatureExtractionFailure(
                format!("Model file not found: {:?}", model_path)
            ));
        }

        let session = create_session_builder(runtime_config)?
            .commit_from_file(model_path)?;
        let input_name = Self::validate_model(&session, output_name.as_deref())?;
        info!("Loaded feature network from {:?} (input '{}')", model_path, input_name);

        Ok(Self {
            model_path: model_path.to_path_buf(),
            session,
            input_name,
            output_name,
            characteristics,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn characteristics(&self) -> &ModelCharacteristics {
        &self.characteristics
    }

    /// Checks the graph has an input and the requested output, returning the input name
    fn validate_model(session: &Session, output_name: Option<&str>) -> Result<String, PipelineError> {
        let input = session.inputs.first().ok_or_else(|| {
            PipelineError::FeatureExtractionFailure("Model must have at least 1 image input".into())
        })?;
        if session.outputs.is_empty() {
            return Err(PipelineError::FeatureExtractionFailure(
                "Model must have at least 1 output for features".into()
            ));
        }
        if let Some(name) = output_name {
            if !session.outputs.iter().any(|o| o.name == name) {
                let available: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
                return Err(PipelineError::FeatureExtractionFailure(format!(
                    "Model has no output '{}' (available: {:?})", name, available
                )));
            }
        }
        Ok(input.name.clone())
    }

    fn extract_one(&self, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let img = load_image(path)?;
        let input = image_to_tensor(&img, &self.characteristics);
        let tensor = Tensor::from_array(input)?;

        let outputs = self.session.run(ort::inputs![self.input_name.as_str() => tensor]?)
            .map_err(|e| PipelineError::FeatureExtractionFailure(
                format!("Failed to run model on {:?}: {}", path, e)
            ))?;
        let output = match &self.output_name {
            Some(name) => &outputs[name.as_str()],
            None => &outputs[0],
        };
        let features = output.try_extract_tensor::<f32>()?;
        Ok(features.iter().copied().collect())
    }
}

impl FeatureExtractor for OnnxFeatureExtractor {
    fn feature_size(&self) -> Option<usize> {
        self.characteristics.feature_size
    }

    fn extract(&self, paths: &[PathBuf]) -> Result<Array2<f32>, PipelineError> {
        info!("Extracting features for {} images", paths.len());
        let mut rows = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            debug!("Image {}/{}: {:?}", i + 1, paths.len(), path);
            rows.push(self.extract_one(path)?);
        }
        let features = stack_features(rows)?;

        if let Some(expected) = self.feature_size() {
            if features.nrows() > 0 && features.ncols() != expected {
                return Err(PipelineError::FeatureExtractionFailure(format!(
                    "Network produced {} features per image, expected {}",
                    features.ncols(), expected
                )));
            }
        }
        Ok(features)
    }
}
