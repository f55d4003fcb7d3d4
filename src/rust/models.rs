/// Represents the pretrained image networks the library knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Headless ResNet50 (`Qdrant/resnet50-onnx`), classification layer removed
    ///
    /// Characteristics:
    /// - Input: 1x3x224x224, ImageNet normalisation
    /// - Output: 2048-d global average pool activations
    /// - Size: ~94MB
    ResNet50,
}

/// Describes how images must be prepared for a network and what it produces
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Width and height the network expects, in pixels
    pub input_size: u32,
    /// Per-channel RGB mean subtracted after scaling to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel RGB standard deviation divided out after mean subtraction
    pub std: [f32; 3],
    /// Length of the extracted feature vector, when known ahead of time
    pub feature_size: Option<usize>,
    /// Approximate size of the model file
    pub model_size_mb: usize,
}

impl ModelCharacteristics {
    /// Characteristics shared by networks trained on ImageNet
    pub fn imagenet(input_size: u32) -> Self {
        Self {
            input_size,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            feature_size: None,
            model_size_mb: 0,
        }
    }
}

/// Where a model is fetched from and how it is checked
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    /// SHA-256 of the model file. Unpinned models are cached without verification.
    pub model_hash: Option<String>,
}

/// Width of the ResNet50 global average pool, the layer feeding its classifier
pub const RESNET50_POOL_WIDTH: usize = 2048;

impl BuiltinModel {
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::ResNet50 => ModelCharacteristics {
                feature_size: Some(RESNET50_POOL_WIDTH),
                model_size_mb: 94,
                ..ModelCharacteristics::imagenet(224)
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::ResNet50 => ModelInfo {
                name: "resnet50-onnx".to_string(),
                model_url: "https://huggingface.co/Qdrant/resnet50-onnx/resolve/main/model.onnx".to_string(),
                model_hash: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resnet_characteristics() {
        let characteristics = BuiltinModel::ResNet50.characteristics();
        assert_eq!(characteristics.input_size, 224);
        assert_eq!(characteristics.mean, [0.485, 0.456, 0.406]);
    }

    #[test]
    fn test_builtin_features_are_pooled_activations() {
        // 1000 would be the ImageNet class layer
        let characteristics = BuiltinModel::ResNet50.characteristics();
        assert_eq!(characteristics.feature_size, Some(RESNET50_POOL_WIDTH));
        assert_eq!(RESNET50_POOL_WIDTH, 2048);
        assert_ne!(characteristics.feature_size, Some(1000));
    }

    #[test]
    fn test_model_info() {
        let info = BuiltinModel::ResNet50.get_model_info();
        assert_eq!(info.name, "resnet50-onnx");
        assert!(info.model_url.ends_with(".onnx"));
    }
}
