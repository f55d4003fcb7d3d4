//! Image decoding and conversion into network input tensors.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageReader};
use ndarray::Array4;

use crate::error::PipelineError;
use crate::models::ModelCharacteristics;

/// Decodes an image file, naming the path on failure.
///
/// The format is sniffed from the file contents, so a PNG or WebP saved
/// under a `.jpeg` name still decodes.
pub fn load_image(path: &Path) -> Result<DynamicImage, PipelineError> {
    let failure = |e: &dyn std::fmt::Display| {
        PipelineError::FeatureExtractionFailure(format!("Error loading image {:?}: {}", path, e))
    };
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| failure(&e))?
        .decode()
        .map_err(|e| failure(&e))
}

/// Converts an image to the 1x3xHxW layout the network expects.
///
/// The image is resized to exactly `input_size` square (aspect ratio is not
/// kept), scaled to [0, 1] and normalised per channel with the model's mean
/// and standard deviation.
pub fn image_to_tensor(img: &DynamicImage, characteristics: &ModelCharacteristics) -> Array4<f32> {
    let size = characteristics.input_size;
    let resized = img.resize_exact(size, size, FilterType::CatmullRom).to_rgb8();

    let side = size as usize;
    let mut input = Array4::zeros((1, 3, side, side));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for channel in 0..3 {
            let value = pixel.0[channel] as f32 / 255.0;
            input[[0, channel, y, x]] =
                (value - characteristics.mean[channel]) / characteristics.std[channel];
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn identity_characteristics(size: u32) -> ModelCharacteristics {
        ModelCharacteristics {
            input_size: size,
            mean: [0.0; 3],
            std: [1.0; 3],
            feature_size: None,
            model_size_mb: 0,
        }
    }

    #[test]
    fn test_tensor_shape_and_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([255, 0, 51])));
        let tensor = image_to_tensor(&img, &identity_characteristics(4));

        assert_eq!(tensor.dim(), (1, 3, 4, 4));
        assert!((tensor[[0, 0, 2, 3]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 0, 0]].abs() < 1e-6);
        assert!((tensor[[0, 2, 1, 1]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalisation_applies_mean_and_std() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
        let characteristics = ModelCharacteristics::imagenet(2);
        let tensor = image_to_tensor(&img, &characteristics);

        let expected = (1.0 - 0.485) / 0.229;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_png_bytes_under_jpeg_name_decode() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("source.png");
        RgbImage::from_pixel(5, 3, Rgb([10, 20, 30])).save(&png).unwrap();
        let disguised = dir.path().join("thai0001.jpeg");
        std::fs::rename(&png, &disguised).unwrap();

        let img = load_image(&disguised).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(*img.get_pixel(0, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_load_image_failure_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpeg");
        std::fs::write(&path, b"not an image").unwrap();

        match load_image(&path) {
            Err(PipelineError::FeatureExtractionFailure(msg)) => assert!(msg.contains("broken.jpeg")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
