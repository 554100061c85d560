//! Face embedding extraction via ONNX Runtime.
//!
//! Crops a detected face, resizes to the 112x112 model input and produces an
//! L2-normalized 128-dimensional descriptor (MobileFaceNet-style model).

use crate::vision::descriptor::{DESCRIPTOR_LEN, Descriptor};
use crate::vision::detector::FaceBox;
use image::RgbImage;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const ENCODER_INPUT_SIZE: u32 = 112;
const ENCODER_MEAN: f32 = 127.5;
const ENCODER_STD: f32 = 128.0;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face region is empty")]
    EmptyRegion,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// ONNX face embedder.
pub struct FaceEncoder {
    session: Session,
}

impl FaceEncoder {
    pub fn load(model_path: &str) -> Result<Self, EncoderError> {
        if !Path::new(model_path).exists() {
            return Err(EncoderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = model_path, "loaded face encoder model");

        Ok(Self { session })
    }

    /// Extract a descriptor for one detected face.
    pub fn extract(
        &mut self,
        image: &RgbImage,
        face: &FaceBox,
    ) -> Result<Descriptor, EncoderError> {
        let crop = crop_face(image, face).ok_or(EncoderError::EmptyRegion)?;
        let input = preprocess(&crop);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EncoderError::InferenceFailed(format!("embedding: {e}")))?;

        if raw.len() != DESCRIPTOR_LEN {
            return Err(EncoderError::InferenceFailed(format!(
                "expected {DESCRIPTOR_LEN}-dim embedding, got {}",
                raw.len()
            )));
        }

        let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        let values: Vec<f32> = if norm > 0.0 {
            raw.iter().map(|x| x / norm).collect()
        } else {
            raw.to_vec()
        };

        Descriptor::from_vec(values)
            .map_err(|e| EncoderError::InferenceFailed(e.to_string()))
    }
}

/// Clamp the box to the image and cut the face region out.
fn crop_face(image: &RgbImage, face: &FaceBox) -> Option<RgbImage> {
    let x = (face.x.max(0.0) as u32).min(image.width().saturating_sub(1));
    let y = (face.y.max(0.0) as u32).min(image.height().saturating_sub(1));
    let w = (face.width as u32).min(image.width() - x);
    let h = (face.height as u32).min(image.height() - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(image::imageops::crop_imm(image, x, y, w, h).to_image())
}

/// Resize the crop to the encoder input and normalize into an NCHW tensor.
fn preprocess(crop: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        crop,
        ENCODER_INPUT_SIZE,
        ENCODER_INPUT_SIZE,
        FilterType::Triangle,
    );

    let size = ENCODER_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 - ENCODER_MEAN) / ENCODER_STD;
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_face_clamps_to_image() {
        let image = RgbImage::from_pixel(100, 100, image::Rgb([10, 20, 30]));
        let face = FaceBox {
            x: 80.0,
            y: 80.0,
            width: 50.0,
            height: 50.0,
            confidence: 0.9,
        };
        let crop = crop_face(&image, &face).unwrap();
        assert_eq!(crop.dimensions(), (20, 20));
    }

    #[test]
    fn test_crop_face_rejects_out_of_bounds_region() {
        let image = RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0]));
        let face = FaceBox {
            x: 9.5,
            y: 9.5,
            width: 0.2,
            height: 0.2,
            confidence: 0.9,
        };
        assert!(crop_face(&image, &face).is_none());
    }

    #[test]
    fn test_preprocess_shape() {
        let crop = RgbImage::from_pixel(64, 48, image::Rgb([128, 128, 128]));
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
        let expected = (128.0 - ENCODER_MEAN) / ENCODER_STD;
        assert!((tensor[[0, 1, 0, 0]] - expected).abs() < 1e-6);
    }
}
