//! Face detector via ONNX Runtime.
//!
//! Runs an Ultraface-style model (320x240 input, flat score/box outputs)
//! with confidence filtering and IoU NMS post-processing.

use image::RgbImage;
use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

const DETECTOR_INPUT_WIDTH: u32 = 320;
const DETECTOR_INPUT_HEIGHT: u32 = 240;
const DETECTOR_MEAN: f32 = 127.0;
const DETECTOR_STD: f32 = 128.0;
const DETECTOR_CONFIDENCE_THRESHOLD: f32 = 0.7;
const DETECTOR_NMS_IOU: f32 = 0.3;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Axis-aligned face region in pixel coordinates of the source image.
#[derive(Debug, Clone, Serialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

/// Ultraface-based face detector.
pub struct FaceDetector {
    session: Session,
    /// (scores, boxes) output positions, discovered by name at load time.
    output_indices: (usize, usize),
}

impl FaceDetector {
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();
        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "detector model requires score and box outputs, got {}",
                output_names.len()
            )));
        }
        let output_indices = discover_output_indices(&output_names);

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            "loaded face detector model"
        );

        Ok(Self {
            session,
            output_indices,
        })
    }

    /// Detect faces in an RGB image, returning boxes sorted by confidence.
    pub fn detect(&mut self, image: &RgbImage) -> Result<Vec<FaceBox>, DetectorError> {
        let (img_w, img_h) = (image.width() as f32, image.height() as f32);
        let input = preprocess(image);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (score_idx, box_idx) = self.output_indices;
        let (_, scores) = outputs[score_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[box_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        // scores are [1, N, 2] (background, face), boxes [1, N, 4] in
        // normalized corner coordinates.
        let anchors = scores.len() / 2;
        if boxes.len() < anchors * 4 {
            return Err(DetectorError::InferenceFailed(format!(
                "box tensor too short: {} values for {anchors} anchors",
                boxes.len()
            )));
        }
        let mut detections = Vec::new();
        for i in 0..anchors {
            let confidence = scores[i * 2 + 1];
            if confidence < DETECTOR_CONFIDENCE_THRESHOLD {
                continue;
            }
            let x1 = (boxes[i * 4] * img_w).clamp(0.0, img_w);
            let y1 = (boxes[i * 4 + 1] * img_h).clamp(0.0, img_h);
            let x2 = (boxes[i * 4 + 2] * img_w).clamp(0.0, img_w);
            let y2 = (boxes[i * 4 + 3] * img_h).clamp(0.0, img_h);
            if x2 <= x1 || y2 <= y1 {
                continue;
            }
            detections.push(FaceBox {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence,
            });
        }

        Ok(nms(detections, DETECTOR_NMS_IOU))
    }
}

/// Resize to the detector input and normalize into an NCHW tensor.
fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        DETECTOR_INPUT_WIDTH,
        DETECTOR_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let (w, h) = (DETECTOR_INPUT_WIDTH as usize, DETECTOR_INPUT_HEIGHT as usize);
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 - DETECTOR_MEAN) / DETECTOR_STD;
        }
    }
    tensor
}

/// Map output tensors to (scores, boxes) by name, falling back to position.
fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let score_idx = names.iter().position(|n| n.contains("score"));
    let box_idx = names.iter().position(|n| n.contains("box"));
    match (score_idx, box_idx) {
        (Some(s), Some(b)) => (s, b),
        _ => (0, 1),
    }
}

/// Greedy non-maximum suppression; keeps the highest-confidence box of each
/// overlapping cluster, result stays sorted by confidence.
fn nms(mut detections: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<FaceBox> = Vec::new();
    for candidate in detections {
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - intersection;
    if union > 0.0 { intersection / union } else { 0.0 }
}
