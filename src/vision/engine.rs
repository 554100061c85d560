//! Inference engine thread.
//!
//! ONNX sessions need `&mut` access, so both models live on one dedicated
//! thread and request handlers talk to it through a channel. The handle is
//! cheap to clone and is shared via `web::Data`.

use crate::vision::descriptor::Descriptor;
use crate::vision::detector::{DetectorError, FaceBox, FaceDetector};
use crate::vision::encoder::{EncoderError, FaceEncoder};
use image::RgbImage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// What the engine saw in a submitted image.
pub struct Analysis {
    /// Number of detected faces.
    pub faces: usize,
    /// Descriptor of the most confident face, if one could be extracted.
    pub descriptor: Option<Descriptor>,
}

enum EngineRequest {
    Analyze {
        image: Vec<u8>,
        reply: oneshot::Sender<Result<Analysis, EngineError>>,
    },
    Locate {
        image: Vec<u8>,
        reply: oneshot::Sender<Result<Vec<FaceBox>, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Decode an image, detect faces and extract the primary descriptor.
    pub async fn analyze(&self, image: Vec<u8>) -> Result<Analysis, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Analyze {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Decode an image and return face boxes only (preview overlay).
    pub async fn locate(&self, image: Vec<u8>) -> Result<Vec<FaceBox>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Locate {
                image,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Load both models and spawn the engine thread. Fails fast if either model
/// is unavailable.
pub fn spawn_engine(
    detector_model_path: &str,
    encoder_model_path: &str,
) -> Result<EngineHandle, EngineError> {
    let mut detector = FaceDetector::load(detector_model_path)?;
    let mut encoder = FaceEncoder::load(encoder_model_path)?;

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("face-engine".into())
        .spawn(move || {
            tracing::info!("face engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Analyze { image, reply } => {
                        let _ = reply.send(run_analyze(&mut detector, &mut encoder, &image));
                    }
                    EngineRequest::Locate { image, reply } => {
                        let _ = reply.send(run_locate(&mut detector, &image));
                    }
                }
            }
            tracing::info!("face engine thread exiting");
        })
        .expect("failed to spawn face engine thread");

    Ok(EngineHandle { tx })
}

fn run_analyze(
    detector: &mut FaceDetector,
    encoder: &mut FaceEncoder,
    image: &[u8],
) -> Result<Analysis, EngineError> {
    let rgb: RgbImage = image::load_from_memory(image)?.to_rgb8();
    let faces = detector.detect(&rgb)?;

    let Some(best) = faces.first() else {
        return Ok(Analysis {
            faces: 0,
            descriptor: None,
        });
    };

    let descriptor = match encoder.extract(&rgb, best) {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(error = %e, "descriptor extraction failed");
            None
        }
    };

    Ok(Analysis {
        faces: faces.len(),
        descriptor,
    })
}

fn run_locate(detector: &mut FaceDetector, image: &[u8]) -> Result<Vec<FaceBox>, EngineError> {
    let rgb: RgbImage = image::load_from_memory(image)?.to_rgb8();
    Ok(detector.detect(&rgb)?)
}
