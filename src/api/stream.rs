//! Live camera preview: multipart MJPEG with face bounding boxes.
//!
//! Diagnostic/UI endpoint only; recognition never reads from this path.

use crate::camera::{Camera, CameraError};
use crate::config::Config;
use crate::vision::{EngineHandle, FaceBox};
use actix_web::{HttpResponse, web};
use futures::SinkExt;
use futures::channel::mpsc;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde_json::json;

type FrameSender = mpsc::Sender<Result<web::Bytes, actix_web::Error>>;

pub async fn video_feed(config: web::Data<Config>, engine: web::Data<EngineHandle>) -> HttpResponse {
    let camera = match Camera::open(
        &config.camera_device,
        config.camera_width,
        config.camera_height,
    ) {
        Ok(camera) => camera,
        Err(e) => {
            tracing::warn!(error = %e, device = %config.camera_device, "camera unavailable");
            return HttpResponse::ServiceUnavailable().json(json!({
                "success": false,
                "message": "Camera unavailable",
            }));
        }
    };

    let engine = engine.get_ref().clone();
    let (tx, rx) = mpsc::channel::<Result<web::Bytes, actix_web::Error>>(2);

    // The capture loop blocks on the device, so it gets its own thread; the
    // channel closing on client disconnect is what stops it.
    std::thread::Builder::new()
        .name("video-feed".into())
        .spawn(move || {
            if let Err(e) = capture_loop(&camera, &engine, tx) {
                tracing::warn!(error = %e, "video feed stopped");
            }
        })
        .expect("failed to spawn video feed thread");

    HttpResponse::Ok()
        .content_type("multipart/x-mixed-replace; boundary=frame")
        .streaming(rx)
}

fn capture_loop(
    camera: &Camera,
    engine: &EngineHandle,
    mut tx: FrameSender,
) -> Result<(), CameraError> {
    camera.for_each_frame(|jpeg| {
        let annotated = annotate_frame(engine, jpeg);
        futures::executor::block_on(tx.send(Ok(multipart_chunk(&annotated)))).is_ok()
    })
}

/// Draw detected face boxes onto the frame. Any failure falls back to the
/// raw frame; the preview must keep moving.
fn annotate_frame(engine: &EngineHandle, jpeg: &[u8]) -> Vec<u8> {
    let boxes = match futures::executor::block_on(engine.locate(jpeg.to_vec())) {
        Ok(boxes) => boxes,
        Err(e) => {
            tracing::debug!(error = %e, "preview detection failed");
            return jpeg.to_vec();
        }
    };
    if boxes.is_empty() {
        return jpeg.to_vec();
    }

    let Ok(decoded) = image::load_from_memory(jpeg) else {
        return jpeg.to_vec();
    };
    let mut frame = decoded.to_rgb8();
    for face in &boxes {
        draw_box(&mut frame, face);
    }

    let mut out = Vec::with_capacity(jpeg.len());
    let encoder = JpegEncoder::new_with_quality(&mut out, 80);
    match encoder.encode_image(&frame) {
        Ok(()) => out,
        Err(_) => jpeg.to_vec(),
    }
}

fn multipart_chunk(jpeg: &[u8]) -> web::Bytes {
    let mut chunk = Vec::with_capacity(jpeg.len() + 64);
    chunk.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(b"\r\n");
    web::Bytes::from(chunk)
}

fn draw_box(frame: &mut RgbImage, face: &FaceBox) {
    const GREEN: image::Rgb<u8> = image::Rgb([0, 255, 0]);
    const THICKNESS: u32 = 2;

    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let x1 = (face.x.max(0.0) as u32).min(w - 1);
    let y1 = (face.y.max(0.0) as u32).min(h - 1);
    let x2 = ((face.x + face.width).max(0.0) as u32).min(w - 1);
    let y2 = ((face.y + face.height).max(0.0) as u32).min(h - 1);

    for t in 0..THICKNESS {
        for x in x1..=x2 {
            frame.put_pixel(x, (y1 + t).min(h - 1), GREEN);
            frame.put_pixel(x, y2.saturating_sub(t), GREEN);
        }
        for y in y1..=y2 {
            frame.put_pixel((x1 + t).min(w - 1), y, GREEN);
            frame.put_pixel(x2.saturating_sub(t), y, GREEN);
        }
    }
}
