//! V4L2 camera capture for the diagnostic preview stream.

use thiserror::Error;
use v4l::FourCC;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// An opened capture device negotiated to MJPEG frames.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
}

impl Camera {
    /// Open a V4L2 device by path and request MJPEG at the given resolution.
    pub fn open(device_path: &str, width: u32, height: u32) -> Result<Self, CameraError> {
        if !std::path::Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path)
            .map_err(|e| CameraError::DeviceNotFound(format!("{device_path}: {e}")))?;

        let mut fmt = device
            .format()
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"MJPG");
        fmt.width = width;
        fmt.height = height;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("set format: {e}")))?;

        if negotiated.fourcc != FourCC::new(b"MJPG") {
            return Err(CameraError::FormatNegotiationFailed(format!(
                "device refused MJPEG, offered {:?}",
                negotiated.fourcc
            )));
        }

        tracing::info!(
            device = device_path,
            width = negotiated.width,
            height = negotiated.height,
            "camera opened"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
        })
    }

    /// Deliver JPEG frames to `on_frame` until it returns false or capture
    /// fails.
    pub fn for_each_frame<F>(&self, mut on_frame: F) -> Result<(), CameraError>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CameraError::CaptureFailed(format!("mmap stream: {e}")))?;

        loop {
            let (buf, meta) = stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("dequeue buffer: {e}")))?;

            let frame = &buf[..meta.bytesused as usize];
            if frame.is_empty() {
                continue;
            }
            if !on_frame(frame) {
                return Ok(());
            }
        }
    }
}
