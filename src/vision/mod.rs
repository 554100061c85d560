pub mod descriptor;
pub mod detector;
pub mod encoder;
pub mod engine;

pub use descriptor::{DESCRIPTOR_LEN, Descriptor};
pub use detector::FaceBox;
pub use engine::{Analysis, EngineError, EngineHandle, spawn_engine};
