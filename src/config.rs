use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,

    // Face matching thresholds; MAX_FACE_DISTANCE is intentionally stricter
    // than TOLERANCE.
    pub tolerance: f32,
    pub max_face_distance: f32,

    // Storage paths
    pub employee_images_dir: String,
    pub detector_model_path: String,
    pub encoder_model_path: String,

    // Preview camera
    pub camera_device: String,
    pub camera_width: u32,
    pub camera_height: u32,

    // Rate limiting
    pub rate_register_per_min: u32,
    pub rate_recognize_per_min: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://absensi.db?mode=rwc".to_string()),

            tolerance: env::var("TOLERANCE")
                .unwrap_or_else(|_| "0.4".to_string())
                .parse()
                .unwrap(),
            max_face_distance: env::var("MAX_FACE_DISTANCE")
                .unwrap_or_else(|_| "0.45".to_string())
                .parse()
                .unwrap(),

            employee_images_dir: env::var("EMPLOYEE_IMAGES_DIR")
                .unwrap_or_else(|_| "employee_images".to_string()),
            detector_model_path: env::var("DETECTOR_MODEL_PATH")
                .unwrap_or_else(|_| "models/face-detector.onnx".to_string()),
            encoder_model_path: env::var("ENCODER_MODEL_PATH")
                .unwrap_or_else(|_| "models/face-encoder.onnx".to_string()),

            camera_device: env::var("CAMERA_DEVICE").unwrap_or_else(|_| "/dev/video0".to_string()),
            camera_width: env::var("CAMERA_WIDTH")
                .unwrap_or_else(|_| "640".to_string())
                .parse()
                .unwrap(),
            camera_height: env::var("CAMERA_HEIGHT")
                .unwrap_or_else(|_| "480".to_string())
                .parse()
                .unwrap(),

            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_recognize_per_min: env::var("RATE_RECOGNIZE_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap(),
        }
    }
}
