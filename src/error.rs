use crate::vision::EngineError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Closed error taxonomy for the request surface. Every variant renders as
/// the uniform `{success: false, message}` body.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing/invalid input, no face detected, no descriptor extracted.
    #[error("{0}")]
    Validation(String),

    /// Enrollment face matches an existing enrollee.
    #[error("This face is already registered as: {name}! (similarity: {similarity:.1}%)")]
    Duplicate { name: String, similarity: f32 },

    /// Unknown employee id.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Attendance transition not allowed for today.
    #[error("{0}")]
    StateConflict(String),

    /// Store operation failed unexpectedly.
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),

    /// Reference image could not be written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Face engine failure.
    #[error(transparent)]
    Vision(#[from] EngineError),
}

impl AppError {
    /// Message shown to the client. Internal failures get generic text; the
    /// real error only goes to the log.
    fn user_message(&self) -> String {
        match self {
            AppError::Persistence(_) | AppError::Io(_) => "Internal server error".to_string(),
            AppError::Vision(_) => "Face processing failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::StateConflict(_) => StatusCode::BAD_REQUEST,
            AppError::Duplicate { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Io(_) | AppError::Vision(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.user_message(),
        }))
    }
}
