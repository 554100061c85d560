use crate::error::AppError;
use crate::matcher::FaceMatcher;
use crate::model::attendance::AttendanceKind;
use crate::store;
use crate::utils::image_data::decode_image_data;
use crate::vision::EngineHandle;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RecognizeForm {
    /// Attendance event to record; defaults to check_in.
    #[serde(default, rename = "type")]
    pub kind: AttendanceKind,
    /// Camera frame as a base64 data URL (JPEG).
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Recognize a face and record the requested attendance event.
#[utoipa::path(
    post,
    path = "/absensi/recognize",
    request_body(content = RecognizeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Recognition outcome", body = Object, example = json!({
            "success": true,
            "message": "Check-in successful! (Confidence: 71.2%)",
            "employee_id": "EMP-001",
            "name": "Alice Doe",
            "confidence": 71.2
        })),
        (status = 400, description = "No usable face or transition not allowed", body = Object, example = json!({
            "success": false,
            "message": "Already checked in today"
        }))
    ),
    tag = "Recognition"
)]
pub async fn recognize(
    pool: web::Data<SqlitePool>,
    matcher: web::Data<FaceMatcher>,
    engine: web::Data<EngineHandle>,
    form: web::Form<RecognizeForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let image_data = form
        .image_data
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No image submitted!".to_string()))?;

    let image = decode_image_data(&image_data)
        .map_err(|_| AppError::Validation("Invalid image data!".to_string()))?;

    let analysis = engine.analyze(image).await?;
    if analysis.faces == 0 {
        return Err(AppError::Validation("No face detected!".to_string()));
    }
    let descriptor = analysis
        .descriptor
        .ok_or_else(|| AppError::Validation("Could not extract face features!".to_string()))?;

    // An unrecognized face is an expected outcome, not an error: report it
    // in the body so the client can prompt the user to reposition.
    let Some(outcome) = matcher.find_best_match(&descriptor) else {
        return Ok(not_recognized());
    };
    if !outcome.any_within_tolerance {
        return Ok(not_recognized());
    }
    if !outcome.accepted {
        return Ok(HttpResponse::Ok().json(json!({
            "success": false,
            "message": format!(
                "Face similarity too low! (Similarity: {:.1}%) Minimum threshold: {:.1}%",
                outcome.confidence(),
                matcher.min_accepted_similarity(),
            ),
        })));
    }

    store::record_attendance(&pool, &outcome.employee_id, form.kind).await?;

    let action = match form.kind {
        AttendanceKind::CheckIn => "Check-in",
        AttendanceKind::CheckOut => "Check-out",
    };
    let confidence = (outcome.confidence() * 10.0).round() / 10.0;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("{action} successful! (Confidence: {confidence:.1}%)"),
        "employee_id": outcome.employee_id,
        "name": outcome.name,
        "confidence": confidence,
    })))
}

fn not_recognized() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": false,
        "message": "Face not recognized! Make sure you are registered.",
    }))
}
