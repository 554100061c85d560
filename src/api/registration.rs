use crate::config::Config;
use crate::error::AppError;
use crate::matcher::FaceMatcher;
use crate::model::employee::NewEmployee;
use crate::store;
use crate::utils::image_data::decode_image_data;
use crate::vision::EngineHandle;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::path::Path;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegistrationForm {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "Alice Doe")]
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    /// Camera frame as a base64 data URL (JPEG).
    #[serde(default)]
    pub image_data: Option<String>,
}

/// Enroll a new employee from a captured camera frame.
#[utoipa::path(
    post,
    path = "/registrasi/submit",
    request_body(content = RegistrationForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Employee enrolled", body = Object, example = json!({
            "success": true,
            "message": "Employee Alice Doe registered successfully!"
        })),
        (status = 400, description = "Incomplete data or no usable face", body = Object, example = json!({
            "success": false,
            "message": "No face detected!"
        })),
        (status = 409, description = "Face already enrolled", body = Object, example = json!({
            "success": false,
            "message": "This face is already registered as: Alice Doe! (similarity: 72.4%)"
        }))
    ),
    tag = "Enrollment"
)]
pub async fn submit(
    pool: web::Data<SqlitePool>,
    matcher: web::Data<FaceMatcher>,
    engine: web::Data<EngineHandle>,
    config: web::Data<Config>,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let employee_id = form.employee_id.trim().to_string();
    let name = form.name.trim().to_string();
    let image_data = form.image_data.unwrap_or_default();

    if employee_id.is_empty() || name.is_empty() || image_data.trim().is_empty() {
        return Err(AppError::Validation("Incomplete registration data!".to_string()));
    }

    let image = decode_image_data(&image_data)
        .map_err(|_| AppError::Validation("Invalid image data!".to_string()))?;

    let analysis = engine.analyze(image.clone()).await?;
    if analysis.faces == 0 {
        return Err(AppError::Validation("No face detected!".to_string()));
    }
    let descriptor = analysis
        .descriptor
        .ok_or_else(|| AppError::Validation("Could not extract face features!".to_string()))?;

    if let Some(hit) = matcher.is_duplicate(&descriptor) {
        let similarity = hit.similarity();
        return Err(AppError::Duplicate {
            name: hit.name,
            similarity,
        });
    }

    // Keep a reference photo next to the descriptor.
    let file_name = format!("{}_{}.jpg", employee_id, name.replace(' ', "_"));
    let image_path = Path::new(&config.employee_images_dir).join(file_name);
    std::fs::write(&image_path, &image)?;

    let added = store::add_employee(
        &pool,
        &NewEmployee {
            employee_id,
            name: name.clone(),
            department: form.department.filter(|s| !s.trim().is_empty()),
            position: form.position.filter(|s| !s.trim().is_empty()),
            image_path: image_path.to_string_lossy().into_owned(),
            descriptor: descriptor.to_bytes(),
        },
    )
    .await?;

    if !added {
        return Err(AppError::Validation("Employee ID already registered!".to_string()));
    }

    if let Err(e) = matcher.reload(&pool).await {
        tracing::error!(error = %e, "matcher reload after enrollment failed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Employee {name} registered successfully!"),
    })))
}
