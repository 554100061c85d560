use crate::error::AppError;
use crate::matcher::FaceMatcher;
use crate::model::employee::EmployeeSummary;
use crate::store;
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::SqlitePool;

/// List enrolled employees.
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Enrolled employees", body = Vec<EmployeeSummary>)
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let employees = store::list_employees(&pool).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Delete an employee and all of their attendance rows.
#[utoipa::path(
    post,
    path = "/pegawai/delete/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = Object, example = json!({
            "success": true,
            "message": "Employee deleted successfully!"
        })),
        (status = 404, description = "Unknown employee id", body = Object, example = json!({
            "success": false,
            "message": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    pool: web::Data<SqlitePool>,
    matcher: web::Data<FaceMatcher>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    if !store::delete_employee(&pool, &employee_id).await? {
        return Err(AppError::NotFound("Employee"));
    }

    if let Err(e) = matcher.reload(&pool).await {
        tracing::error!(error = %e, %employee_id, "matcher reload after deletion failed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Employee deleted successfully!",
    })))
}
