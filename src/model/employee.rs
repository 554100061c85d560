use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What list endpoints and the employee page expose.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "EMP-001",
        "name": "Alice Doe",
        "department": "Engineering",
        "position": "Engineer",
        "image_path": "employee_images/EMP-001_Alice_Doe.jpg",
        "created_at": "2026-01-01T08:00:00"
    })
)]
pub struct EmployeeSummary {
    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "Alice Doe")]
    pub name: String,

    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Engineer", nullable = true)]
    pub position: Option<String>,

    #[schema(nullable = true)]
    pub image_path: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Insert payload for a new enrollment.
#[derive(Debug)]
pub struct NewEmployee {
    pub employee_id: String,
    pub name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub image_path: String,
    pub descriptor: Vec<u8>,
}
