use crate::error::AppError;
use crate::model::attendance::{HistoryRow, TodayRow};
use crate::store::{self, HistoryFilter};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::IntoParams;

/// Today's attendance, latest check-in first.
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance rows", body = Vec<TodayRow>)
    ),
    tag = "Attendance"
)]
pub async fn today(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let rows = store::attendance_today(&pool).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    pub employee_id: Option<String>,
    /// Inclusive lower bound, YYYY-MM-DD.
    #[param(format = "date")]
    pub start_date: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD.
    #[param(format = "date")]
    pub end_date: Option<String>,
}

/// Empty parameters count as absent; malformed dates get the uniform
/// failure body instead of a framework 400.
fn parse_date(field: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    match value.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            AppError::Validation(format!("Invalid {field}; expected YYYY-MM-DD"))
        }),
    }
}

/// Attendance history, newest first.
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Matching history rows", body = Vec<HistoryRow>)
    ),
    tag = "Attendance"
)]
pub async fn history(
    pool: web::Data<SqlitePool>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let filter = HistoryFilter {
        employee_id: query.employee_id.filter(|s| !s.is_empty()),
        start_date: parse_date("start_date", query.start_date)?,
        end_date: parse_date("end_date", query.end_date)?,
    };

    let rows = store::attendance_history(&pool, &filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_treats_empty_as_absent() {
        assert_eq!(parse_date("start_date", Some(String::new())).unwrap(), None);
        assert_eq!(parse_date("start_date", None).unwrap(), None);
    }

    #[test]
    fn test_parse_date_accepts_iso_and_rejects_garbage() {
        assert_eq!(
            parse_date("end_date", Some("2026-01-02".to_string())).unwrap(),
            Some("2026-01-02".parse().unwrap())
        );
        assert!(parse_date("end_date", Some("01/02/2026".to_string())).is_err());
    }
}
