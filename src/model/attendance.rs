use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The two attendance events recorded per employee per calendar day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

impl Default for AttendanceKind {
    fn default() -> Self {
        Self::CheckIn
    }
}

/// Stored attendance row.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub employee_id: String,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub status: String,
}

/// Joined row for today's dashboard and the JSON API.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": "EMP-001",
        "name": "Alice Doe",
        "check_in": "2026-08-07T08:01:12",
        "check_out": null,
        "status": "present"
    })
)]
pub struct TodayRow {
    pub employee_id: String,
    pub name: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: String,
}

/// Joined row for the attendance history view.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HistoryRow {
    pub employee_id: String,
    pub name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_attendance_kind_round_trips_wire_form() {
        assert_eq!(AttendanceKind::CheckIn.to_string(), "check_in");
        assert_eq!(
            AttendanceKind::from_str("check_out").unwrap(),
            AttendanceKind::CheckOut
        );
    }

    #[test]
    fn test_attendance_kind_defaults_to_check_in() {
        assert_eq!(AttendanceKind::default(), AttendanceKind::CheckIn);
    }
}
