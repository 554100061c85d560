//! Descriptor store: employees, their face descriptors and attendance rows.
//!
//! All operations take the shared pool; SQL stays close to the call sites.

use crate::error::AppError;
use crate::model::attendance::{AttendanceKind, AttendanceRecord, HistoryRow, TodayRow};
use crate::model::employee::{EmployeeSummary, NewEmployee};
use chrono::{Local, NaiveDate};
use futures_util::StreamExt;
use sqlx::SqlitePool;

/// (employee_id, name, descriptor blob) for every enrolled face.
#[derive(Debug, sqlx::FromRow)]
pub struct DescriptorRow {
    pub employee_id: String,
    pub name: String,
    pub descriptor: Vec<u8>,
}

/// Optional bounds for the attendance history query, all inclusive.
#[derive(Debug, Default)]
pub struct HistoryFilter {
    pub employee_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Insert a new employee row. Returns false when the employee id is taken.
pub async fn add_employee(pool: &SqlitePool, employee: &NewEmployee) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO employees (employee_id, name, department, position, image_path, face_descriptor)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&employee.employee_id)
    .bind(&employee.name)
    .bind(&employee.department)
    .bind(&employee.position)
    .bind(&employee.image_path)
    .bind(&employee.descriptor)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn list_employees(pool: &SqlitePool) -> Result<Vec<EmployeeSummary>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeSummary>(
        r#"
        SELECT employee_id, name, department, position, image_path, created_at
        FROM employees
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Stream every stored descriptor for a matcher rebuild.
pub async fn all_descriptors(pool: &SqlitePool) -> Result<Vec<DescriptorRow>, sqlx::Error> {
    let mut stream = sqlx::query_as::<_, DescriptorRow>(
        r#"
        SELECT employee_id, name, face_descriptor AS descriptor
        FROM employees
        WHERE face_descriptor IS NOT NULL
        "#,
    )
    .fetch(pool);

    let mut rows = Vec::new();
    while let Some(row) = stream.next().await {
        rows.push(row?);
    }
    Ok(rows)
}

/// Delete an employee and every attendance row it owns. Returns false when
/// the id does not exist.
pub async fn delete_employee(pool: &SqlitePool, employee_id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attendance WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Apply one attendance transition for today.
///
/// Allowed per (employee, date): no record -> check_in -> check_out.
/// The UNIQUE (employee_id, date) constraint carries the check-in invariant,
/// so a lost race reports the same conflict as a plain repeat.
pub async fn record_attendance(
    pool: &SqlitePool,
    employee_id: &str,
    kind: AttendanceKind,
) -> Result<(), AppError> {
    let now = Local::now().naive_local();
    let today = now.date();

    match kind {
        AttendanceKind::CheckIn => {
            let result = sqlx::query(
                "INSERT INTO attendance (employee_id, date, check_in_time) VALUES (?, ?, ?)",
            )
            .bind(employee_id)
            .bind(today)
            .bind(now)
            .execute(pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => Err(AppError::StateConflict(
                    "Already checked in today".to_string(),
                )),
                Err(e) => Err(e.into()),
            }
        }
        AttendanceKind::CheckOut => {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET check_out_time = ?
                WHERE employee_id = ? AND date = ? AND check_out_time IS NULL
                "#,
            )
            .bind(now)
            .bind(employee_id)
            .bind(today)
            .execute(pool)
            .await?;

            if result.rows_affected() > 0 {
                return Ok(());
            }

            // Zero rows: either already checked out, or never checked in.
            let existing = sqlx::query_as::<_, AttendanceRecord>(
                r#"
                SELECT id, employee_id, date, check_in_time, check_out_time, status
                FROM attendance
                WHERE employee_id = ? AND date = ?
                "#,
            )
            .bind(employee_id)
            .bind(today)
            .fetch_optional(pool)
            .await?;

            match existing {
                Some(_) => Err(AppError::StateConflict(
                    "Already checked out today".to_string(),
                )),
                None => Err(AppError::StateConflict("Not checked in yet".to_string())),
            }
        }
    }
}

/// Today's attendance joined with employee names, latest check-in first.
pub async fn attendance_today(pool: &SqlitePool) -> Result<Vec<TodayRow>, sqlx::Error> {
    sqlx::query_as::<_, TodayRow>(
        r#"
        SELECT e.employee_id, e.name, a.check_in_time AS check_in,
               a.check_out_time AS check_out, a.status
        FROM attendance a
        JOIN employees e ON a.employee_id = e.employee_id
        WHERE a.date = ?
        ORDER BY a.check_in_time DESC
        "#,
    )
    .bind(Local::now().date_naive())
    .fetch_all(pool)
    .await
}

/// Attendance history with optional employee and inclusive date bounds.
pub async fn attendance_history(
    pool: &SqlitePool,
    filter: &HistoryFilter,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    // Build the WHERE clause dynamically, then bind in the same order.
    let mut conditions = Vec::new();
    if filter.employee_id.is_some() {
        conditions.push("e.employee_id = ?");
    }
    if filter.start_date.is_some() {
        conditions.push("a.date >= ?");
    }
    if filter.end_date.is_some() {
        conditions.push("a.date <= ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r#"
        SELECT e.employee_id, e.name, a.date, a.check_in_time AS check_in,
               a.check_out_time AS check_out, a.status
        FROM attendance a
        JOIN employees e ON a.employee_id = e.employee_id
        {}
        ORDER BY a.date DESC, a.check_in_time DESC
        "#,
        where_clause
    );

    let mut query = sqlx::query_as::<_, HistoryRow>(&sql);
    if let Some(employee_id) = &filter.employee_id {
        query = query.bind(employee_id);
    }
    if let Some(start) = filter.start_date {
        query = query.bind(start);
    }
    if let Some(end) = filter.end_date {
        query = query.bind(end);
    }

    query.fetch_all(pool).await
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection pool: each :memory: connection is its own database.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::apply_schema(&pool).await.unwrap();
        pool
    }

    pub(crate) fn employee(id: &str, name: &str, descriptor: Vec<u8>) -> NewEmployee {
        NewEmployee {
            employee_id: id.to_string(),
            name: name.to_string(),
            department: Some("Engineering".to_string()),
            position: None,
            image_path: format!("employee_images/{id}.jpg"),
            descriptor,
        }
    }

    fn conflict_message(err: AppError) -> String {
        match err {
            AppError::StateConflict(message) => message,
            other => panic!("expected state conflict, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_add_and_list_employees() {
        let pool = memory_pool().await;
        assert!(add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap());
        assert!(add_employee(&pool, &employee("E2", "Bob", vec![1; 512]))
            .await
            .unwrap());

        let ids: Vec<String> = list_employees(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.employee_id)
            .collect();
        assert_eq!(ids, vec!["E1", "E2"]);
    }

    #[actix_web::test]
    async fn test_add_employee_rejects_duplicate_id() {
        let pool = memory_pool().await;
        assert!(add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap());
        assert!(!add_employee(&pool, &employee("E1", "Alice again", vec![2; 512]))
            .await
            .unwrap());
        assert_eq!(list_employees(&pool).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_all_descriptors_skips_null_blobs() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();
        sqlx::query("INSERT INTO employees (employee_id, name) VALUES ('E2', 'Bob')")
            .execute(&pool)
            .await
            .unwrap();

        let rows = all_descriptors(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E1");
    }

    #[actix_web::test]
    async fn test_attendance_state_machine() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();

        // check_out before any check_in
        let err = record_attendance(&pool, "E1", AttendanceKind::CheckOut)
            .await
            .unwrap_err();
        assert_eq!(conflict_message(err), "Not checked in yet");

        record_attendance(&pool, "E1", AttendanceKind::CheckIn)
            .await
            .unwrap();

        let err = record_attendance(&pool, "E1", AttendanceKind::CheckIn)
            .await
            .unwrap_err();
        assert_eq!(conflict_message(err), "Already checked in today");

        record_attendance(&pool, "E1", AttendanceKind::CheckOut)
            .await
            .unwrap();

        let err = record_attendance(&pool, "E1", AttendanceKind::CheckOut)
            .await
            .unwrap_err();
        assert_eq!(conflict_message(err), "Already checked out today");

        let today = attendance_today(&pool).await.unwrap();
        assert_eq!(today.len(), 1);
        assert!(today[0].check_in.is_some());
        assert!(today[0].check_out.is_some());
        assert_eq!(today[0].status, "present");
    }

    #[actix_web::test]
    async fn test_attendance_today_orders_latest_check_in_first() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();
        add_employee(&pool, &employee("E2", "Bob", vec![1; 512]))
            .await
            .unwrap();

        let today = Local::now().date_naive();
        for (id, time) in [("E1", "08:00:00"), ("E2", "09:30:00")] {
            sqlx::query(
                "INSERT INTO attendance (employee_id, date, check_in_time) VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(today)
            .bind(today.and_time(time.parse().unwrap()))
            .execute(&pool)
            .await
            .unwrap();
        }

        let rows = attendance_today(&pool).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["E2", "E1"]);
    }

    #[actix_web::test]
    async fn test_delete_employee_cascades_attendance() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();
        record_attendance(&pool, "E1", AttendanceKind::CheckIn)
            .await
            .unwrap();

        assert!(delete_employee(&pool, "E1").await.unwrap());
        assert!(list_employees(&pool).await.unwrap().is_empty());
        assert!(attendance_today(&pool).await.unwrap().is_empty());

        // Absent id reports false, not an error.
        assert!(!delete_employee(&pool, "E1").await.unwrap());
    }

    #[actix_web::test]
    async fn test_history_filter_bounds_are_inclusive() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();

        for day in ["2026-01-01", "2026-01-02", "2026-01-03"] {
            let date: NaiveDate = day.parse().unwrap();
            sqlx::query(
                "INSERT INTO attendance (employee_id, date, check_in_time) VALUES (?, ?, ?)",
            )
            .bind("E1")
            .bind(date)
            .bind(date.and_hms_opt(8, 0, 0).unwrap())
            .execute(&pool)
            .await
            .unwrap();
        }

        let filter = HistoryFilter {
            start_date: Some("2026-01-02".parse().unwrap()),
            end_date: Some("2026-01-02".parse().unwrap()),
            ..Default::default()
        };
        let rows = attendance_history(&pool, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date.to_string(), "2026-01-02");

        // Unbounded query returns everything, newest date first.
        let all = attendance_history(&pool, &HistoryFilter::default())
            .await
            .unwrap();
        let dates: Vec<String> = all.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-01-03", "2026-01-02", "2026-01-01"]);
    }

    #[actix_web::test]
    async fn test_history_filters_by_employee() {
        let pool = memory_pool().await;
        add_employee(&pool, &employee("E1", "Alice", vec![0; 512]))
            .await
            .unwrap();
        add_employee(&pool, &employee("E2", "Bob", vec![1; 512]))
            .await
            .unwrap();
        record_attendance(&pool, "E1", AttendanceKind::CheckIn)
            .await
            .unwrap();
        record_attendance(&pool, "E2", AttendanceKind::CheckIn)
            .await
            .unwrap();

        let filter = HistoryFilter {
            employee_id: Some("E2".to_string()),
            ..Default::default()
        };
        let rows = attendance_history(&pool, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Bob");
    }
}
