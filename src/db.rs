use sqlx::SqlitePool;

const CREATE_EMPLOYEES: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    department TEXT,
    position TEXT,
    image_path TEXT,
    face_descriptor BLOB,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

// UNIQUE (employee_id, date) carries the one-check-in-per-day invariant at
// the storage level; a concurrent double check-in surfaces as a constraint
// violation instead of a second row.
const CREATE_ATTENDANCE: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id TEXT NOT NULL,
    date DATE NOT NULL,
    check_in_time TIMESTAMP,
    check_out_time TIMESTAMP,
    status TEXT NOT NULL DEFAULT 'present',
    FOREIGN KEY (employee_id) REFERENCES employees (employee_id),
    UNIQUE (employee_id, date)
)
"#;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePool::connect(database_url)
        .await
        .expect("Failed to connect to database");

    apply_schema(&pool)
        .await
        .expect("Failed to apply database schema");

    pool
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_EMPLOYEES).execute(pool).await?;
    sqlx::query(CREATE_ATTENDANCE).execute(pool).await?;
    Ok(())
}
