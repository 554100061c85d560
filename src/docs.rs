use crate::api::recognition::RecognizeForm;
use crate::api::registration::RegistrationForm;
use crate::model::attendance::{AttendanceKind, HistoryRow, TodayRow};
use crate::model::employee::EmployeeSummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi Face Recognition API",
        version = "1.0.0",
        description = r#"
## Face Recognition Attendance System

Records employee attendance by matching a captured camera frame against
enrolled face descriptors.

### Key Features
- **Enrollment**: register an employee with one reference face
- **Recognition**: match a face and record check-in / check-out
- **Attendance**: today's summary and filtered history

### Response Format
Mutating endpoints answer with a uniform `{success, message}` JSON body.
"#,
    ),
    paths(
        crate::api::registration::submit,
        crate::api::recognition::recognize,
        crate::api::employee::list_employees,
        crate::api::employee::delete_employee,
        crate::api::attendance::today,
        crate::api::attendance::history,
    ),
    components(
        schemas(
            RegistrationForm,
            RecognizeForm,
            AttendanceKind,
            EmployeeSummary,
            TodayRow,
            HistoryRow
        )
    ),
    tags(
        (name = "Enrollment", description = "Employee face enrollment"),
        (name = "Recognition", description = "Face recognition and attendance capture"),
        (name = "Employee", description = "Employee management"),
        (name = "Attendance", description = "Attendance queries"),
    )
)]
pub struct ApiDoc;
