//! Relative REST paths consumed by the console.
//!
//! Paths are joined onto the configured API base URL and keep the trailing
//! slash the backend router expects.

/// Unified notification list for the signed-in employee.
pub const NOTIFICATIONS: &str = "employee/employee-notifications/";
/// Server-push notification stream.
pub const NOTIFICATION_STREAM: &str = "notifications/sse/";
/// Credential exchange for an access/refresh token pair.
pub const LOGIN: &str = "app/login/";
/// Access token refresh.
pub const TOKEN_REFRESH: &str = "app/token/refresh/";
/// Department collection.
pub const DEPARTMENTS: &str = "app/departments/";
/// Employee level collection.
pub const LEVELS: &str = "app/levels/";
/// Designation collection.
pub const DESIGNATIONS: &str = "app/designations/";
/// Shift policy collection.
pub const SHIFT_POLICIES: &str = "app/shift-policies/";
/// Salary structure collection.
pub const SALARY_STRUCTURES: &str = "app/salary-structures/";
/// Employee register collection.
pub const EMPLOYEES: &str = "app/employee/";
/// Password change for the signed-in user.
pub const CHANGE_PASSWORD: &str = "app/change-password/";

/// Build the item path for a collection, e.g. `app/departments/7/`.
#[must_use]
pub fn item(collection: &str, id: i64) -> String {
    format!("{}/{id}/", collection.trim_end_matches('/'))
}
