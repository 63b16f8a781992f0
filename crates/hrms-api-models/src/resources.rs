//! Reference and resource records listed by the console.
//!
//! Fields the console never reads are ignored on decode; every optional
//! backend column defaults so partially populated rows still load.

use serde::{Deserialize, Serialize};

/// Organisational department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub department_name: String,
    /// Creation date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

/// Employee level (grade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub level_name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Job designation, bound to a department and a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designation {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub designation_name: String,
    /// Owning department id.
    #[serde(default)]
    pub department: Option<i64>,
    /// Level id.
    #[serde(default)]
    pub level: Option<i64>,
}

/// Shift policy used by attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPolicy {
    /// Backend identifier.
    pub id: i64,
    /// Shift label.
    #[serde(default, alias = "name")]
    pub shift_type: String,
    /// Start of the shift (`HH:MM[:SS]`).
    #[serde(default)]
    pub checkin: Option<String>,
    /// End of the shift (`HH:MM[:SS]`).
    #[serde(default)]
    pub checkout: Option<String>,
}

/// Named allowance or deduction line of a salary structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryLine {
    /// Line label.
    pub name: String,
    /// Fixed monthly amount.
    pub amount: f64,
}

/// Salary structure as listed by the backend. Percentages arrive as decimal
/// strings from the backend serializer and are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// Backend identifier.
    pub id: i64,
    /// Optional descriptive name.
    #[serde(default)]
    pub name: Option<String>,
    /// Basic pay share.
    #[serde(default)]
    pub basic_percent: Option<serde_json::Value>,
    /// House rent allowance share.
    #[serde(default)]
    pub hra_percent: Option<serde_json::Value>,
    /// Working days used for pro-rating.
    #[serde(default)]
    pub total_working_days: Option<u32>,
    /// Fixed allowances.
    #[serde(default)]
    pub allowances: Vec<SalaryLine>,
    /// Fixed deductions.
    #[serde(default)]
    pub deductions: Vec<SalaryLine>,
}

/// Employee register row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    /// Backend identifier.
    pub id: i64,
    /// Company-assigned employee code.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Department id.
    #[serde(default)]
    pub department: Option<i64>,
    /// Designation id.
    #[serde(default)]
    pub designation: Option<i64>,
}

impl EmployeeSummary {
    /// Full display name, falling back to the employee code.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.employee_id.clone().unwrap_or_else(|| format!("#{}", self.id))
        } else {
            name
        }
    }
}
