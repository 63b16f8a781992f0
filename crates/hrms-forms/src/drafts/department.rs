use hrms_api_models::paths;
use serde::Serialize;

use crate::error::FieldErrors;
use crate::submit::{FormDraft, FormMessages};
use crate::validate;

const NAME_HINT: &str = "Department name must be at least 2 characters long";
const NAME_SUMMARY: &str = "Please enter a valid department name (minimum 2 characters).";

/// New or edited department.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentDraft {
    /// Display name as typed.
    pub department_name: String,
}

/// Validated department body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentPayload {
    /// Trimmed display name.
    pub department_name: String,
}

impl DepartmentDraft {
    /// Draft with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            department_name: name.into(),
        }
    }
}

impl FormDraft for DepartmentDraft {
    type Payload = DepartmentPayload;

    const COLLECTION: &'static str = paths::DEPARTMENTS;

    const MESSAGES: FormMessages = FormMessages {
        created: "Department created successfully!",
        updated: "Department updated successfully!",
        failed: "Failed to create department. Please try again.",
        redirect: Some("/admin/branch-mgt/department"),
    };

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::has_min_chars(&self.department_name, 2) {
            errors.push("department_name", NAME_HINT);
        }
        if !errors.is_empty() {
            return Err(errors.with_summary(NAME_SUMMARY));
        }
        Ok(DepartmentPayload {
            department_name: self.department_name.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_character_name_is_rejected_with_hint() {
        let errors = DepartmentDraft::new(" H ").validate().expect_err("too short");
        assert_eq!(errors.get("department_name"), Some(NAME_HINT));
        assert!(errors.to_string().contains("minimum 2 characters"));
    }

    #[test]
    fn name_is_trimmed() {
        let payload = DepartmentDraft::new("  Finance ").validate().expect("valid");
        assert_eq!(payload.department_name, "Finance");
    }
}
