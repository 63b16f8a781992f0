use hrms_api_models::paths;
use serde::Serialize;

use super::FILL_ALL_FIELDS;
use crate::error::FieldErrors;
use crate::submit::{FormDraft, FormMessages, Reference};
use crate::validate;

/// New or edited designation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignationDraft {
    /// Display name as typed.
    pub designation_name: String,
    /// Selected department id.
    pub department: Option<i64>,
    /// Selected level id.
    pub level: Option<i64>,
}

/// Validated designation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignationPayload {
    /// Trimmed display name.
    pub designation_name: String,
    /// Department id.
    pub department: i64,
    /// Level id.
    pub level: i64,
}

impl FormDraft for DesignationDraft {
    type Payload = DesignationPayload;

    const COLLECTION: &'static str = paths::DESIGNATIONS;

    const MESSAGES: FormMessages = FormMessages {
        created: "Designation created successfully!",
        updated: "Designation updated successfully!",
        failed: "Failed to create designation. Please try again.",
        redirect: Some("/admin/branch-mgt/designation"),
    };

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::has_min_chars(&self.designation_name, 2) {
            errors.push(
                "designation_name",
                "Designation name must be at least 2 characters long",
            );
        }
        if self.department.is_none() {
            errors.push("department", "Select a department");
        }
        if self.level.is_none() {
            errors.push("level", "Select a level");
        }
        match (self.department, self.level) {
            (Some(department), Some(level)) if errors.is_empty() => Ok(DesignationPayload {
                designation_name: self.designation_name.trim().to_string(),
                department,
                level,
            }),
            _ => Err(errors.with_summary(FILL_ALL_FIELDS)),
        }
    }

    fn references(payload: &Self::Payload) -> Vec<Reference> {
        vec![
            Reference {
                field: "department",
                collection: paths::DEPARTMENTS,
                id: payload.department,
            },
            Reference {
                field: "level",
                collection: paths::LEVELS,
                id: payload.level,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_and_level_are_required() {
        let draft = DesignationDraft {
            designation_name: "Analyst".into(),
            department: Some(1),
            level: None,
        };
        let errors = draft.validate().expect_err("missing level");
        assert!(errors.get("level").is_some());
        assert!(errors.get("department").is_none());
        assert_eq!(errors.summary(), Some(FILL_ALL_FIELDS));
    }

    #[test]
    fn complete_draft_builds_payload() {
        let draft = DesignationDraft {
            designation_name: " Analyst ".into(),
            department: Some(1),
            level: Some(2),
        };
        let payload = draft.validate().expect("valid");
        assert_eq!(payload.designation_name, "Analyst");
        assert_eq!((payload.department, payload.level), (1, 2));
        let collections: Vec<_> = DesignationDraft::references(&payload)
            .into_iter()
            .map(|reference| (reference.collection, reference.id))
            .collect();
        assert_eq!(
            collections,
            vec![(paths::DEPARTMENTS, 1), (paths::LEVELS, 2)]
        );
    }
}
