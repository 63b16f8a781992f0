use hrms_api_models::paths;
use serde::Serialize;

use super::FILL_ALL_FIELDS;
use crate::error::FieldErrors;
use crate::submit::{FormDraft, FormMessages};
use crate::validate;

/// New or edited employee level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelDraft {
    /// Display name as typed.
    pub level_name: String,
    /// Description as typed.
    pub description: String,
}

/// Validated level body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelPayload {
    /// Trimmed display name.
    pub level_name: String,
    /// Trimmed description.
    pub description: String,
}

impl FormDraft for LevelDraft {
    type Payload = LevelPayload;

    const COLLECTION: &'static str = paths::LEVELS;

    const MESSAGES: FormMessages = FormMessages {
        created: "Level created successfully!",
        updated: "Level updated successfully!",
        failed: "Failed to create level. Please try again.",
        redirect: Some("/admin/branch-mgt/level"),
    };

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::has_min_chars(&self.level_name, 2) {
            errors.push("level_name", "Level name must be at least 2 characters long");
        }
        if !validate::has_min_chars(&self.description, 5) {
            errors.push(
                "description",
                "Description must be at least 5 characters long",
            );
        }
        if !errors.is_empty() {
            return Err(errors.with_summary(FILL_ALL_FIELDS));
        }
        Ok(LevelPayload {
            level_name: self.level_name.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_description_is_rejected() {
        let draft = LevelDraft {
            level_name: "L2".into(),
            description: "mid ".into(),
        };
        let errors = draft.validate().expect_err("short description");
        assert!(errors.get("description").is_some());
        assert!(errors.get("level_name").is_none());
    }
}
