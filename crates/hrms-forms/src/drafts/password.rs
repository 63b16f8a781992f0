use hrms_api_models::paths;
use serde::Serialize;

use crate::error::FieldErrors;
use crate::gateway::FormMethod;
use crate::submit::{FormDraft, FormMessages, FormMode};
use crate::validate;

const MIN_PASSWORD_CHARS: usize = 8;

/// Password change for the signed-in user.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordDraft {
    /// Current password.
    pub old_password: String,
    /// Replacement password.
    pub new_password: String,
    /// Replacement typed again.
    pub confirm_password: String,
}

impl std::fmt::Debug for ChangePasswordDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordDraft").finish_non_exhaustive()
    }
}

/// Validated password change body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ChangePasswordPayload {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

impl std::fmt::Debug for ChangePasswordPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordPayload").finish_non_exhaustive()
    }
}

impl FormDraft for ChangePasswordDraft {
    type Payload = ChangePasswordPayload;

    const COLLECTION: &'static str = paths::CHANGE_PASSWORD;

    const MESSAGES: FormMessages = FormMessages {
        created: "Password updated successfully.",
        updated: "Password updated successfully.",
        failed: "Something went wrong.",
        redirect: None,
    };

    fn route(_mode: FormMode) -> (FormMethod, String) {
        (FormMethod::Patch, Self::COLLECTION.to_string())
    }

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::is_present(&self.old_password) {
            errors.push("old_password", "Current password is required");
        }
        if self.new_password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(
                "new_password",
                "New password must be at least 8 characters long",
            );
        } else if self.new_password == self.old_password {
            errors.push(
                "new_password",
                "New password must differ from the current one",
            );
        }
        if self.confirm_password != self.new_password {
            errors.push("confirm_password", "Passwords do not match");
        }
        errors.into_result(|| ChangePasswordPayload {
            old_password: self.old_password.clone(),
            new_password: self.new_password.clone(),
            confirm_password: self.confirm_password.clone(),
        })
    }
}
