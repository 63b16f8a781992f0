//! Error types for form validation and submission.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Payload field name (e.g. `department_name`).
    pub field: String,
    /// Hint shown next to the field.
    pub message: String,
}

/// Validation failures for a whole draft, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    summary: Option<String>,
    fields: Vec<FieldError>,
}

impl FieldErrors {
    /// Empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Set the banner shown above the form when any field fails.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First hint recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// Banner text, if the draft sets one.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Every field failure.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.fields.iter()
    }

    /// `Ok(value)` when empty, otherwise the accumulated errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(summary) = &self.summary {
            return f.write_str(summary);
        }
        let mut first = true;
        for error in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Primary error type for form submission.
#[derive(Debug, Error)]
pub enum FormError {
    /// Local validation failed; nothing was sent.
    #[error("{0}")]
    Invalid(#[from] FieldErrors),
    /// The backend (or the transport) refused the submission.
    #[error("{message}")]
    Rejected {
        /// HTTP status when a response was received.
        status: Option<u16>,
        /// Flattened backend message, or the form's fallback text.
        message: String,
    },
    /// The payload could not be encoded.
    #[error("form payload could not be encoded")]
    Encode(#[from] serde_json::Error),
}

impl FormError {
    /// Whether the failure is the user's to fix (field errors or a 4xx).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Invalid(_) => true,
            Self::Rejected { status, .. } => {
                status.is_some_and(|status| (400..500).contains(&status) && status != 401)
            }
            Self::Encode(_) => false,
        }
    }
}
