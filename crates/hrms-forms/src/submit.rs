//! Submission flow shared by every resource form.
//!
//! # Design
//! - Validate, check references, encode, send, in that order; field errors
//!   return before anything is written.
//! - Foreign keys are checked against their reference lists, each list
//!   loaded once per submission.
//! - Backend failures become [`FormError::Rejected`] carrying the flattened
//!   message, falling back to the form's own failure text.
//! - Success reports where the console navigates next and after how long;
//!   callers decide whether to wait.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use hrms_api_models::paths;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{FieldErrors, FormError};
use crate::gateway::{FormBody, FormMethod, FormRequest, ResourceGateway};

/// Delay between the success message and the redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Whether a draft creates a resource or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// POST to the collection.
    Create,
    /// PUT to the item.
    Update(i64),
}

/// User-facing texts for one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormMessages {
    /// Shown after a successful create.
    pub created: &'static str,
    /// Shown after a successful update.
    pub updated: &'static str,
    /// Shown when the backend fails without a readable message.
    pub failed: &'static str,
    /// Listing the console returns to after success.
    pub redirect: Option<&'static str>,
}

/// Foreign key in a validated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Payload field holding the id.
    pub field: &'static str,
    /// Collection that lists the valid ids.
    pub collection: &'static str,
    /// Selected id.
    pub id: i64,
}

/// A resource draft that can be validated and encoded.
pub trait FormDraft {
    /// Validated payload.
    type Payload: Serialize;

    /// Collection path relative to the API base URL.
    const COLLECTION: &'static str;

    /// Texts used by the submission flow.
    const MESSAGES: FormMessages;

    /// Check every field and build the payload.
    ///
    /// # Errors
    ///
    /// Returns the accumulated [`FieldErrors`] when any field fails.
    fn validate(&self) -> Result<Self::Payload, FieldErrors>;

    /// Verb and path for `mode`.
    fn route(mode: FormMode) -> (FormMethod, String) {
        match mode {
            FormMode::Create => (FormMethod::Post, Self::COLLECTION.to_string()),
            FormMode::Update(id) => (FormMethod::Put, paths::item(Self::COLLECTION, id)),
        }
    }

    /// Ids in `payload` that must exist in a reference list.
    fn references(_payload: &Self::Payload) -> Vec<Reference> {
        Vec::new()
    }

    /// Encode the payload; JSON unless the draft overrides it.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload cannot be serialised.
    fn body(&self, payload: &Self::Payload) -> Result<FormBody, FormError> {
        Ok(FormBody::Json(serde_json::to_value(payload)?))
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Success banner.
    pub message: String,
    /// Listing to navigate to.
    pub redirect: Option<String>,
    /// Delay before navigating.
    pub redirect_after: Duration,
    /// Decoded response body.
    pub response: Value,
}

/// Runs drafts through validation and the gateway.
#[derive(Clone)]
pub struct FormSubmitter {
    gateway: Arc<dyn ResourceGateway>,
}

impl FormSubmitter {
    /// Submitter over `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn ResourceGateway>) -> Self {
        Self { gateway }
    }

    /// Validate and send `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Invalid`] when a field fails or names an id
    /// missing from its reference list, [`FormError::Rejected`] when the
    /// backend refuses it.
    pub async fn submit<D: FormDraft>(
        &self,
        draft: &D,
        mode: FormMode,
    ) -> Result<SubmitOutcome, FormError> {
        let payload = draft.validate()?;
        self.check_references(&D::references(&payload)).await?;
        let body = draft.body(&payload)?;
        let (method, path) = D::route(mode);
        let request = FormRequest {
            method,
            path: path.clone(),
            body,
        };

        match self.gateway.send(request).await {
            Ok(response) => {
                info!(path = %path, ?method, "form submitted");
                let fallback = match mode {
                    FormMode::Create => D::MESSAGES.created,
                    FormMode::Update(_) => D::MESSAGES.updated,
                };
                let message = response
                    .get("detail")
                    .and_then(Value::as_str)
                    .filter(|detail| !detail.trim().is_empty())
                    .unwrap_or(fallback)
                    .to_string();
                Ok(SubmitOutcome {
                    message,
                    redirect: D::MESSAGES.redirect.map(str::to_string),
                    redirect_after: REDIRECT_DELAY,
                    response,
                })
            }
            Err(err) => {
                warn!(path = %path, status = ?err.status, error = %err, "form rejected");
                Err(FormError::Rejected {
                    status: err.status,
                    message: err
                        .message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| D::MESSAGES.failed.to_string()),
                })
            }
        }
    }

    /// Delete one item of `D`'s collection.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Rejected`] when the backend refuses the delete.
    pub async fn delete<D: FormDraft>(&self, id: i64) -> Result<(), FormError> {
        let request = FormRequest {
            method: FormMethod::Delete,
            path: paths::item(D::COLLECTION, id),
            body: FormBody::Empty,
        };
        self.gateway
            .send(request)
            .await
            .map(|_| ())
            .map_err(|err| FormError::Rejected {
                status: err.status,
                message: err.message.unwrap_or_else(|| format!("Failed to delete item {id}.")),
            })
    }

    /// Load a reference list (departments, levels, ...) as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Rejected`] when the list cannot be loaded.
    pub async fn reference_list(&self, path: &str) -> Result<Value, FormError> {
        self.gateway
            .list(path)
            .await
            .map_err(|err| FormError::Rejected {
                status: err.status,
                message: err
                    .message
                    .unwrap_or_else(|| "Failed to load reference data".to_string()),
            })
    }

    async fn check_references(&self, references: &[Reference]) -> Result<(), FormError> {
        let mut known: BTreeMap<&str, BTreeSet<i64>> = BTreeMap::new();
        let mut errors = FieldErrors::new();
        for reference in references {
            if !known.contains_key(reference.collection) {
                let rows = self.reference_list(reference.collection).await?;
                known.insert(reference.collection, reference_ids(&rows));
            }
            let exists = known
                .get(reference.collection)
                .is_some_and(|ids| ids.contains(&reference.id));
            if !exists {
                errors.push(
                    reference.field,
                    format!("No {} with id {}", reference.field.replace('_', " "), reference.id),
                );
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormError::Invalid(errors))
        }
    }
}

/// Ids of a bare array or a paginated `{"results": [...]}` listing.
fn reference_ids(rows: &Value) -> BTreeSet<i64> {
    rows.get("results")
        .unwrap_or(rows)
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get("id").and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}

impl std::fmt::Debug for FormSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSubmitter").finish_non_exhaustive()
    }
}
