//! Employee registration draft.
//!
//! The payload is a loose JSON object rather than a fixed struct: empty
//! inputs are dropped entirely so the backend applies its own defaults.

use std::collections::BTreeMap;

use hrms_api_models::paths;
use serde_json::{Map, Value};

use crate::error::{FieldErrors, FormError};
use crate::gateway::{FileUpload, FormBody};
use crate::submit::{FormDraft, FormMessages, Reference};
use crate::validate;

const REFERRAL_SOURCE: &str = "internalreference";
const ID_FIELDS: [&str; 4] = ["department", "designation", "level", "reporting_manager"];
const REFERENCE_FIELDS: [(&str, &str); 3] = [
    ("department", paths::DEPARTMENTS),
    ("designation", paths::DESIGNATIONS),
    ("level", paths::LEVELS),
];
const DATE_FIELDS: [&str; 3] = ["date_of_birth", "date_of_joining", "date_of_releaving"];

/// New employee as entered in the register form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeDraft {
    /// Given name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: String,
    /// Family name.
    pub last_name: String,
    /// Work email.
    pub email: String,
    /// Mobile number.
    pub mobile: String,
    /// Gender label.
    pub gender: String,
    /// Birth date in any accepted date format.
    pub date_of_birth: String,
    /// Joining date in any accepted date format.
    pub date_of_joining: String,
    /// Relieving date from the previous employer.
    pub date_of_releaving: String,
    /// Department id as typed or selected.
    pub department: String,
    /// Designation id.
    pub designation: String,
    /// Level id.
    pub level: String,
    /// Reporting manager employee id.
    pub reporting_manager: String,
    /// Hiring channel (`internalreference`, `linkedin`, ...).
    pub source_of_employment: String,
    /// Referrer; only sent for internal references.
    pub who_referred: String,
    /// Remaining optional text fields (addresses, bank, statutory ids).
    pub extra: BTreeMap<String, String>,
    /// Asset ids issued at joining.
    pub asset_details: Vec<i64>,
    /// Profile photo; switches the body to multipart.
    pub photo: Option<FileUpload>,
}

impl EmployeeDraft {
    fn named_fields(&self) -> [(&'static str, &str); 15] {
        [
            ("first_name", &self.first_name),
            ("middle_name", &self.middle_name),
            ("last_name", &self.last_name),
            ("gender", &self.gender),
            ("email", &self.email),
            ("mobile", &self.mobile),
            ("date_of_birth", &self.date_of_birth),
            ("date_of_joining", &self.date_of_joining),
            ("date_of_releaving", &self.date_of_releaving),
            ("department", &self.department),
            ("designation", &self.designation),
            ("level", &self.level),
            ("reporting_manager", &self.reporting_manager),
            ("source_of_employment", &self.source_of_employment),
            ("who_referred", &self.who_referred),
        ]
    }
}

impl FormDraft for EmployeeDraft {
    type Payload = Map<String, Value>;

    const COLLECTION: &'static str = paths::EMPLOYEES;

    const MESSAGES: FormMessages = FormMessages {
        created: "Employee registered successfully!",
        updated: "Employee updated successfully!",
        failed: "Failed to register employee",
        redirect: Some("/admin/employee-register"),
    };

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::is_present(&self.first_name) {
            errors.push("first_name", "First name is required");
        }
        if !validate::is_present(&self.last_name) {
            errors.push("last_name", "Last name is required");
        }
        if !validate::is_email(&self.email) {
            errors.push("email", "Enter a valid email address");
        }
        if !validate::is_mobile(&self.mobile) {
            errors.push("mobile", "Mobile number must be 10 or 11 digits");
        }
        if !validate::is_present(&self.date_of_joining) {
            errors.push("date_of_joining", "Date of joining is required");
        }
        for field in DATE_FIELDS {
            let value = self
                .named_fields()
                .into_iter()
                .find_map(|(name, value)| (name == field).then_some(value))
                .unwrap_or_default();
            if validate::is_present(value) && validate::normalize_date(value).is_none() {
                errors.push(field, "Enter a valid date (YYYY-MM-DD)");
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut payload = Map::new();
        for (field, value) in self.named_fields() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if ID_FIELDS.contains(&field) {
                if let Some(id) = validate::parse_id(value) {
                    payload.insert(field.to_string(), Value::from(id));
                }
                continue;
            }
            if DATE_FIELDS.contains(&field) {
                if let Some(date) = validate::normalize_date(value) {
                    payload.insert(field.to_string(), Value::from(date));
                }
                continue;
            }
            payload.insert(field.to_string(), Value::from(value));
        }
        for (field, value) in &self.extra {
            let value = value.trim();
            if !value.is_empty() && !payload.contains_key(field) {
                payload.insert(field.clone(), Value::from(value));
            }
        }
        if payload.get("source_of_employment").and_then(Value::as_str) != Some(REFERRAL_SOURCE) {
            payload.remove("who_referred");
        }
        if !self.asset_details.is_empty() {
            payload.insert(
                "asset_details".to_string(),
                Value::from(self.asset_details.clone()),
            );
        }
        Ok(payload)
    }

    fn references(payload: &Self::Payload) -> Vec<Reference> {
        REFERENCE_FIELDS
            .into_iter()
            .filter_map(|(field, collection)| {
                payload.get(field).and_then(Value::as_i64).map(|id| Reference {
                    field,
                    collection,
                    id,
                })
            })
            .collect()
    }

    fn body(&self, payload: &Self::Payload) -> Result<FormBody, FormError> {
        let Some(photo) = &self.photo else {
            return Ok(FormBody::Json(Value::Object(payload.clone())));
        };
        let mut fields = Vec::with_capacity(payload.len());
        for (key, value) in payload {
            match value {
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        fields.push((format!("{key}[{index}]"), scalar_text(item)));
                    }
                }
                Value::Null | Value::Object(_) => {}
                scalar => fields.push((key.clone(), scalar_text(scalar))),
            }
        }
        Ok(FormBody::Multipart {
            fields,
            files: vec![("photo".to_string(), photo.clone())],
        })
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
