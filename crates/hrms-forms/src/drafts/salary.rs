use hrms_api_models::{SalaryLine, paths};
use serde::Serialize;

use crate::error::FieldErrors;
use crate::submit::{FormDraft, FormMessages};
use crate::validate;

/// Allowance or deduction line as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalaryLineDraft {
    /// Line label.
    pub name: String,
    /// Amount as typed.
    pub amount: String,
}

impl SalaryLineDraft {
    /// Line with the given label and amount.
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }
}

/// New or edited salary structure. Empty optional percents are sent as 0,
/// matching the console's numeric inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalaryStructureDraft {
    /// Structure name.
    pub name: String,
    /// Basic pay share of gross.
    pub basic_percent: String,
    /// House rent allowance share.
    pub hra_percent: String,
    /// Conveyance share.
    pub conveyance_percent: String,
    /// Medical share.
    pub medical_percent: String,
    /// Special allowance share.
    pub special_percent: String,
    /// Service charge share.
    pub service_charge_percent: String,
    /// Working days per month.
    pub total_working_days: String,
    /// Fixed allowances.
    pub allowances: Vec<SalaryLineDraft>,
    /// Fixed deductions.
    pub deductions: Vec<SalaryLineDraft>,
}

/// Validated salary structure body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryStructurePayload {
    /// Structure name.
    pub name: String,
    /// Basic pay share of gross.
    pub basic_percent: f64,
    /// House rent allowance share.
    pub hra_percent: f64,
    /// Conveyance share.
    pub conveyance_percent: f64,
    /// Medical share.
    pub medical_percent: f64,
    /// Special allowance share.
    pub special_percent: f64,
    /// Service charge share.
    pub service_charge_percent: f64,
    /// Working days per month, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_working_days: Option<u32>,
    /// Fixed allowances.
    pub allowances: Vec<SalaryLine>,
    /// Fixed deductions.
    pub deductions: Vec<SalaryLine>,
}

impl FormDraft for SalaryStructureDraft {
    type Payload = SalaryStructurePayload;

    const COLLECTION: &'static str = paths::SALARY_STRUCTURES;

    const MESSAGES: FormMessages = FormMessages {
        created: "Salary structure added successfully!",
        updated: "Salary structure updated successfully!",
        failed: "Failed to add salary structure",
        redirect: Some("/admin/salary-structure"),
    };

    fn validate(&self) -> Result<Self::Payload, FieldErrors> {
        let mut errors = FieldErrors::new();
        if !validate::is_present(&self.name) {
            errors.push("name", "Name is required");
        }

        let mut percent = |field: &str, value: &str, required: bool| -> f64 {
            if value.trim().is_empty() && !required {
                return 0.0;
            }
            validate::percent(value).unwrap_or_else(|hint| {
                errors.push(field, hint);
                0.0
            })
        };
        let basic_percent = percent("basic_percent", &self.basic_percent, true);
        let hra_percent = percent("hra_percent", &self.hra_percent, true);
        let conveyance_percent = percent("conveyance_percent", &self.conveyance_percent, false);
        let medical_percent = percent("medical_percent", &self.medical_percent, false);
        let special_percent = percent("special_percent", &self.special_percent, false);
        let service_charge_percent =
            percent("service_charge_percent", &self.service_charge_percent, false);

        let total_working_days = if self.total_working_days.trim().is_empty() {
            None
        } else {
            validate::working_days(&self.total_working_days)
                .map_err(|hint| errors.push("total_working_days", hint))
                .ok()
        };

        let allowances = lines(&mut errors, "allowances", &self.allowances);
        let deductions = lines(&mut errors, "deductions", &self.deductions);

        errors.into_result(|| SalaryStructurePayload {
            name: self.name.trim().to_string(),
            basic_percent,
            hra_percent,
            conveyance_percent,
            medical_percent,
            special_percent,
            service_charge_percent,
            total_working_days,
            allowances,
            deductions,
        })
    }
}

fn lines(errors: &mut FieldErrors, field: &str, drafts: &[SalaryLineDraft]) -> Vec<SalaryLine> {
    let mut lines = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.iter().enumerate() {
        if !validate::is_present(&draft.name) {
            errors.push(format!("{field}[{index}].name"), "Name is required");
        }
        match validate::positive_amount(&draft.amount) {
            Ok(amount) => lines.push(SalaryLine {
                name: draft.name.trim().to_string(),
                amount,
            }),
            Err(hint) => errors.push(format!("{field}[{index}].amount"), hint),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SalaryStructureDraft {
        SalaryStructureDraft {
            name: "Standard".into(),
            basic_percent: "40".into(),
            hra_percent: "20".into(),
            total_working_days: "26".into(),
            allowances: vec![SalaryLineDraft::new("Internet", "500")],
            ..SalaryStructureDraft::default()
        }
    }

    #[test]
    fn optional_percents_default_to_zero() {
        let payload = draft().validate().expect("valid");
        assert!((payload.basic_percent - 40.0).abs() < f64::EPSILON);
        assert!(payload.medical_percent.abs() < f64::EPSILON);
        assert_eq!(payload.total_working_days, Some(26));
        assert_eq!(payload.allowances.len(), 1);
    }

    #[test]
    fn out_of_range_values_are_reported_per_field() {
        let mut draft = draft();
        draft.hra_percent = "120".into();
        draft.total_working_days = "40".into();
        draft.deductions = vec![SalaryLineDraft::new("", "0")];

        let errors = draft.validate().expect_err("invalid");
        assert!(errors.get("hra_percent").is_some());
        assert!(errors.get("total_working_days").is_some());
        assert!(errors.get("deductions[0].name").is_some());
        assert!(errors.get("deductions[0].amount").is_some());
        assert!(errors.get("basic_percent").is_none());
    }
}
