//! One draft per resource form.

mod department;
mod designation;
mod employee;
mod level;
mod password;
mod salary;

pub use department::{DepartmentDraft, DepartmentPayload};
pub use designation::{DesignationDraft, DesignationPayload};
pub use employee::EmployeeDraft;
pub use level::{LevelDraft, LevelPayload};
pub use password::{ChangePasswordDraft, ChangePasswordPayload};
pub use salary::{SalaryLineDraft, SalaryStructureDraft, SalaryStructurePayload};

/// Banner shown by multi-field forms when any field fails.
pub(crate) const FILL_ALL_FIELDS: &str = "Please fill in all fields correctly.";
