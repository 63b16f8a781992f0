#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Resource forms: drafts, local validation and the submission flow.
//!
//! Layout: `drafts/` (one module per resource), `validate.rs` (shared field
//! rules), `gateway.rs` (request shape and the transport seam), `submit.rs`
//! (`FormSubmitter`), `error.rs` (`FieldErrors`, `FormError`).
//!
//! Validation always runs before the gateway is called; a draft with field
//! errors never reaches the network.

pub mod drafts;
pub mod error;
pub mod gateway;
pub mod submit;
pub mod validate;

pub use drafts::{
    ChangePasswordDraft, DepartmentDraft, DesignationDraft, EmployeeDraft, LevelDraft,
    SalaryLineDraft, SalaryStructureDraft,
};
pub use error::{FieldError, FieldErrors, FormError};
pub use gateway::{FileUpload, FormBody, FormMethod, FormRequest, GatewayError, ResourceGateway};
pub use submit::{
    FormDraft, FormMessages, FormMode, FormSubmitter, REDIRECT_DELAY, Reference, SubmitOutcome,
};
