#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]
//! Shared HTTP DTOs for the HRMS console backend.
//!
//! These types are used by the client, the notification store and the form
//! layer so the request/response contract lives in one place. The backend is
//! an external collaborator; only the fields the console consumes are modelled.

pub mod auth;
pub mod errors;
pub mod notifications;
pub mod paths;
pub mod resources;

pub use auth::{LoginRequest, RefreshRequest, RefreshResponse, TokenPair};
pub use errors::ErrorPayload;
pub use notifications::{
    Notification, NotificationId, NotificationKind, PushEvent, PushFrame, calendar_day,
    parse_timestamp,
};
pub use resources::{
    Department, Designation, EmployeeSummary, Level, SalaryLine, SalaryStructure, ShiftPolicy,
};
