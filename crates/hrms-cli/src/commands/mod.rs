//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod notifications;
pub(crate) mod resources;
