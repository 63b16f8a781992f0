#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Authenticated HTTP client for the HRMS backend.
//!
//! Layout: `config.rs` (base URL, timeout, endpoint paths), `token.rs` (JWT
//! expiry checks), `client.rs` (`ApiClient` and the refresh flow),
//! `adapters.rs` (the notification and form transport seams), `error.rs`
//! (`ClientError`).
//!
//! Tokens are read from the shared settings store at send time, so every
//! clone of the client and every other handle on the same store sees a
//! refresh as soon as it is persisted.

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod token;

pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT, Endpoints};
pub use error::{ClientError, ClientResult};
