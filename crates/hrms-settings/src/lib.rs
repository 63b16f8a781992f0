#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Persisted console settings.
//!
//! Layout: `keys.rs` (storage keys and badge identifiers), `store.rs`
//! (`SettingsStore` with typed accessors), `error.rs` (`SettingsError`).
//!
//! Every piece of client-local state (auth tokens, read markers, badge
//! counters, the push resume cursor) goes through one store so keys and
//! types are declared once. Writes are last-write-wins.

pub mod error;
pub mod keys;
pub mod store;

pub use error::{SettingsError, SettingsResult};
pub use keys::Badge;
pub use store::SettingsStore;
