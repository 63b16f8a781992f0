#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]

//! Notification state for the console.
//!
//! Layout:
//! - `store.rs`: `NotificationStore`, the owned list + unread count with a
//!   watch channel of snapshots.
//! - `dedup.rs`: duplicate policy applied to every fetch and push.
//! - `group.rs`: Today / Yesterday / dated grouping for the full listing.
//! - `sse.rs`: incremental parser for the push stream.
//! - `sync.rs`: polling timer and push task tied to a `SyncHandle`.
//! - `source.rs`: transport seams implemented by the HTTP client.

pub mod dedup;
pub mod error;
pub mod group;
pub mod source;
pub mod sse;
pub mod store;
pub mod sync;

pub use dedup::{dedup, is_duplicate, normalize};
pub use error::{NotifyError, NotifyResult};
pub use group::{DayGroup, group_by_day};
pub use source::{NotificationSource, PushSource, PushStream};
pub use sse::{SseDecodeError, SseFrame, SseParser, decode_frame};
pub use store::{FetchOutcome, LoadState, NotificationSnapshot, NotificationStore};
pub use sync::{NotificationSync, SyncHandle, SyncOptions, backoff_delay};
