//! Error types for the notification store and sync loop.

use std::error::Error as StdError;

use hrms_settings::SettingsError;
use thiserror::Error;

/// Boxed transport error carried through the source seams.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Primary error type for notification operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification source (list endpoint) failed.
    #[error("{message}")]
    Source {
        /// Display text kept on the store snapshot.
        message: String,
        /// Underlying transport failure.
        #[source]
        source: BoxError,
    },
    /// The push stream failed to connect or dropped.
    #[error("push stream failed: {message}")]
    Stream {
        /// Failure description.
        message: String,
    },
    /// Persisted read markers or cursor could not be accessed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The store was closed; nothing more is committed.
    #[error("notification store is closed")]
    Closed,
}

impl NotifyError {
    /// Wrap a transport error from a [`crate::NotificationSource`].
    pub fn source<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Source {
            message: err.to_string(),
            source: Box::new(err),
        }
    }

    /// Describe a push stream failure.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }
}

/// Convenience alias for notification results.
pub type NotifyResult<T> = Result<T, NotifyError>;
