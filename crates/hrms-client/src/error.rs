//! Error types for the HTTP client.

use hrms_api_models::ErrorPayload;
use hrms_settings::SettingsError;
use reqwest::StatusCode;
use thiserror::Error;

/// Primary error type for backend calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("network error while calling {route}")]
    Transport {
        /// Route label of the failed call.
        route: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The backend refused the input (400, 409 or 422).
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Flattened backend message.
        message: String,
        /// Decoded error body.
        payload: ErrorPayload,
    },
    /// The backend failed (5xx).
    #[error("{message} (status {status})")]
    Server {
        /// HTTP status.
        status: u16,
        /// Flattened backend message.
        message: String,
        /// Decoded error body.
        payload: ErrorPayload,
    },
    /// Any other non-success status.
    #[error("{message} (status {status})")]
    Http {
        /// HTTP status.
        status: u16,
        /// Flattened backend message.
        message: String,
        /// Decoded error body.
        payload: ErrorPayload,
    },
    /// The refresh token was refused; both tokens have been cleared.
    #[error("your session has expired, please log in again")]
    SessionExpired,
    /// A path could not be joined onto the base URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// A success response did not have the expected shape.
    #[error("unexpected response from {route}")]
    Decode {
        /// Route label of the call.
        route: String,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Persisted tokens could not be read or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The client could not be built from its configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Classify a non-success response from its status and raw body.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let payload = ErrorPayload::from_body(body);
        let message = payload.display_message().unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        let status = status.as_u16();
        match status {
            400 | 409 | 422 => Self::Rejected {
                status,
                message,
                payload,
            },
            500..=599 => Self::Server {
                status,
                message,
                payload,
            },
            _ => Self::Http {
                status,
                message,
                payload,
            },
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Server { status, .. } | Self::Http { status, .. } => {
                Some(*status)
            }
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Message carried by the backend's error body, if it had one.
    #[must_use]
    pub fn backend_message(&self) -> Option<String> {
        match self {
            Self::Rejected { payload, .. }
            | Self::Server { payload, .. }
            | Self::Http { payload, .. } => payload.display_message(),
            _ => None,
        }
    }

    /// Whether the failure is caused by the caller's input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_become_rejections_with_the_flattened_message() {
        let err = ClientError::from_response(
            StatusCode::BAD_REQUEST,
            br#"{"name": ["This field is required."]}"#,
        );
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "This field is required.");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn server_errors_keep_their_status() {
        let err = ClientError::from_response(StatusCode::BAD_GATEWAY, b"");
        assert!(matches!(err, ClientError::Server { status: 502, .. }));
        assert_eq!(err.to_string(), "Bad Gateway (status 502)");
        assert_eq!(err.backend_message(), None);
    }

    #[test]
    fn other_statuses_are_plain_http_errors() {
        let err = ClientError::from_response(
            StatusCode::FORBIDDEN,
            br#"{"detail": "You do not have permission to perform this action."}"#,
        );
        assert!(!err.is_validation());
        assert_eq!(
            err.backend_message().as_deref(),
            Some("You do not have permission to perform this action.")
        );
    }
}
