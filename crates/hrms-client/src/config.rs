//! Client configuration.

use std::time::Duration;

use hrms_api_models::paths;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Paths of the endpoints the client calls on its own behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Unified notification list.
    pub notifications: String,
    /// Server-push stream.
    pub stream: String,
    /// Credential exchange.
    pub login: String,
    /// Access token refresh.
    pub refresh: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            notifications: paths::NOTIFICATIONS.to_string(),
            stream: paths::NOTIFICATION_STREAM.to_string(),
            login: paths::LOGIN.to_string(),
            refresh: paths::TOKEN_REFRESH.to_string(),
        }
    }
}

/// Connection settings for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    /// Timeout for regular requests; the push stream has none.
    pub timeout: Duration,
    /// Value sent as `x-request-id` on every request.
    pub request_id: String,
    /// Endpoint paths.
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeout and endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut url = Url::parse(base_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported scheme '{}' in API URL",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            timeout: DEFAULT_TIMEOUT,
            request_id: uuid::Uuid::new_v4().to_string(),
            endpoints: Endpoints::default(),
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the request id header value.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Override the endpoint paths.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path relative to the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined URL is invalid.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let config = ClientConfig::new("https://hr.example.com/api").expect("valid url");
        assert_eq!(config.base_url().as_str(), "https://hr.example.com/api/");
        assert_eq!(
            config.url("/app/departments/").expect("join").as_str(),
            "https://hr.example.com/api/app/departments/"
        );
    }

    #[test]
    fn non_http_schemes_are_refused() {
        let err = ClientConfig::new("ftp://hr.example.com").expect_err("ftp refused");
        assert!(matches!(err, ClientError::Config(_)));
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn defaults_match_the_backend_routes() {
        let config = ClientConfig::new("http://localhost:8000/").expect("valid url");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.endpoints.refresh, "app/token/refresh/");
        assert!(!config.request_id.is_empty());
    }
}
