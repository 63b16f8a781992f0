//! CLI error type and the application context shared by command handlers.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use hrms_client::{ApiClient, ClientConfig, ClientError, Endpoints};
use hrms_forms::{FormError, FormSubmitter};
use hrms_notify::{NotificationStore, NotifyError};
use hrms_settings::{SettingsError, SettingsStore};
use hrms_telemetry::Metrics;
use url::Url;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Failure(err.into())
        }
    }
}

impl From<FormError> for CliError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(errors) => {
                let mut lines = vec![errors.to_string()];
                lines.extend(
                    errors
                        .iter()
                        .map(|field| format!("  {}: {}", field.field, field.message)),
                );
                Self::Validation(lines.join("\n"))
            }
            other if other.is_validation() => Self::Validation(other.to_string()),
            other => Self::Failure(other.into()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Failure(err.into())
    }
}

impl From<NotifyError> for CliError {
    fn from(err: NotifyError) -> Self {
        Self::Failure(err.into())
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: ApiClient,
    pub(crate) settings: SettingsStore,
    pub(crate) metrics: Metrics,
}

impl AppContext {
    /// Build an authenticated client over `settings`.
    pub(crate) fn new(
        base_url: &Url,
        timeout: Duration,
        endpoints: Endpoints,
        settings: SettingsStore,
        trace_id: &str,
    ) -> CliResult<Self> {
        let config = ClientConfig::new(base_url.as_str())?
            .with_timeout(timeout)
            .with_endpoints(endpoints)
            .with_request_id(trace_id);
        let metrics = Metrics::new().map_err(CliError::failure)?;
        let client = ApiClient::with_metrics(config, settings.clone(), metrics.clone())?;
        Ok(Self {
            client,
            settings,
            metrics,
        })
    }

    pub(crate) fn submitter(&self) -> FormSubmitter {
        FormSubmitter::new(Arc::new(self.client.clone()))
    }

    pub(crate) fn notification_store(&self) -> NotificationStore {
        NotificationStore::new(Arc::new(self.client.clone()), self.settings.clone())
            .with_metrics(self.metrics.clone())
    }

    /// Fail early with a friendly hint when nobody is signed in.
    pub(crate) fn require_session(&self) -> CliResult<()> {
        if self.settings.access_token()?.is_some() {
            Ok(())
        } else {
            Err(CliError::validation(
                "not signed in; run `hrms login` first",
            ))
        }
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Parse a `KEY=VALUE` pair.
pub(crate) fn parse_pair(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{input}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{input}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Context pointed at a mock server with throwaway settings.
#[cfg(test)]
pub(crate) fn test_context(server: &httpmock::MockServer) -> AppContext {
    let base_url = parse_url(&format!("{}/api/", server.base_url())).expect("mock URL");
    AppContext::new(
        &base_url,
        Duration::from_secs(5),
        Endpoints::default(),
        SettingsStore::in_memory(),
        "test-trace",
    )
    .expect("context builds")
}
