//! Tracing subscriber setup for the console binaries.
//!
//! Logs always go to stderr so table and JSON output on stdout can be piped.
//! `RUST_LOG` overrides the configured level. Installing twice with the same
//! format is a no-op; a second, different format is refused.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use anyhow::{Result, bail};
use once_cell::sync::OnceCell;
use tracing::debug;
use tracing_subscriber::fmt as fmt_layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when neither the caller nor `RUST_LOG` picks one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Subscriber options.
#[derive(Debug, Clone, Copy)]
pub struct LoggingConfig<'a> {
    /// Filter directive applied when `RUST_LOG` is unset, e.g. `warn` or
    /// `hrms_client=debug`.
    pub level: &'a str,
    /// Line format.
    pub format: LogFormat,
    /// Correlation id echoed once at startup; the API client sends the same
    /// value as `x-request-id`.
    pub trace_id: Option<&'a str>,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::Pretty,
            trace_id: None,
        }
    }
}

/// Line format written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-field human-readable lines.
    Pretty,
    /// Single-line human-readable output without targets.
    Compact,
    /// One JSON object per event.
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unsupported log format '{other}' (expected pretty, compact or json)"
            )),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when a subscriber with a different format is already installed, or
/// when some other crate installed a global subscriber first.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    if let Some(current) = INSTALLED.get() {
        if *current == config.format {
            return Ok(());
        }
        bail!("logging already initialised with the {current} format");
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));
    let registry = tracing_subscriber::registry().with(filter);
    let writer = std::io::stderr;
    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt_layer::layer().with_writer(writer)).try_init(),
        LogFormat::Compact => registry
            .with(fmt_layer::layer().compact().with_target(false).with_writer(writer))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt_layer::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(writer),
            )
            .try_init(),
    };
    if let Err(err) = result {
        bail!("tracing subscriber not installed: {err}");
    }
    let _ = INSTALLED.set(config.format);

    debug!(
        format = %config.format,
        trace_id = config.trace_id.unwrap_or("-"),
        "logging initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" compact ".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        let err = "xml".parse::<LogFormat>().expect_err("unknown");
        assert!(err.contains("pretty, compact or json"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>(), Ok(format));
        }
    }

    #[test]
    fn second_install_with_the_same_format_is_accepted() {
        let config = LoggingConfig {
            level: "warn",
            format: LogFormat::Compact,
            trace_id: Some("test"),
        };
        if init_logging(&config).is_ok() {
            assert_eq!(INSTALLED.get(), Some(&LogFormat::Compact));
            init_logging(&config).expect("idempotent");
            let other = LoggingConfig {
                format: LogFormat::Json,
                ..config
            };
            assert!(init_logging(&other).is_err());
        }
    }
}
