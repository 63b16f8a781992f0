//! Counters for API traffic, token refreshes and the notification feed.
//!
//! Each `Metrics` owns its registry, so tests can create as many as they
//! like without clashing on the global default registry.

use std::sync::Arc;

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Prometheus-backed metrics registry shared by the client and sync loops.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    notification_fetches_total: IntCounterVec,
    push_events_total: IntCounterVec,
    push_reconnects_total: IntCounter,
    token_refreshes_total: IntCounterVec,
    unread_notifications: IntGauge,
}

/// Point-in-time view of the notification counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Successful list fetches.
    pub fetches_ok: u64,
    /// Failed list fetches.
    pub fetches_failed: u64,
    /// Push events merged into the store.
    pub push_applied: u64,
    /// Push events dropped as duplicates.
    pub push_duplicates: u64,
    /// Push frames that could not be decoded or carried an error.
    pub push_rejected: u64,
    /// Push stream reconnect attempts.
    pub push_reconnects: u64,
    /// Unread count after the last store update.
    pub unread: i64,
}

impl Metrics {
    /// Fresh registry with every console collector registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Outbound API requests by route and status"),
            &["route", "code"],
        )?;
        let notification_fetches_total = IntCounterVec::new(
            Opts::new(
                "notification_fetches_total",
                "Notification list fetches by outcome",
            ),
            &["outcome"],
        )?;
        let push_events_total = IntCounterVec::new(
            Opts::new("push_events_total", "Push frames received by outcome"),
            &["outcome"],
        )?;
        let push_reconnects_total = IntCounter::with_opts(Opts::new(
            "push_reconnects_total",
            "Push stream reconnect attempts",
        ))?;
        let token_refreshes_total = IntCounterVec::new(
            Opts::new("token_refreshes_total", "Access token refreshes by outcome"),
            &["outcome"],
        )?;
        let unread_notifications = IntGauge::with_opts(Opts::new(
            "unread_notifications",
            "Unread notifications in the local store",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(notification_fetches_total.clone()))?;
        registry.register(Box::new(push_events_total.clone()))?;
        registry.register(Box::new(push_reconnects_total.clone()))?;
        registry.register(Box::new(token_refreshes_total.clone()))?;
        registry.register(Box::new(unread_notifications.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                notification_fetches_total,
                push_events_total,
                push_reconnects_total,
                token_refreshes_total,
                unread_notifications,
            }),
        })
    }

    /// Count one outbound call; `status` is 0 when no response arrived.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Record the outcome of a notification list fetch (`ok`, `failed`, `stale`).
    pub fn inc_fetch(&self, outcome: &str) {
        self.inner
            .notification_fetches_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record the outcome of a push frame (`applied`, `duplicate`, `rejected`).
    pub fn inc_push_event(&self, outcome: &str) {
        self.inner
            .push_events_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Increment the push reconnect counter.
    pub fn inc_push_reconnect(&self) {
        self.inner.push_reconnects_total.inc();
    }

    /// Record the outcome of an access token refresh.
    pub fn inc_token_refresh(&self, outcome: &str) {
        self.inner
            .token_refreshes_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the unread gauge.
    pub fn set_unread(&self, count: usize) {
        self.inner
            .unread_notifications
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Prometheus text exposition of every collector.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding fails.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("encoding console metrics")?;
        String::from_utf8(buffer).context("console metrics are not UTF-8")
    }

    /// Take a point-in-time snapshot of the notification counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let fetch = |outcome: &str| {
            self.inner
                .notification_fetches_total
                .with_label_values(&[outcome])
                .get()
        };
        let push = |outcome: &str| {
            self.inner
                .push_events_total
                .with_label_values(&[outcome])
                .get()
        };
        MetricsSnapshot {
            fetches_ok: fetch("ok"),
            fetches_failed: fetch("failed"),
            push_applied: push("applied"),
            push_duplicates: push("duplicate"),
            push_rejected: push("rejected"),
            push_reconnects: self.inner.push_reconnects_total.get(),
            unread: self.inner.unread_notifications.get(),
        }
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_snapshot_and_render() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_fetch("ok");
        metrics.inc_fetch("ok");
        metrics.inc_fetch("failed");
        metrics.inc_push_event("duplicate");
        metrics.inc_push_reconnect();
        metrics.inc_http_request("notifications", 200);
        metrics.set_unread(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.fetches_ok, 2);
        assert_eq!(snapshot.fetches_failed, 1);
        assert_eq!(snapshot.push_duplicates, 1);
        assert_eq!(snapshot.push_reconnects, 1);
        assert_eq!(snapshot.unread, 4);

        let rendered = metrics.render()?;
        assert!(rendered.contains("notification_fetches_total"));
        assert!(rendered.contains("http_requests_total{code=\"200\",route=\"notifications\"} 1"));
        Ok(())
    }

    #[test]
    fn independent_registries_do_not_collide() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_push_event("applied");
        assert_eq!(first.snapshot().push_applied, 1);
        assert_eq!(second.snapshot().push_applied, 0);
        Ok(())
    }
}
