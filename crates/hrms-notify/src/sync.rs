//! Polling timer and push task with an explicit lifetime.
//!
//! # Design
//! - `NotificationSync::start` fetches once, then spawns the poll and push
//!   tasks; the returned [`SyncHandle`] owns both.
//! - Stopping (or dropping) the handle aborts the tasks and closes the
//!   store, so an in-flight fetch or a late push frame cannot commit.
//! - Push reconnects use capped exponential backoff; a server `retry:`
//!   hint replaces the computed delay for the next attempt but never drops
//!   below the initial backoff.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use hrms_api_models::{Notification, PushFrame};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::source::PushSource;
use crate::sse::{SseFrame, SseParser, decode_frame};
use crate::store::NotificationStore;

/// Default interval between list refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Tuning for the sync loop.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Interval between list refreshes.
    pub poll_interval: Duration,
    /// Whether to open the push stream at all.
    pub push_enabled: bool,
    /// First reconnect delay.
    pub initial_backoff: Duration,
    /// Upper bound for reconnect delays.
    pub max_backoff: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            push_enabled: true,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Exponential reconnect delay: `initial * 2^attempt`, clamped to
/// `[initial, max]`.
#[must_use]
pub fn backoff_delay(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT));
    initial
        .saturating_mul(factor)
        .clamp(initial, max.max(initial))
}

/// Entry point for the poll + push loop.
#[derive(Debug)]
pub struct NotificationSync;

impl NotificationSync {
    /// Fetch once, then keep the store fresh until the handle is stopped.
    ///
    /// The initial fetch failing is logged and recorded on the store; the
    /// timer still starts.
    pub async fn start(
        store: Arc<NotificationStore>,
        push: Option<Arc<dyn PushSource>>,
        options: SyncOptions,
    ) -> SyncHandle {
        if let Err(err) = store.fetch_notifications().await {
            warn!(error = %err, "initial notification fetch failed");
        }

        let poll = tokio::spawn(run_poll(Arc::clone(&store), options.poll_interval));
        let push = push
            .filter(|_| options.push_enabled)
            .map(|source| tokio::spawn(run_push(Arc::clone(&store), source, options.clone())));
        info!(
            poll_secs = options.poll_interval.as_secs(),
            push = push.is_some(),
            "notification sync started"
        );

        SyncHandle { store, poll, push }
    }
}

/// Owns the poll and push tasks for one store.
#[derive(Debug)]
pub struct SyncHandle {
    store: Arc<NotificationStore>,
    poll: JoinHandle<()>,
    push: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Store kept fresh by this handle.
    #[must_use]
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// Cancel both tasks and close the store.
    pub fn stop(self) {
        drop(self);
    }

    fn shutdown(&self) {
        self.poll.abort();
        if let Some(push) = &self.push {
            push.abort();
        }
        if !self.store.is_closed() {
            self.store.close();
            info!("notification sync stopped");
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_poll(store: Arc<NotificationStore>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match store.fetch_notifications().await {
            Ok(outcome) => debug!(?outcome, "scheduled notification fetch"),
            Err(NotifyError::Closed) => return,
            Err(err) => warn!(error = %err, "scheduled notification fetch failed"),
        }
    }
}

async fn run_push(store: Arc<NotificationStore>, source: Arc<dyn PushSource>, options: SyncOptions) {
    let mut attempt: u32 = 0;
    loop {
        let cursor = store.settings().push_cursor().unwrap_or_else(|err| {
            warn!(error = %err, "push cursor unreadable; resuming from the start");
            None
        });
        let mut retry_hint = None;

        match source.connect(cursor).await {
            Ok(mut stream) => {
                debug!(?cursor, "push stream connected");
                let mut parser = SseParser::default();
                while let Some(chunk) = stream.next().await {
                    let bytes = match chunk {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            warn!(error = %err, "push stream interrupted");
                            break;
                        }
                    };
                    for frame in parser.push_bytes(&bytes) {
                        if let Some(retry) = frame.retry {
                            retry_hint = Some(Duration::from_millis(retry));
                        }
                        match handle_frame(&store, &frame) {
                            FrameResult::Delivered => attempt = 0,
                            FrameResult::Ignored => {}
                            FrameResult::StoreClosed => return,
                        }
                    }
                }
                if let Some(frame) = parser.finish()
                    && matches!(handle_frame(&store, &frame), FrameResult::StoreClosed)
                {
                    return;
                }
                debug!("push stream ended");
            }
            Err(err) => warn!(error = %err, attempt, "push stream connect failed"),
        }

        if store.is_closed() {
            return;
        }
        let delay = reconnect_delay(retry_hint, attempt, &options);
        attempt = attempt.saturating_add(1);
        if let Some(metrics) = store.metrics() {
            metrics.inc_push_reconnect();
        }
        debug!(delay_ms = delay.as_millis(), attempt, "push stream reconnect scheduled");
        tokio::time::sleep(delay).await;
    }
}

fn reconnect_delay(hint: Option<Duration>, attempt: u32, options: &SyncOptions) -> Duration {
    hint.map_or_else(
        || backoff_delay(attempt, options.initial_backoff, options.max_backoff),
        |hint| hint.max(options.initial_backoff),
    )
}

enum FrameResult {
    Delivered,
    Ignored,
    StoreClosed,
}

fn handle_frame(store: &NotificationStore, frame: &SseFrame) -> FrameResult {
    if store.is_closed() {
        return FrameResult::StoreClosed;
    }
    if frame.data.trim().is_empty() {
        return FrameResult::Ignored;
    }
    let record = |outcome: &str| {
        if let Some(metrics) = store.metrics() {
            metrics.inc_push_event(outcome);
        }
    };
    let event = match decode_frame(frame) {
        Ok(PushFrame::Event(event)) => event,
        Ok(PushFrame::Error { error }) => {
            warn!(error = %error, "push stream reported an error");
            record("rejected");
            return FrameResult::Ignored;
        }
        Err(err) => {
            warn!(error = %err, "push frame ignored");
            record("rejected");
            return FrameResult::Ignored;
        }
    };

    if let Some(id) = event.id.as_number().or_else(|| frame.numeric_id())
        && let Err(err) = store.settings().advance_push_cursor(id)
    {
        warn!(error = %err, "push cursor not persisted");
    }

    match store.apply_push(Notification::from(event)) {
        Ok(true) => {
            record("applied");
            FrameResult::Delivered
        }
        Ok(false) => {
            record("duplicate");
            FrameResult::Delivered
        }
        Err(NotifyError::Closed) => FrameResult::StoreClosed,
        Err(err) => {
            warn!(error = %err, "push event not applied");
            FrameResult::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyResult;
    use crate::source::NotificationSource;
    use async_trait::async_trait;
    use hrms_settings::SettingsStore;

    struct EmptySource;

    #[async_trait]
    impl NotificationSource for EmptySource {
        async fn fetch_all(&self) -> NotifyResult<Vec<Notification>> {
            Ok(Vec::new())
        }
    }

    fn event(id: i64) -> SseFrame {
        SseFrame {
            id: Some(id.to_string()),
            data: format!(
                r#"{{"id": {id}, "title": "Payslip", "message": "", "type": "notification", "created_at": "2024-06-01T09:00:00"}}"#
            ),
            ..SseFrame::default()
        }
    }

    #[test]
    fn frames_after_close_leave_the_cursor_alone() {
        let store = NotificationStore::new(Arc::new(EmptySource), SettingsStore::in_memory());
        assert!(matches!(handle_frame(&store, &event(4)), FrameResult::Delivered));
        assert_eq!(store.settings().push_cursor().expect("cursor"), Some(4));

        store.close();
        assert!(matches!(handle_frame(&store, &event(9)), FrameResult::StoreClosed));
        assert_eq!(store.settings().push_cursor().expect("cursor"), Some(4));
    }

    #[test]
    fn zero_retry_hint_waits_the_initial_backoff() {
        let options = SyncOptions {
            initial_backoff: Duration::from_millis(250),
            ..SyncOptions::default()
        };
        assert_eq!(
            reconnect_delay(Some(Duration::ZERO), 3, &options),
            options.initial_backoff
        );
        assert_eq!(
            reconnect_delay(Some(Duration::from_secs(5)), 0, &options),
            Duration::from_secs(5)
        );
        assert_eq!(
            reconnect_delay(None, 1, &options),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let initial = Duration::from_secs(1);
        let max = Duration::from_secs(30);
        let delays: Vec<u64> = (0..8)
            .map(|attempt| backoff_delay(attempt, initial, max).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
        assert_eq!(backoff_delay(u32::MAX, initial, max), max);
    }

    #[test]
    fn backoff_never_drops_below_initial() {
        let initial = Duration::from_millis(500);
        assert_eq!(
            backoff_delay(0, initial, Duration::from_millis(100)),
            initial
        );
    }
}
