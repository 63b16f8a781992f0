//! Owned notification store.
//!
//! # Design
//! - One store per signed-in session, shared as `Arc`; callers never see the
//!   list behind the lock, only cloned [`NotificationSnapshot`]s.
//! - The lock is held for synchronous sections only. Network calls run
//!   outside it and commit afterwards under a generation check, so only the
//!   most recently started fetch can replace the list.
//! - Once closed, fetch results and push events are refused; read markers
//!   can still be written since they only touch settings.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hrms_api_models::{Notification, NotificationId};
use hrms_settings::SettingsStore;
use hrms_telemetry::Metrics;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::dedup;
use crate::error::{NotifyError, NotifyResult};
use crate::source::NotificationSource;

/// Loading lifecycle of the notification list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// No fetch has started yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last committed fetch succeeded.
    Ready,
    /// The last committed fetch failed; see [`NotificationSnapshot::error`].
    Failed,
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSnapshot {
    /// Deduplicated list, newest pushes first, otherwise server order.
    pub notifications: Vec<Notification>,
    /// Loaded notifications without a read marker.
    pub unread_count: usize,
    /// Loaded ids that carry a read marker.
    pub read: BTreeSet<NotificationId>,
    /// Loading lifecycle.
    pub state: LoadState,
    /// Message of the last failed fetch.
    pub error: Option<String>,
}

impl NotificationSnapshot {
    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// Whether `id` carries a read marker.
    #[must_use]
    pub fn is_read(&self, id: &NotificationId) -> bool {
        self.read.contains(id)
    }
}

/// Result of a fetch that reached the commit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the list.
    Committed,
    /// A newer fetch started meanwhile; the result was dropped.
    Stale,
}

/// Notification list, unread count and load state for one session.
pub struct NotificationStore {
    source: Arc<dyn NotificationSource>,
    settings: SettingsStore,
    metrics: Option<Metrics>,
    generation: AtomicU64,
    closed: AtomicBool,
    state: Mutex<StoreState>,
    updates: watch::Sender<NotificationSnapshot>,
}

#[derive(Debug, Default)]
struct StoreState {
    notifications: Vec<Notification>,
    load: LoadState,
    error: Option<String>,
}

impl NotificationStore {
    /// Build an empty store over `source`, reading markers from `settings`.
    #[must_use]
    pub fn new(source: Arc<dyn NotificationSource>, settings: SettingsStore) -> Self {
        let (updates, _) = watch::channel(NotificationSnapshot::default());
        Self {
            source,
            settings,
            metrics: None,
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            state: Mutex::new(StoreState::default()),
            updates,
        }
    }

    /// Attach a metrics registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Settings backing the read markers.
    #[must_use]
    pub const fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Attached metrics registry, if any.
    #[must_use]
    pub const fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Fetch the unified list and replace the loaded notifications.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Closed`] once the store is closed, or the
    /// source error after recording it on the snapshot.
    pub async fn fetch_notifications(&self) -> NotifyResult<FetchOutcome> {
        self.ensure_open()?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock();
            state.load = LoadState::Loading;
            self.publish(&state);
        }

        let result = self.source.fetch_all().await;

        let mut state = self.lock();
        self.ensure_open()?;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale notification fetch");
            self.record_fetch("stale");
            return Ok(FetchOutcome::Stale);
        }
        match result {
            Ok(notifications) => {
                let received = notifications.len();
                state.notifications = dedup::dedup(notifications);
                state.load = LoadState::Ready;
                state.error = None;
                debug!(
                    received,
                    kept = state.notifications.len(),
                    "notification list refreshed"
                );
                self.record_fetch("ok");
                self.publish(&state);
                Ok(FetchOutcome::Committed)
            }
            Err(err) => {
                state.load = LoadState::Failed;
                state.error = Some(err.to_string());
                self.record_fetch("failed");
                self.publish(&state);
                Err(err)
            }
        }
    }

    /// Mark one notification as read. Purely local: no server call, no refetch.
    ///
    /// # Errors
    ///
    /// Returns an error when the read markers cannot be persisted.
    pub fn mark_as_read(&self, id: NotificationId) -> NotifyResult<()> {
        let state = self.lock();
        self.settings.add_read_markers([id])?;
        self.publish(&state);
        Ok(())
    }

    /// Mark every loaded notification as read. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error when the read markers cannot be persisted.
    pub fn mark_all_as_read(&self) -> NotifyResult<()> {
        let state = self.lock();
        let ids: Vec<NotificationId> = state
            .notifications
            .iter()
            .map(|notification| notification.id.clone())
            .collect();
        self.settings.add_read_markers(ids)?;
        self.publish(&state);
        Ok(())
    }

    /// Prepend a pushed notification unless it duplicates a loaded one.
    ///
    /// Returns whether the notification was added.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Closed`] once the store is closed.
    pub fn apply_push(&self, notification: Notification) -> NotifyResult<bool> {
        let mut state = self.lock();
        self.ensure_open()?;
        if state
            .notifications
            .iter()
            .any(|loaded| dedup::is_duplicate(loaded, &notification))
        {
            debug!(id = %notification.id, "push duplicates a loaded notification");
            return Ok(false);
        }
        state.notifications.insert(0, notification);
        self.publish(&state);
        Ok(true)
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.build_snapshot(&self.lock())
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.updates.subscribe()
    }

    /// Refuse all later fetch results and push events.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("notification store closed");
        }
    }

    /// Whether [`NotificationStore::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> NotifyResult<()> {
        if self.is_closed() {
            Err(NotifyError::Closed)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_fetch(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_fetch(outcome);
        }
    }

    fn build_snapshot(&self, state: &StoreState) -> NotificationSnapshot {
        let markers = self.settings.read_markers().unwrap_or_else(|err| {
            warn!(error = %err, "read markers unavailable; treating all as unread");
            BTreeSet::new()
        });
        let read: BTreeSet<NotificationId> = state
            .notifications
            .iter()
            .filter(|notification| markers.contains(&notification.id))
            .map(|notification| notification.id.clone())
            .collect();
        NotificationSnapshot {
            unread_count: state.notifications.len().saturating_sub(read.len()),
            notifications: state.notifications.clone(),
            read,
            state: state.load,
            error: state.error.clone(),
        }
    }

    fn publish(&self, state: &StoreState) {
        let snapshot = self.build_snapshot(state);
        if let Some(metrics) = &self.metrics {
            metrics.set_unread(snapshot.unread_count);
        }
        self.updates.send_replace(snapshot);
    }
}

impl std::fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStore")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hrms_api_models::NotificationKind;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    fn item(id: i64, title: &str, description: &str, date: &str) -> Notification {
        Notification {
            id: NotificationId::Number(id),
            title: title.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            kind: NotificationKind::Notification,
        }
    }

    /// Serves queued responses; each one waits on its gate when present.
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<(Option<oneshot::Receiver<()>>, NotifyResult<Vec<Notification>>)>>,
    }

    impl ScriptedSource {
        fn ready(self, result: NotifyResult<Vec<Notification>>) -> Self {
            self.responses
                .lock()
                .expect("lock")
                .push_back((None, result));
            self
        }

        fn gated(self, result: NotifyResult<Vec<Notification>>) -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            self.responses
                .lock()
                .expect("lock")
                .push_back((Some(rx), result));
            (self, tx)
        }
    }

    #[async_trait]
    impl NotificationSource for ScriptedSource {
        async fn fetch_all(&self) -> NotifyResult<Vec<Notification>> {
            let next = self.responses.lock().expect("lock").pop_front();
            let Some((gate, result)) = next else {
                return Ok(Vec::new());
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            result
        }
    }

    fn store_over(source: ScriptedSource) -> NotificationStore {
        NotificationStore::new(Arc::new(source), SettingsStore::in_memory())
    }

    #[tokio::test]
    async fn fetch_dedups_and_counts_unread() {
        let store = store_over(ScriptedSource::default().ready(Ok(vec![
            item(1, "A", "x", "2024-01-01"),
            item(2, "a", "X", "2024-01-01"),
        ])));

        let outcome = store.fetch_notifications().await.expect("fetch");
        assert_eq!(outcome, FetchOutcome::Committed);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.unread_count, 1);
        assert_eq!(snapshot.state, LoadState::Ready);
    }

    #[tokio::test]
    async fn unread_count_excludes_persisted_markers() {
        let settings = SettingsStore::in_memory();
        settings
            .add_read_markers([NotificationId::Number(2), NotificationId::Number(99)])
            .expect("markers");
        let source = ScriptedSource::default().ready(Ok(vec![
            item(1, "one", "", "2024-01-01"),
            item(2, "two", "", "2024-01-02"),
            item(3, "three", "", "2024-01-03"),
        ]));
        let store = NotificationStore::new(Arc::new(source), settings);

        store.fetch_notifications().await.expect("fetch");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.unread_count, 2);
        assert!(snapshot.is_read(&NotificationId::Number(2)));
        assert!(!snapshot.is_read(&NotificationId::Number(99)));
    }

    #[tokio::test]
    async fn failed_fetch_records_error_and_keeps_list() {
        let store = store_over(
            ScriptedSource::default()
                .ready(Ok(vec![item(1, "kept", "", "2024-01-01")]))
                .ready(Err(NotifyError::stream("connection refused"))),
        );
        store.fetch_notifications().await.expect("first fetch");
        store
            .fetch_notifications()
            .await
            .expect_err("second fetch fails");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.state, LoadState::Failed);
        assert_eq!(snapshot.notifications.len(), 1);
        assert!(
            snapshot
                .error
                .as_deref()
                .is_some_and(|msg| msg.contains("connection refused"))
        );
    }

    #[tokio::test]
    async fn mark_all_as_read_is_idempotent() {
        let list = vec![
            item(1, "one", "", "2024-01-01"),
            item(2, "two", "", "2024-01-02"),
        ];
        let store = store_over(ScriptedSource::default().ready(Ok(list.clone())));
        store.fetch_notifications().await.expect("fetch");

        store.mark_all_as_read().expect("first");
        store.mark_all_as_read().expect("second");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.unread_count, 0);
        assert_eq!(snapshot.notifications, list);
    }

    #[tokio::test]
    async fn mark_as_read_updates_count_without_refetch() {
        let store = store_over(ScriptedSource::default().ready(Ok(vec![
            item(1, "one", "", "2024-01-01"),
            item(2, "two", "", "2024-01-02"),
        ])));
        store.fetch_notifications().await.expect("fetch");
        let mut updates = store.subscribe();

        store
            .mark_as_read(NotificationId::Number(1))
            .expect("mark read");

        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(updates.borrow_and_update().unread_count, 1);
        assert_eq!(store.snapshot().state, LoadState::Ready);
    }

    #[tokio::test]
    async fn push_prepends_new_and_skips_duplicates() {
        let store = store_over(
            ScriptedSource::default().ready(Ok(vec![item(1, "Old", "body", "2024-01-01")])),
        );
        store.fetch_notifications().await.expect("fetch");

        assert!(
            store
                .apply_push(item(5, "New", "fresh", "2024-01-02"))
                .expect("push")
        );
        assert!(
            !store
                .apply_push(item(6, "old", "BODY", "2024-01-01T12:00:00"))
                .expect("push")
        );
        assert!(
            !store
                .apply_push(item(5, "New", "fresh", "2024-01-02"))
                .expect("push")
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 2);
        assert_eq!(snapshot.notifications[0].id, NotificationId::Number(5));
        assert_eq!(snapshot.unread_count, 2);
    }

    #[tokio::test]
    async fn stale_fetch_does_not_overwrite_newer_result() {
        let (source, release_first) = ScriptedSource::default()
            .gated(Ok(vec![item(1, "stale", "", "2024-01-01")]));
        let source = source.ready(Ok(vec![item(2, "fresh", "", "2024-01-02")]));
        let store = Arc::new(store_over(source));

        let slow = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.fetch_notifications().await })
        };
        tokio::task::yield_now().await;
        while store.snapshot().state != LoadState::Loading {
            tokio::task::yield_now().await;
        }

        let fast = store.fetch_notifications().await.expect("fast fetch");
        assert_eq!(fast, FetchOutcome::Committed);

        release_first.send(()).expect("slow fetch waiting");
        let slow = slow.await.expect("join").expect("slow fetch");
        assert_eq!(slow, FetchOutcome::Stale);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.notifications[0].title, "fresh");
    }

    #[tokio::test]
    async fn closed_store_refuses_fetches_and_pushes() {
        let store = store_over(
            ScriptedSource::default()
                .ready(Ok(vec![item(1, "one", "", "2024-01-01")]))
                .ready(Ok(vec![item(2, "two", "", "2024-01-02")])),
        );
        store.fetch_notifications().await.expect("fetch");
        store.close();

        assert!(matches!(
            store.fetch_notifications().await,
            Err(NotifyError::Closed)
        ));
        assert!(matches!(
            store.apply_push(item(3, "three", "", "2024-01-03")),
            Err(NotifyError::Closed)
        ));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.notifications[0].id, NotificationId::Number(1));
    }
}
