//! Notification listing, live watch, read markers and badge counters.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use hrms_api_models::{Notification, NotificationId};
use hrms_notify::{NotificationSync, PushSource, SyncOptions};
use hrms_settings::Badge;
use tracing::info;

use crate::cli::{BadgesArgs, NotificationListArgs, OutputFormat, ReadArgs, WatchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{notification_line, render_badges, render_notifications};

pub(crate) async fn handle_notification_list(
    ctx: &AppContext,
    args: NotificationListArgs,
    output: OutputFormat,
) -> CliResult<()> {
    ctx.require_session()?;
    let store = ctx.notification_store();
    store.fetch_notifications().await?;
    let snapshot = store.snapshot();
    let visible: Vec<Notification> = snapshot
        .notifications
        .iter()
        .filter(|notification| !args.unread || !snapshot.is_read(&notification.id))
        .cloned()
        .collect();
    render_notifications(
        &snapshot,
        &visible,
        args.grouped,
        Local::now().date_naive(),
        output,
    )
}

pub(crate) async fn handle_watch(ctx: &AppContext, args: WatchArgs) -> CliResult<()> {
    ctx.require_session()?;
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    watch_until(ctx, &args, shutdown).await?;
    if args.metrics {
        print!("{}", ctx.metrics.render().map_err(CliError::failure)?);
    }
    Ok(())
}

/// Follow the notification feed until `shutdown` resolves.
///
/// Prints the current list once, then one line per notification that was
/// not shown before. Returns how many arrived while watching.
pub(crate) async fn watch_until(
    ctx: &AppContext,
    args: &WatchArgs,
    shutdown: impl Future<Output = ()>,
) -> CliResult<usize> {
    let store = Arc::new(ctx.notification_store());
    let push: Option<Arc<dyn PushSource>> = if args.no_push {
        None
    } else {
        Some(Arc::new(ctx.client.clone()))
    };
    let options = SyncOptions {
        poll_interval: Duration::from_secs(args.poll_interval),
        push_enabled: !args.no_push,
        ..SyncOptions::default()
    };
    let handle = NotificationSync::start(store, push, options).await;

    let mut updates = handle.store().subscribe();
    let initial = handle.store().snapshot();
    let mut seen: HashSet<NotificationId> = HashSet::new();
    for notification in initial.notifications.iter().rev() {
        seen.insert(notification.id.clone());
        println!(
            "{}",
            notification_line(notification, initial.is_read(&notification.id))
        );
    }
    let mut last_error = initial.error.clone();
    if let Some(error) = &last_error {
        eprintln!("warning: {error}");
    }
    println!("unread: {} (watching; Ctrl-C to stop)", initial.unread_count);

    let mut announced = 0;
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                for notification in snapshot.notifications.iter().rev() {
                    if seen.insert(notification.id.clone()) {
                        announced += 1;
                        println!(
                            "{}",
                            notification_line(notification, snapshot.is_read(&notification.id))
                        );
                    }
                }
                if snapshot.error != last_error {
                    if let Some(error) = &snapshot.error {
                        eprintln!("warning: {error}");
                    }
                    last_error = snapshot.error;
                }
            }
        }
    }

    handle.stop();
    let counters = ctx.metrics.snapshot();
    info!(
        announced,
        fetches_ok = counters.fetches_ok,
        fetches_failed = counters.fetches_failed,
        push_applied = counters.push_applied,
        push_reconnects = counters.push_reconnects,
        "stopped watching notifications"
    );
    Ok(announced)
}

pub(crate) fn handle_read(ctx: &AppContext, args: &ReadArgs) -> CliResult<()> {
    if args.id.trim().is_empty() {
        return Err(CliError::validation("notification id cannot be empty"));
    }
    let id = NotificationId::parse(&args.id);
    ctx.notification_store().mark_as_read(id.clone())?;
    println!("Marked notification {id} as read.");
    Ok(())
}

pub(crate) async fn handle_read_all(ctx: &AppContext) -> CliResult<()> {
    ctx.require_session()?;
    let store = ctx.notification_store();
    store.fetch_notifications().await?;
    store.mark_all_as_read()?;
    let marked = store.snapshot().notifications.len();
    println!("Marked {marked} notifications as read.");
    Ok(())
}

pub(crate) fn handle_badges(
    ctx: &AppContext,
    args: &BadgesArgs,
    output: OutputFormat,
) -> CliResult<()> {
    for (badge, count) in &args.mark {
        ctx.settings.set_badge_last_seen(*badge, *count)?;
    }

    let mut rows = Vec::with_capacity(Badge::ALL.len());
    for badge in Badge::ALL {
        let last_seen = ctx.settings.badge_last_seen(badge)?;
        let unseen = args
            .current
            .iter()
            .rev()
            .find(|(candidate, _)| *candidate == badge)
            .map(|(_, current)| ctx.settings.badge_unseen(badge, *current))
            .transpose()?;
        rows.push((badge, last_seen, unseen));
    }
    render_badges(&rows, output)
}
