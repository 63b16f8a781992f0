//! Duplicate policy for notification lists.
//!
//! Two notifications are duplicates when their ids match, or when their
//! normalised title and description match and both dates fall on the same
//! calendar day. The content rule is lossy on purpose: the backend merges
//! several feeds and the same announcement can arrive under two ids.
//! Undated entries never match on content.

use std::collections::HashSet;

use chrono::NaiveDate;
use hrms_api_models::{Notification, NotificationId};

/// Trim and lower-case text for comparison.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Whether `left` and `right` describe the same notification.
#[must_use]
pub fn is_duplicate(left: &Notification, right: &Notification) -> bool {
    if left.id == right.id {
        return true;
    }
    match (left.day(), right.day()) {
        (Some(left_day), Some(right_day)) if left_day == right_day => {
            normalize(&left.title) == normalize(&right.title)
                && normalize(&left.description) == normalize(&right.description)
        }
        _ => false,
    }
}

/// Drop duplicates, keeping the first occurrence and the original order.
#[must_use]
pub fn dedup(notifications: Vec<Notification>) -> Vec<Notification> {
    let mut ids: HashSet<NotificationId> = HashSet::with_capacity(notifications.len());
    let mut contents: HashSet<ContentKey> = HashSet::with_capacity(notifications.len());
    let mut kept = Vec::with_capacity(notifications.len());

    for notification in notifications {
        if ids.contains(&notification.id) {
            continue;
        }
        let key = ContentKey::of(&notification);
        if key.as_ref().is_some_and(|key| contents.contains(key)) {
            continue;
        }
        ids.insert(notification.id.clone());
        if let Some(key) = key {
            contents.insert(key);
        }
        kept.push(notification);
    }
    kept
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ContentKey {
    title: String,
    description: String,
    day: NaiveDate,
}

impl ContentKey {
    fn of(notification: &Notification) -> Option<Self> {
        notification.day().map(|day| Self {
            title: normalize(&notification.title),
            description: normalize(&notification.description),
            day,
        })
    }
}
