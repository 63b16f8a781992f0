//! Date grouping for the full notification listing.

use chrono::{Days, NaiveDate};
use hrms_api_models::Notification;
use serde::Serialize;

const UNDATED_LABEL: &str = "Undated";

/// Notifications that fall on one calendar day, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    /// `Today`, `Yesterday`, `Mar 5, 2024`, or `Undated`.
    pub label: String,
    /// Calendar day of the group; `None` for unparseable dates.
    pub day: Option<NaiveDate>,
    /// Members, newest first.
    pub notifications: Vec<Notification>,
}

/// Group notifications by calendar day relative to `today`.
///
/// Groups are ordered newest day first; entries whose date does not parse
/// are collected in a trailing `Undated` group.
#[must_use]
pub fn group_by_day(notifications: &[Notification], today: NaiveDate) -> Vec<DayGroup> {
    let mut sorted: Vec<&Notification> = notifications.iter().collect();
    // `None` sorts before `Some`, so reversing puts undated entries last.
    sorted.sort_by(|left, right| right.timestamp().cmp(&left.timestamp()));

    let yesterday = today.checked_sub_days(Days::new(1));
    let mut groups: Vec<DayGroup> = Vec::new();
    for notification in sorted {
        let day = notification.day();
        match groups.last_mut() {
            Some(group) if group.day == day => group.notifications.push(notification.clone()),
            _ => groups.push(DayGroup {
                label: label_for(day, today, yesterday),
                day,
                notifications: vec![notification.clone()],
            }),
        }
    }
    groups
}

fn label_for(day: Option<NaiveDate>, today: NaiveDate, yesterday: Option<NaiveDate>) -> String {
    match day {
        None => UNDATED_LABEL.to_string(),
        Some(day) if day == today => "Today".to_string(),
        Some(day) if Some(day) == yesterday => "Yesterday".to_string(),
        Some(day) => day.format("%b %-d, %Y").to_string(),
    }
}
