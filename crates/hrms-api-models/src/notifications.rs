//! Notification DTOs for the unified list endpoint and the push stream.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Notification identifier. The backend emits integers, but some sources
/// (calendar events, learning corner) have been seen with string ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    /// Numeric identifier.
    Number(i64),
    /// Opaque string identifier.
    Text(String),
}

impl NotificationId {
    /// Numeric value, when the id is numeric.
    #[must_use]
    pub const fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// Parse a user-supplied id; digits become numeric ids.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Number)
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for NotificationId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Category tag attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    /// Direct notification (tasks, leave, approvals).
    #[default]
    Notification,
    /// Company-wide admin announcement.
    Admin,
    /// Calendar event.
    Calendar,
    /// Learning corner publication.
    LearningCorner,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl NotificationKind {
    /// Wire representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Notification => "notification",
            Self::Admin => "admin",
            Self::Calendar => "calendar",
            Self::LearningCorner => "learning_corner",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "notification" | "" => Self::Notification,
            "admin" => Self::Admin,
            "calendar" => Self::Calendar,
            "learning_corner" => Self::LearningCorner,
            _ => Self::Other(value),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(value: NotificationKind) -> Self {
        value.as_str().to_string()
    }
}

/// Displayable notification as served by the unified list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Backend identifier.
    pub id: NotificationId,
    /// Short headline.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub description: String,
    /// Raw timestamp as emitted by the backend.
    #[serde(default)]
    pub date: String,
    /// Category tag.
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
}

impl Notification {
    /// Calendar day of [`Notification::date`], when it parses.
    #[must_use]
    pub fn day(&self) -> Option<NaiveDate> {
        calendar_day(&self.date)
    }

    /// Local wall-clock timestamp of [`Notification::date`], when it parses.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date)
    }
}

/// Event delivered over the push stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Backend identifier; doubles as the resume cursor.
    pub id: NotificationId,
    /// Short headline.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Category tag.
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Object the notification refers to (task, leave request).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_object_id: Option<i64>,
}

impl From<PushEvent> for Notification {
    fn from(event: PushEvent) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.message,
            date: event.created_at,
            kind: event.kind,
        }
    }
}

/// One decoded push frame: either an event or a stream-level error report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PushFrame {
    /// Server-side stream error (for example an unauthenticated stream).
    Error {
        /// Error text reported by the server.
        error: String,
    },
    /// Notification event.
    Event(PushEvent),
}

/// Parse a backend timestamp into its wall-clock value.
///
/// Accepts RFC 3339 (the offset is kept, not converted), naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` / `YYYY-MM-DD HH:MM:SS[.f]`, and bare
/// `YYYY-MM-DD` dates (midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Calendar day of a backend timestamp, in the timestamp's own offset.
#[must_use]
pub fn calendar_day(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|value| value.date())
}
