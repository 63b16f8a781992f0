//! Storage keys.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

pub(crate) const ACCESS_TOKEN_KEY: &str = "access_token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub(crate) const READ_MARKERS_KEY: &str = "notifications.read_ids";
pub(crate) const PUSH_CURSOR_KEY: &str = "notifications.last_event_id";
pub(crate) const BADGE_KEY_PREFIX: &str = "badge.last_seen.";

/// Sidebar badges that track a persisted "last seen" count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Badge {
    /// Pending leave requests awaiting review.
    LeaveRequests,
    /// Tasks assigned to the signed-in employee.
    AssignedTasks,
    /// Learning corner publications.
    LearningCorner,
    /// Company policy documents.
    CompanyPolicy,
}

impl Badge {
    /// Every known badge.
    pub const ALL: [Self; 4] = [
        Self::LeaveRequests,
        Self::AssignedTasks,
        Self::LearningCorner,
        Self::CompanyPolicy,
    ];

    /// Stable identifier used in storage keys and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeaveRequests => "leave-requests",
            Self::AssignedTasks => "assigned-tasks",
            Self::LearningCorner => "learning-corner",
            Self::CompanyPolicy => "company-policy",
        }
    }

    pub(crate) fn storage_key(self) -> String {
        format!("{BADGE_KEY_PREFIX}{}", self.as_str())
    }
}

impl Display for Badge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Badge {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|badge| badge.as_str() == value.trim())
            .ok_or_else(|| format!("unknown badge '{value}'"))
    }
}
