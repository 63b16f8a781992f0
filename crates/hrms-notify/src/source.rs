//! Transport seams for notification data.
//!
//! The store and sync loop only see these traits; the HTTP client implements
//! them and tests plug in scripted fakes.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use hrms_api_models::Notification;

use crate::error::NotifyResult;

/// Raw byte chunks of an open push stream.
pub type PushStream = BoxStream<'static, NotifyResult<Vec<u8>>>;

/// Source of the unified notification list.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch the full notification list.
    async fn fetch_all(&self) -> NotifyResult<Vec<Notification>>;
}

/// Source of server-push notification events.
#[async_trait]
pub trait PushSource: Send + Sync {
    /// Open one stream connection, resuming after `last_id` when given.
    async fn connect(&self, last_id: Option<i64>) -> NotifyResult<PushStream>;
}
