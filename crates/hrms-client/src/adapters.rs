//! `ApiClient` behind the notification and form transport seams.

use async_trait::async_trait;
use futures_util::StreamExt;
use hrms_api_models::Notification;
use hrms_forms::{FormRequest, GatewayError, ResourceGateway};
use hrms_notify::{NotificationSource, NotifyError, NotifyResult, PushSource, PushStream};
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ClientError;

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

#[async_trait]
impl NotificationSource for ApiClient {
    async fn fetch_all(&self) -> NotifyResult<Vec<Notification>> {
        self.notifications().await.map_err(NotifyError::source)
    }
}

#[async_trait]
impl PushSource for ApiClient {
    async fn connect(&self, last_id: Option<i64>) -> NotifyResult<PushStream> {
        let response = self
            .open_stream(last_id)
            .await
            .map_err(|err| NotifyError::stream(err.to_string()))?;
        let chunks = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|err| NotifyError::stream(err.to_string()))
        });
        Ok(chunks.boxed())
    }
}

#[async_trait]
impl ResourceGateway for ApiClient {
    async fn send(&self, request: FormRequest) -> Result<Value, GatewayError> {
        self.submit(&request).await.map_err(GatewayError::from)
    }

    async fn list(&self, path: &str) -> Result<Value, GatewayError> {
        self.get_json(path).await.map_err(GatewayError::from)
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            // Forms fall back to their own failure text.
            ClientError::Transport { .. } => Self {
                status: None,
                message: None,
            },
            ClientError::SessionExpired => Self {
                status: Some(401),
                message: Some(SESSION_EXPIRED.to_string()),
            },
            ClientError::Rejected { .. } | ClientError::Server { .. } | ClientError::Http { .. } => {
                Self {
                    status: err.status(),
                    message: err.backend_message(),
                }
            }
            other => Self {
                status: None,
                message: Some(other.to_string()),
            },
        }
    }
}
