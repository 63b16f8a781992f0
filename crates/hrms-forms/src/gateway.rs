//! Request shape handed to the transport, and the transport seam itself.

use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// HTTP verb used for a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FormMethod {
    /// Create.
    Post,
    /// Full update.
    Put,
    /// Partial update.
    Patch,
    /// Removal.
    Delete,
}

/// File attached to a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, when known.
    pub mime: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Read a file from disk, guessing the MIME type from its extension.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the file cannot be read.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
                "png" => Some("image/png"),
                "jpg" | "jpeg" => Some("image/jpeg"),
                "gif" => Some("image/gif"),
                "webp" => Some("image/webp"),
                "pdf" => Some("application/pdf"),
                _ => None,
            })
            .map(str::to_string);
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

/// Encoded form body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormBody {
    /// No body (deletes).
    Empty,
    /// JSON document.
    Json(Value),
    /// Text parts plus file parts.
    Multipart {
        /// Text fields in submission order.
        fields: Vec<(String, String)>,
        /// File parts keyed by field name.
        files: Vec<(String, FileUpload)>,
    },
}

/// Fully built submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    /// Verb.
    pub method: FormMethod,
    /// Path relative to the API base URL.
    pub path: String,
    /// Body.
    pub body: FormBody,
}

/// Failure reported by a [`ResourceGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("request failed"))]
pub struct GatewayError {
    /// HTTP status when a response was received.
    pub status: Option<u16>,
    /// Flattened backend message; `None` when the body carried no text.
    pub message: Option<String>,
}

/// Transport used to submit forms and load reference lists.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Send one submission and return the decoded response body.
    async fn send(&self, request: FormRequest) -> Result<Value, GatewayError>;

    /// GET a collection as raw JSON.
    async fn list(&self, path: &str) -> Result<Value, GatewayError>;
}
