//! Authentication DTOs.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account username or email.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Token pair returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived token used to mint new access tokens.
    pub refresh: String,
    /// Role reported by the backend (`master`, `admin`, `employee`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of a token refresh call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Refresh token issued at login.
    pub refresh: String,
}

/// Response of a token refresh call. Rotating backends also return a new
/// refresh token.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    /// Freshly minted access token.
    pub access: String,
    /// Rotated refresh token, when the backend rotates.
    #[serde(default)]
    pub refresh: Option<String>,
}
