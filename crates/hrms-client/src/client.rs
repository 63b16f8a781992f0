//! `ApiClient`: bearer authentication, token refresh and response handling.
//!
//! # Design
//! - Tokens are read from the settings store at send time, never cached.
//! - A JWT access token past its `exp` is refreshed before the request goes
//!   out; a 401 answer triggers one refresh and one retry.
//! - Refreshes are serialised behind an async mutex. A caller that waited
//!   reuses the token minted while it was queued.
//! - A refused refresh clears both tokens and surfaces
//!   [`ClientError::SessionExpired`]; a network failure leaves them alone.
//! - Request bodies are rebuilt per attempt through a closure because
//!   multipart forms cannot be cloned.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use chrono::Utc;
use hrms_api_models::{
    Department, Designation, EmployeeSummary, Level, LoginRequest, Notification, RefreshRequest,
    RefreshResponse, SalaryStructure, ShiftPolicy, TokenPair, paths,
};
use hrms_forms::{FileUpload, FormBody, FormMethod, FormRequest};
use hrms_settings::SettingsStore;
use hrms_telemetry::Metrics;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token;

const HEADER_REQUEST_ID: &str = "x-request-id";
const HEADER_LAST_EVENT_ID: &str = "Last-Event-ID";
const LAST_ID_PARAM: &str = "last_id";
const EVENT_STREAM: &str = "text/event-stream";

/// Authenticated client for the HRMS REST backend. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    stream_http: Client,
    config: ClientConfig,
    settings: SettingsStore,
    metrics: Option<Metrics>,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Build a client that reads and writes tokens through `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, settings: SettingsStore) -> ClientResult<Self> {
        Self::build(config, settings, None)
    }

    /// Same as [`ApiClient::new`], recording request counters in `metrics`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the HTTP client cannot be built.
    pub fn with_metrics(
        config: ClientConfig,
        settings: SettingsStore,
        metrics: Metrics,
    ) -> ClientResult<Self> {
        Self::build(config, settings, Some(metrics))
    }

    fn build(
        config: ClientConfig,
        settings: SettingsStore,
        metrics: Option<Metrics>,
    ) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(&config.request_id).map_err(|_| {
            ClientError::Config("request id contains invalid characters".to_string())
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers.clone())
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build HTTP client: {err}")))?;
        // The push stream stays open indefinitely; only the connect is bounded.
        let stream_http = Client::builder()
            .connect_timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build stream client: {err}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                stream_http,
                config,
                settings,
                metrics,
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    /// Connection settings.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Settings store holding the tokens.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    /// Exchange credentials for a token pair and persist both tokens.
    ///
    /// # Errors
    ///
    /// Returns the classified backend error when the credentials are refused.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenPair> {
        let route = self.inner.config.endpoints.login.as_str();
        let url = self.inner.config.url(route)?;
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self
            .dispatch(route, self.inner.http.post(url).json(&body))
            .await?;
        let response = check(route, response).await?;
        let tokens: TokenPair = decode(route, response).await?;
        self.inner
            .settings
            .store_tokens(&tokens.access, Some(&tokens.refresh))?;
        info!(
            role = tokens.role.as_deref().unwrap_or("unknown"),
            "signed in"
        );
        Ok(tokens)
    }

    /// Forget the session: tokens, read markers, badge counters and the push
    /// cursor.
    ///
    /// # Errors
    ///
    /// Returns an error when the settings file cannot be written.
    pub fn logout(&self) -> ClientResult<()> {
        self.inner.settings.clear_session()?;
        info!("signed out");
        Ok(())
    }

    /// GET `path` and return the decoded body.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified backend error.
    pub async fn get_json(&self, path: &str) -> ClientResult<Value> {
        let url = self.inner.config.url(path)?;
        let response = self
            .execute(&self.inner.http, path, |http| Ok(http.get(url.clone())))
            .await?;
        decode_loose(path, response).await
    }

    /// GET a collection, accepting a bare array or a paginated
    /// `{"results": [...]}` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the rows do not match `T`.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let value = self.get_json(path).await?;
        serde_json::from_value(rows(value)).map_err(|source| ClientError::Decode {
            route: path.to_string(),
            source,
        })
    }

    /// Unified notification list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn notifications(&self) -> ClientResult<Vec<Notification>> {
        self.list(&self.inner.config.endpoints.notifications).await
    }

    /// Department list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn departments(&self) -> ClientResult<Vec<Department>> {
        self.list(paths::DEPARTMENTS).await
    }

    /// Level list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn levels(&self) -> ClientResult<Vec<Level>> {
        self.list(paths::LEVELS).await
    }

    /// Designation list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn designations(&self) -> ClientResult<Vec<Designation>> {
        self.list(paths::DESIGNATIONS).await
    }

    /// Shift policy list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn shift_policies(&self) -> ClientResult<Vec<ShiftPolicy>> {
        self.list(paths::SHIFT_POLICIES).await
    }

    /// Salary structure list.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn salary_structures(&self) -> ClientResult<Vec<SalaryStructure>> {
        self.list(paths::SALARY_STRUCTURES).await
    }

    /// Employee register.
    ///
    /// # Errors
    ///
    /// Returns the transport, backend or decode error.
    pub async fn employees(&self) -> ClientResult<Vec<EmployeeSummary>> {
        self.list(paths::EMPLOYEES).await
    }

    /// DELETE one item.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified backend error.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let url = self.inner.config.url(path)?;
        self.execute(&self.inner.http, path, |http| Ok(http.delete(url.clone())))
            .await?;
        info!(path, "item deleted");
        Ok(())
    }

    /// Send a form submission. Empty bodies decode to `null`, non-JSON
    /// bodies to a string.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified backend error.
    pub async fn submit(&self, request: &FormRequest) -> ClientResult<Value> {
        let route = request.path.as_str();
        let url = self.inner.config.url(route)?;
        let method = http_method(request.method);
        let response = self
            .execute(&self.inner.http, route, |http| {
                let builder = http.request(method.clone(), url.clone());
                Ok(match &request.body {
                    FormBody::Empty => builder,
                    FormBody::Json(value) => builder.json(value),
                    FormBody::Multipart { fields, files } => {
                        builder.multipart(multipart(fields, files)?)
                    }
                })
            })
            .await?;
        decode_loose(route, response).await
    }

    /// Open the push stream, resuming after `last_id` when given.
    ///
    /// # Errors
    ///
    /// Returns the transport or classified backend error.
    pub async fn open_stream(&self, last_id: Option<i64>) -> ClientResult<Response> {
        let route = self.inner.config.endpoints.stream.as_str();
        let mut url = self.inner.config.url(route)?;
        if let Some(id) = last_id {
            url.query_pairs_mut()
                .append_pair(LAST_ID_PARAM, &id.to_string());
        }
        let response = self
            .execute(&self.inner.stream_http, route, |http| {
                let mut builder = http.get(url.clone()).header(ACCEPT, EVENT_STREAM);
                if let Some(id) = last_id {
                    builder = builder.header(HEADER_LAST_EVENT_ID, id.to_string());
                }
                Ok(builder)
            })
            .await?;
        debug!(?last_id, "push stream opened");
        Ok(response)
    }

    async fn execute<F>(&self, http: &Client, route: &str, build: F) -> ClientResult<Response>
    where
        F: Fn(&Client) -> ClientResult<RequestBuilder> + Send,
    {
        let access = self.ensure_fresh_access().await?;
        let response = self
            .dispatch(route, authorize(build(http)?, access.as_deref()))
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED
            || self.inner.settings.refresh_token()?.is_none()
        {
            return check(route, response).await;
        }

        debug!(route, "access token refused, refreshing and retrying");
        let access = self.refresh_after(access.as_deref()).await?;
        let response = self
            .dispatch(route, authorize(build(http)?, Some(&access)))
            .await?;
        check(route, response).await
    }

    async fn ensure_fresh_access(&self) -> ClientResult<Option<String>> {
        let settings = &self.inner.settings;
        let Some(access) = settings.access_token()? else {
            return Ok(None);
        };
        if !token::is_expired(&access, Utc::now()) || settings.refresh_token()?.is_none() {
            return Ok(Some(access));
        }
        debug!("access token expired, refreshing before the request");
        self.refresh_after(Some(&access)).await.map(Some)
    }

    /// Refresh unless another caller already replaced `stale` while this one
    /// waited for the lock. `None` always refreshes.
    async fn refresh_after(&self, stale: Option<&str>) -> ClientResult<String> {
        let _guard = self.inner.refresh_lock.lock().await;
        let settings = &self.inner.settings;
        if let Some(stale) = stale
            && let Some(current) = settings.access_token()?
            && current != stale
            && !token::is_expired(&current, Utc::now())
        {
            return Ok(current);
        }

        let Some(refresh) = settings.refresh_token()? else {
            settings.clear_tokens()?;
            return Err(ClientError::SessionExpired);
        };
        let route = self.inner.config.endpoints.refresh.as_str();
        let url = self.inner.config.url(route)?;
        let request = self.inner.http.post(url).json(&RefreshRequest { refresh });
        let response = match self.dispatch(route, request).await {
            Ok(response) => response,
            Err(err) => {
                self.record_refresh("error");
                return Err(err);
            }
        };
        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "token refresh refused, clearing stored tokens"
            );
            self.record_refresh("rejected");
            settings.clear_tokens()?;
            return Err(ClientError::SessionExpired);
        }

        let refreshed: RefreshResponse = decode(route, response).await?;
        settings.store_tokens(&refreshed.access, refreshed.refresh.as_deref())?;
        self.record_refresh("ok");
        info!(rotated = refreshed.refresh.is_some(), "access token refreshed");
        Ok(refreshed.access)
    }

    async fn dispatch(&self, route: &str, request: RequestBuilder) -> ClientResult<Response> {
        match request.send().await {
            Ok(response) => {
                self.record_http(route, response.status().as_u16());
                Ok(response)
            }
            Err(source) => {
                self.record_http(route, 0);
                warn!(route, error = %source, "request failed");
                Err(ClientError::Transport {
                    route: route.to_string(),
                    source,
                })
            }
        }
    }

    fn record_http(&self, route: &str, status: u16) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.inc_http_request(route, status);
        }
    }

    fn record_refresh(&self, outcome: &str) {
        if let Some(metrics) = &self.inner.metrics {
            metrics.inc_token_refresh(outcome);
        }
    }
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url().as_str())
            .field("timeout", &self.inner.config.timeout)
            .finish_non_exhaustive()
    }
}

fn authorize(builder: RequestBuilder, access: Option<&str>) -> RequestBuilder {
    match access {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

async fn check(route: &str, response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport {
            route: route.to_string(),
            source,
        })?;
    let err = ClientError::from_response(status, &body);
    warn!(route, status = status.as_u16(), error = %err, "backend returned an error");
    Err(err)
}

async fn body_bytes(route: &str, response: Response) -> ClientResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|source| ClientError::Transport {
            route: route.to_string(),
            source,
        })
}

async fn decode<T: DeserializeOwned>(route: &str, response: Response) -> ClientResult<T> {
    let body = body_bytes(route, response).await?;
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
        route: route.to_string(),
        source,
    })
}

async fn decode_loose(route: &str, response: Response) -> ClientResult<Value> {
    let body = body_bytes(route, response).await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).trim().to_string())))
}

fn rows(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("results").is_some_and(Value::is_array) => {
            map.remove("results").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn http_method(method: FormMethod) -> Method {
    match method {
        FormMethod::Post => Method::POST,
        FormMethod::Put => Method::PUT,
        FormMethod::Patch => Method::PATCH,
        FormMethod::Delete => Method::DELETE,
    }
}

fn multipart(fields: &[(String, String)], files: &[(String, FileUpload)]) -> ClientResult<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }
    for (name, upload) in files {
        let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        if let Some(mime) = &upload.mime {
            part = part.mime_str(mime).map_err(|err| {
                ClientError::Config(format!("invalid MIME type '{mime}': {err}"))
            })?;
        }
        form = form.part(name.clone(), part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paginated_envelopes_unwrap_to_rows() {
        assert_eq!(
            rows(json!({"count": 1, "results": [{"id": 1}]})),
            json!([{"id": 1}])
        );
        assert_eq!(rows(json!([{"id": 2}])), json!([{"id": 2}]));
        assert_eq!(rows(json!({"detail": "x"})), json!({"detail": "x"}));
    }

    #[test]
    fn form_methods_map_to_http_verbs() {
        assert_eq!(http_method(FormMethod::Patch), Method::PATCH);
        assert_eq!(http_method(FormMethod::Delete), Method::DELETE);
    }

    #[test]
    fn bad_mime_types_are_reported() {
        let files = vec![(
            "photo".to_string(),
            FileUpload {
                file_name: "a.png".into(),
                mime: Some("not a mime".into()),
                bytes: vec![1],
            },
        )];
        let err = multipart(&[], &files).expect_err("invalid mime");
        assert!(matches!(err, ClientError::Config(_)));
    }
}
