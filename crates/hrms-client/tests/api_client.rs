use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use hrms_api_models::{NotificationId, PushFrame};
use hrms_client::{ApiClient, ClientConfig, ClientError};
use hrms_forms::{DepartmentDraft, FormMode, FormSubmitter};
use hrms_notify::{PushSource, SseParser, decode_frame};
use hrms_settings::SettingsStore;
use httpmock::prelude::*;
use serde_json::json;

fn jwt(expires_in: Duration) -> String {
    let claims = json!({
        "token_type": "access",
        "exp": (Utc::now() + expires_in).timestamp(),
        "user_id": 4,
    });
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

fn client_for(server: &MockServer, settings: &SettingsStore) -> ApiClient {
    let config = ClientConfig::new(&format!("{}/api", server.base_url()))
        .expect("valid base url")
        .with_request_id("test-request");
    ApiClient::new(config, settings.clone()).expect("client builds")
}

#[tokio::test]
async fn expired_access_token_is_refreshed_before_the_request() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    let expired = jwt(Duration::minutes(-5));
    let fresh = jwt(Duration::minutes(30));
    settings
        .store_tokens(&expired, Some("refresh-1"))
        .expect("seed tokens");

    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/api/app/token/refresh/")
            .json_body(json!({"refresh": "refresh-1"}));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access": fresh}));
    });
    let bearer = format!("Bearer {fresh}");
    let list = server.mock(move |when, then| {
        when.method(GET)
            .path("/api/app/departments/")
            .header("authorization", bearer.as_str())
            .header("x-request-id", "test-request");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([{"id": 1, "department_name": "Finance"}]));
    });

    let client = client_for(&server, &settings);
    let departments = client.departments().await.expect("departments listed");

    refresh.assert();
    list.assert();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].department_name, "Finance");
    assert_eq!(settings.access_token().expect("read"), Some(fresh));
    assert_eq!(
        settings.refresh_token().expect("read").as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    let fresh = jwt(Duration::minutes(30));
    settings
        .store_tokens(&jwt(Duration::minutes(-5)), Some("refresh-1"))
        .expect("seed tokens");

    let refresh = server.mock(|when, then| {
        when.method(POST).path("/api/app/token/refresh/");
        then.status(200)
            .delay(std::time::Duration::from_millis(200))
            .json_body(json!({"access": fresh}));
    });
    let bearer = format!("Bearer {fresh}");
    let departments = server.mock(|when, then| {
        when.method(GET)
            .path("/api/app/departments/")
            .header("authorization", bearer.as_str());
        then.status(200).json_body(json!([]));
    });
    let levels = server.mock(|when, then| {
        when.method(GET)
            .path("/api/app/levels/")
            .header("authorization", bearer.as_str());
        then.status(200).json_body(json!([]));
    });

    let client = client_for(&server, &settings);
    let (first, second) = tokio::join!(client.departments(), client.levels());
    first.expect("departments listed");
    second.expect("levels listed");

    refresh.assert_hits(1);
    departments.assert_hits(1);
    levels.assert_hits(1);
    assert_eq!(settings.access_token().expect("read"), Some(fresh));
}

#[tokio::test]
async fn unauthorised_response_triggers_one_refresh_and_retry() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    settings
        .store_tokens("opaque-old", Some("refresh-1"))
        .expect("seed tokens");

    let refused = server.mock(|when, then| {
        when.method(GET)
            .path("/api/app/levels/")
            .header("authorization", "Bearer opaque-old");
        then.status(401)
            .json_body(json!({"detail": "Given token not valid for any token type"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/api/app/token/refresh/");
        then.status(200)
            .json_body(json!({"access": "opaque-new", "refresh": "refresh-2"}));
    });
    let accepted = server.mock(|when, then| {
        when.method(GET)
            .path("/api/app/levels/")
            .header("authorization", "Bearer opaque-new");
        then.status(200).json_body(json!({
            "count": 1,
            "results": [{"id": 3, "level_name": "Senior", "description": "Senior IC"}]
        }));
    });

    let client = client_for(&server, &settings);
    let levels = client.levels().await.expect("levels listed");

    refused.assert_hits(1);
    refresh.assert_hits(1);
    accepted.assert_hits(1);
    assert_eq!(levels[0].level_name, "Senior");
    assert_eq!(
        settings.refresh_token().expect("read").as_deref(),
        Some("refresh-2")
    );
}

#[tokio::test]
async fn refused_refresh_clears_both_tokens() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    settings
        .store_tokens(&jwt(Duration::minutes(-1)), Some("revoked"))
        .expect("seed tokens");

    let refresh = server.mock(|when, then| {
        when.method(POST).path("/api/app/token/refresh/");
        then.status(401)
            .json_body(json!({"detail": "Token is invalid or expired"}));
    });
    let list = server.mock(|when, then| {
        when.method(GET).path("/api/app/departments/");
        then.status(200).json_body(json!([]));
    });

    let client = client_for(&server, &settings);
    let err = client.departments().await.expect_err("session expired");

    assert!(matches!(err, ClientError::SessionExpired));
    refresh.assert();
    list.assert_hits(0);
    assert_eq!(settings.access_token().expect("read"), None);
    assert_eq!(settings.refresh_token().expect("read"), None);
}

#[tokio::test]
async fn field_errors_surface_through_the_form_submitter() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    settings
        .store_tokens("opaque", Some("refresh"))
        .expect("seed tokens");

    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/app/departments/")
            .json_body(json!({"department_name": "Finance"}));
        then.status(400).json_body(json!({
            "department_name": ["department with this department name already exists."]
        }));
    });

    let client = client_for(&server, &settings);
    let submitter = FormSubmitter::new(Arc::new(client));
    let err = submitter
        .submit(&DepartmentDraft::new("Finance"), FormMode::Create)
        .await
        .expect_err("duplicate refused");

    create.assert();
    assert_eq!(
        err.to_string(),
        "department with this department name already exists."
    );
    assert!(err.is_validation());
}

#[tokio::test]
async fn server_failures_keep_status_and_text() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();

    server.mock(|when, then| {
        when.method(GET).path("/api/app/shift-policies/");
        then.status(500).body("Internal Server Error");
    });

    let client = client_for(&server, &settings);
    let err = client.shift_policies().await.expect_err("server error");

    assert!(matches!(err, ClientError::Server { status: 500, .. }));
    assert_eq!(err.to_string(), "Internal Server Error (status 500)");
    assert!(!err.is_validation());
}

#[tokio::test]
async fn login_persists_tokens_and_logout_forgets_them() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    settings
        .add_read_markers([NotificationId::Number(9)])
        .expect("seed marker");

    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/app/login/")
            .json_body(json!({"username": "priya", "password": "s3cret!"}));
        then.status(200).json_body(json!({
            "access": "access-1",
            "refresh": "refresh-1",
            "role": "admin"
        }));
    });

    let client = client_for(&server, &settings);
    let tokens = client.login(" priya ", "s3cret!").await.expect("signed in");

    login.assert();
    assert_eq!(tokens.role.as_deref(), Some("admin"));
    assert_eq!(
        settings.access_token().expect("read").as_deref(),
        Some("access-1")
    );

    client.logout().expect("signed out");
    assert_eq!(settings.access_token().expect("read"), None);
    assert!(settings.read_markers().expect("read").is_empty());
}

#[tokio::test]
async fn refused_credentials_report_the_backend_message() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();

    server.mock(|when, then| {
        when.method(POST).path("/api/app/login/");
        then.status(401).json_body(json!({
            "detail": "No active account found with the given credentials"
        }));
    });

    let client = client_for(&server, &settings);
    let err = client.login("priya", "wrong").await.expect_err("refused");

    assert_eq!(err.status(), Some(401));
    assert_eq!(
        err.backend_message().as_deref(),
        Some("No active account found with the given credentials")
    );
    assert_eq!(settings.access_token().expect("read"), None);
}

#[tokio::test]
async fn push_stream_resumes_after_the_last_event() {
    let server = MockServer::start_async().await;
    let settings = SettingsStore::in_memory();
    settings
        .store_tokens("opaque", Some("refresh"))
        .expect("seed tokens");

    let stream = server.mock(|when, then| {
        when.method(GET)
            .path("/api/notifications/sse/")
            .query_param("last_id", "7")
            .header("accept", "text/event-stream");
        then.status(200)
            .header("content-type", "text/event-stream")
            .body(concat!(
                "retry: 5000\n\n",
                "id: 8\n",
                "data: {\"id\": 8, \"title\": \"Leave approved\", \"message\": \"Enjoy\", ",
                "\"type\": \"notification\", \"created_at\": \"2024-05-10T10:00:00Z\"}\n\n",
            ));
    });

    let client = client_for(&server, &settings);
    let mut chunks = client.connect(Some(7)).await.expect("stream opened");
    let mut parser = SseParser::default();
    let mut frames = Vec::new();
    while let Some(chunk) = chunks.next().await {
        frames.extend(parser.push_bytes(&chunk.expect("chunk")));
    }
    frames.extend(parser.finish());

    stream.assert();
    let event = frames
        .iter()
        .find(|frame| !frame.data.is_empty())
        .expect("event frame");
    assert_eq!(event.numeric_id(), Some(8));
    let PushFrame::Event(event) = decode_frame(event).expect("decodes") else {
        panic!("expected an event frame");
    };
    assert_eq!(event.title, "Leave approved");
}
