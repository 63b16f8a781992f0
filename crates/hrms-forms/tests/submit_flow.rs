use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hrms_api_models::paths;
use hrms_forms::{
    DepartmentDraft, DesignationDraft, FileUpload, FormBody, FormError, FormMethod, FormMode, FormRequest,
    FormSubmitter, GatewayError, LevelDraft, ResourceGateway, REDIRECT_DELAY,
};
use serde_json::{Value, json};

/// Records every request and answers with a fixed result.
struct RecordingGateway {
    calls: AtomicUsize,
    requests: Mutex<Vec<FormRequest>>,
    listed: Mutex<Vec<String>>,
    reply: Result<Value, GatewayError>,
}

impl RecordingGateway {
    fn replying(reply: Result<Value, GatewayError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            listed: Mutex::new(Vec::new()),
            reply,
        })
    }
}

#[async_trait]
impl ResourceGateway for RecordingGateway {
    async fn send(&self, request: FormRequest) -> Result<Value, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("lock").push(request);
        self.reply.clone()
    }

    async fn list(&self, path: &str) -> Result<Value, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.listed.lock().expect("lock").push(path.to_string());
        self.reply.clone()
    }
}

#[tokio::test]
async fn short_department_name_never_reaches_the_gateway() {
    let gateway = RecordingGateway::replying(Ok(json!({})));
    let submitter = FormSubmitter::new(gateway.clone());

    let err = submitter
        .submit(&DepartmentDraft::new("H"), FormMode::Create)
        .await
        .expect_err("validation blocks submit");

    let FormError::Invalid(errors) = &err else {
        panic!("expected field errors, got {err:?}");
    };
    assert_eq!(
        errors.get("department_name"),
        Some("Department name must be at least 2 characters long")
    );
    assert!(err.to_string().contains("minimum 2 characters"));
    assert!(err.is_validation());
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_create_posts_trimmed_payload_and_redirects() {
    let gateway = RecordingGateway::replying(Ok(json!({"id": 4, "department_name": "Finance"})));
    let submitter = FormSubmitter::new(gateway.clone());

    let outcome = submitter
        .submit(&DepartmentDraft::new(" Finance "), FormMode::Create)
        .await
        .expect("submitted");

    assert_eq!(outcome.message, "Department created successfully!");
    assert_eq!(outcome.redirect.as_deref(), Some("/admin/branch-mgt/department"));
    assert_eq!(outcome.redirect_after, REDIRECT_DELAY);
    assert_eq!(outcome.redirect_after, Duration::from_millis(1500));

    let requests = gateway.requests.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, FormMethod::Post);
    assert_eq!(requests[0].path, paths::DEPARTMENTS);
    assert_eq!(
        requests[0].body,
        FormBody::Json(json!({"department_name": "Finance"}))
    );
}

#[tokio::test]
async fn update_uses_put_on_the_item_path() {
    let gateway = RecordingGateway::replying(Ok(json!({})));
    let submitter = FormSubmitter::new(gateway.clone());
    let draft = LevelDraft {
        level_name: "Senior".into(),
        description: "Senior individual contributor".into(),
    };

    let outcome = submitter
        .submit(&draft, FormMode::Update(12))
        .await
        .expect("updated");

    assert_eq!(outcome.message, "Level updated successfully!");
    let requests = gateway.requests.lock().expect("lock");
    assert_eq!(requests[0].method, FormMethod::Put);
    assert_eq!(requests[0].path, "app/levels/12/");
}

#[tokio::test]
async fn designation_ids_are_checked_against_reference_lists() {
    let gateway = RecordingGateway::replying(Ok(json!([{"id": 1}, {"id": 2}])));
    let submitter = FormSubmitter::new(gateway.clone());
    let draft = DesignationDraft {
        designation_name: "Analyst".into(),
        department: Some(1),
        level: Some(2),
    };

    submitter
        .submit(&draft, FormMode::Create)
        .await
        .expect("created");

    assert_eq!(
        *gateway.listed.lock().expect("lock"),
        vec![paths::DEPARTMENTS.to_string(), paths::LEVELS.to_string()]
    );
    assert_eq!(gateway.requests.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn unknown_reference_ids_are_field_errors() {
    let gateway = RecordingGateway::replying(Ok(json!({"results": [{"id": 1}, {"id": 2}]})));
    let submitter = FormSubmitter::new(gateway.clone());
    let draft = DesignationDraft {
        designation_name: "Analyst".into(),
        department: Some(1),
        level: Some(7),
    };

    let err = submitter
        .submit(&draft, FormMode::Create)
        .await
        .expect_err("unknown level");

    let FormError::Invalid(errors) = &err else {
        panic!("expected field errors, got {err:?}");
    };
    assert_eq!(errors.get("level"), Some("No level with id 7"));
    assert!(errors.get("department").is_none());
    assert!(gateway.requests.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn backend_message_is_surfaced_when_present() {
    let gateway = RecordingGateway::replying(Err(GatewayError {
        status: Some(400),
        message: Some("department with this department name already exists.".into()),
    }));
    let submitter = FormSubmitter::new(gateway);

    let err = submitter
        .submit(&DepartmentDraft::new("Finance"), FormMode::Create)
        .await
        .expect_err("rejected");

    assert_eq!(
        err.to_string(),
        "department with this department name already exists."
    );
    assert!(err.is_validation());
}

#[tokio::test]
async fn fallback_message_is_used_without_backend_text() {
    let gateway = RecordingGateway::replying(Err(GatewayError {
        status: None,
        message: None,
    }));
    let submitter = FormSubmitter::new(gateway);

    let err = submitter
        .submit(&DepartmentDraft::new("Finance"), FormMode::Create)
        .await
        .expect_err("rejected");

    assert_eq!(
        err.to_string(),
        "Failed to create department. Please try again."
    );
    assert!(!err.is_validation());
}

#[tokio::test]
async fn delete_targets_the_item_path() {
    let gateway = RecordingGateway::replying(Ok(Value::Null));
    let submitter = FormSubmitter::new(gateway.clone());

    submitter
        .delete::<DepartmentDraft>(7)
        .await
        .expect("deleted");

    let requests = gateway.requests.lock().expect("lock");
    assert_eq!(requests[0].method, FormMethod::Delete);
    assert_eq!(requests[0].path, "app/departments/7/");
    assert_eq!(requests[0].body, FormBody::Empty);
}

#[test]
fn file_upload_reads_name_and_mime_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("avatar.JPG");
    std::fs::write(&path, [0xFF, 0xD8, 0xFF]).expect("write");

    let upload = FileUpload::from_path(&path).expect("read upload");
    assert_eq!(upload.file_name, "avatar.JPG");
    assert_eq!(upload.mime.as_deref(), Some("image/jpeg"));
    assert_eq!(upload.bytes.len(), 3);
}
