mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use helpers::{TestApp, file_form};
use object_gateway::services::object_backend::ObjectBackend;
use serde_json::{Value, json};

fn listed_keys(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("list response is an array")
        .iter()
        .filter_map(|entry| entry["key"].as_str().map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn upload_list_delete_round_trip() {
    let app = TestApp::new().await;

    let upload = app
        .server
        .post("/upload")
        .multipart(file_form("a.txt", b"hello"))
        .await;
    assert_eq!(upload.status_code(), StatusCode::OK);
    assert_eq!(
        upload.json::<Value>(),
        json!({ "message": "File uploaded successfully" })
    );

    let listed = app.server.get("/files").await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    let body = listed.json::<Value>();
    let entry = body
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["key"] == "a.txt")
        .expect("uploaded file is listed");
    assert_eq!(entry["size"], 5);
    assert!(entry["lastModified"].is_string());

    let deleted = app.server.delete("/files/a.txt").await;
    assert_eq!(deleted.status_code(), StatusCode::OK);
    assert_eq!(
        deleted.json::<Value>(),
        json!({ "message": "File deleted successfully" })
    );

    let after = app.server.get("/files").await.json::<Value>();
    assert!(!listed_keys(&after).contains(&"a.txt".to_string()));
}

#[tokio::test]
async fn successful_upload_leaves_no_staging_file() {
    let app = TestApp::new().await;

    app.server
        .post("/upload")
        .multipart(file_form("a.txt", b"hello"))
        .await
        .assert_status_ok();

    assert_eq!(app.staged_files(), 0);
    let stored = app.backend.get("a.txt").expect("object stored");
    assert_eq!(&stored.body[..], b"hello");
    assert_eq!(stored.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn backend_failure_on_upload_is_500_and_cleans_staging() {
    let app = TestApp::new().await;
    app.backend.set_failing(true);

    let response = app
        .server
        .post("/upload")
        .multipart(file_form("a.txt", b"hello"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to upload file" })
    );
    assert_eq!(app.backend.put_calls(), 1);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn upload_without_file_part_is_rejected_without_backend_call() {
    let app = TestApp::new().await;

    let form = MultipartForm::new().add_text("description", "no file here");
    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No file uploaded" }));
    assert_eq!(app.backend.total_calls(), 0);
}

#[tokio::test]
async fn upload_with_non_multipart_body_is_rejected_without_backend_call() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/upload")
        .json(&json!({ "file": "a.txt" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No file uploaded" }));
    assert_eq!(app.backend.total_calls(), 0);
}

#[tokio::test]
async fn whitespace_only_filename_is_rejected_without_backend_call() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/upload")
        .multipart(file_form("  ", b"hello"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>(), json!({ "error": "No file uploaded" }));
    assert_eq!(app.backend.total_calls(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn truncated_multipart_body_is_rejected_and_cleans_staging() {
    let app = TestApp::new().await;

    let body = concat!(
        "--X\r\n",
        "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "partial payload with no closing boundary",
    );
    let response = app
        .server
        .post("/upload")
        .bytes(Bytes::from_static(body.as_bytes()))
        .content_type("multipart/form-data; boundary=X")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Invalid multipart request" })
    );
    assert_eq!(app.backend.put_calls(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn file_part_under_another_field_name_is_ignored() {
    let app = TestApp::new().await;

    let part = Part::bytes(&b"hello"[..]).file_name("a.txt");
    let form = MultipartForm::new().add_part("attachment", part);
    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.total_calls(), 0);
}

#[tokio::test]
async fn same_filename_overwrites_previous_upload() {
    let app = TestApp::new().await;

    for body in [&b"first"[..], &b"second!"[..]] {
        app.server
            .post("/upload")
            .multipart(file_form("report.txt", body))
            .await
            .assert_status_ok();
    }

    let body = app.server.get("/files").await.json::<Value>();
    assert_eq!(listed_keys(&body), ["report.txt"]);
    assert_eq!(body[0]["size"], 7);
}

#[tokio::test]
async fn oversized_upload_is_rejected_when_limit_configured() {
    let app = TestApp::with_limit(Some(16)).await;

    let response = app
        .server
        .post("/upload")
        .multipart(file_form("big.txt", b"this payload is well over sixteen bytes"))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.backend.put_calls(), 0);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn list_of_empty_bucket_is_empty_array() {
    let app = TestApp::new().await;

    let response = app.server.get("/files").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn list_returns_every_object_beyond_one_page() {
    let app = TestApp::new().await;
    for i in 0..1_203 {
        app.backend
            .put_object(&format!("f{:04}", i), Bytes::from_static(b"x"), None)
            .await
            .unwrap();
    }

    let body = app.server.get("/files").await.json::<Value>();
    assert_eq!(body.as_array().unwrap().len(), 1_203);
    assert_eq!(app.backend.list_calls(), 2);
}

#[tokio::test]
async fn list_filters_by_prefix() {
    let app = TestApp::new().await;
    for key in ["docs/a.txt", "docs/b.txt", "img/c.png"] {
        app.backend
            .put_object(key, Bytes::from_static(b"x"), None)
            .await
            .unwrap();
    }

    let body = app
        .server
        .get("/files")
        .add_query_param("prefix", "docs/")
        .await
        .json::<Value>();
    assert_eq!(listed_keys(&body), ["docs/a.txt", "docs/b.txt"]);
}

#[tokio::test]
async fn list_failure_is_500_without_partial_data() {
    let app = TestApp::new().await;
    app.server
        .post("/upload")
        .multipart(file_form("a.txt", b"hello"))
        .await
        .assert_status_ok();
    app.backend.set_failing(true);

    let response = app.server.get("/files").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to retrieve file" })
    );
}

#[tokio::test]
async fn delete_without_key_is_rejected_without_backend_call() {
    let app = TestApp::new().await;

    for path in ["/files", "/files/", "/files/%20", "/files/%20%20"] {
        let response = app.server.delete(path).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "File key is required" })
        );
    }
    assert_eq!(app.backend.total_calls(), 0);
}

#[tokio::test]
async fn delete_of_missing_key_reports_success() {
    let app = TestApp::new().await;

    let response = app.server.delete("/files/never-uploaded.txt").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(app.backend.delete_calls(), 1);
}

#[tokio::test]
async fn delete_supports_nested_and_encoded_keys() {
    let app = TestApp::new().await;
    app.backend
        .put_object("photos/my cat.jpg", Bytes::from_static(b"meow"), None)
        .await
        .unwrap();

    app.server
        .delete("/files/photos/my%20cat.jpg")
        .await
        .assert_status_ok();
    assert!(app.backend.get("photos/my cat.jpg").is_none());
}

#[tokio::test]
async fn delete_failure_is_500() {
    let app = TestApp::new().await;
    app.backend.set_failing(true);

    let response = app.server.delete("/files/a.txt").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to delete file" })
    );
}
