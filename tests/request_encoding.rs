//! Body and query serialization per encoding against local stub servers.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::RawQuery;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;

use webfetch::{BodyEncoding, FetchError, FileUpload, HttpClient, ParamValue, Params};

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://{addr}")
}

/// Echo content type and raw body, pipe-separated.
async fn echo(headers: HeaderMap, body: Bytes) -> String {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    format!("{}|{}", content_type, String::from_utf8_lossy(&body))
}

fn jar(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("cookies.json")
}

#[tokio::test]
async fn test_get_params_become_query_string() {
    let app = Router::new().route(
        "/search",
        get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
    );
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("q".to_string(), ParamValue::text("hello world"))]);
    let resp = client
        .get(&format!("{base}/search"), &params)
        .await
        .unwrap();

    assert_eq!(resp.body_text(), "q=hello%20world");
}

#[tokio::test]
async fn test_get_params_join_existing_query() {
    let app = Router::new().route(
        "/search",
        get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
    );
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("b".to_string(), ParamValue::text("2"))]);
    let resp = client
        .get(&format!("{base}/search?a=1"), &params)
        .await
        .unwrap();

    assert_eq!(resp.body_text(), "a=1&b=2");
}

#[tokio::test]
async fn test_post_form_encodes_urlencoded() {
    let app = Router::new().route("/submit", post(echo));
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("name".to_string(), ParamValue::text("alice smith"))]);
    let resp = client
        .post(&format!("{base}/submit"), &params, BodyEncoding::Form)
        .await
        .unwrap();

    let text = resp.body_text().to_string();
    assert!(text.starts_with("application/x-www-form-urlencoded|"));
    assert!(text.contains("name=alice+smith"));
}

#[tokio::test]
async fn test_post_json_sends_json_object() {
    let app = Router::new().route("/submit", post(echo));
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("foo".to_string(), ParamValue::text("bar"))]);
    let resp = client
        .post(&format!("{base}/submit"), &params, BodyEncoding::Json)
        .await
        .unwrap();

    let text = resp.body_text().to_string();
    let (content_type, body) = text.split_once('|').unwrap();
    assert!(content_type.starts_with("application/json"));
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value, serde_json::json!({"foo": "bar"}));
}

#[tokio::test]
async fn test_put_json_rpc_sets_rpc_content_type() {
    let app = Router::new().route("/submit", put(echo));
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("method".to_string(), ParamValue::text("ping"))]);
    let resp = client
        .put(&format!("{base}/submit"), &params, BodyEncoding::JsonRpc)
        .await
        .unwrap();

    let text = resp.body_text().to_string();
    let (content_type, body) = text.split_once('|').unwrap();
    assert_eq!(content_type, "application/json-rpc");
    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value, serde_json::json!({"method": "ping"}));
}

#[tokio::test]
async fn test_file_param_forces_multipart() {
    let app = Router::new().route("/upload", post(echo));
    let base = serve(app).await;

    let mut attachment = tempfile::NamedTempFile::new().unwrap();
    attachment.write_all(b"file-content").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([
        ("note".to_string(), ParamValue::text("hi")),
        (
            "doc".to_string(),
            FileUpload::new(attachment.path(), "text/plain", "notes.txt").into(),
        ),
    ]);
    // Form requested, multipart forced by the attachment.
    let resp = client
        .post(&format!("{base}/upload"), &params, BodyEncoding::Form)
        .await
        .unwrap();

    let text = resp.body_text().to_string();
    assert!(text.starts_with("multipart/form-data"));
    assert!(text.contains("notes.txt"));
    assert!(text.contains("file-content"));
    assert!(text.contains("hi"));
}

#[tokio::test]
async fn test_xml_encoding_fails_before_any_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/submit",
        post({
            let hits = hits.clone();
            move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "never"
                }
            }
        }),
    );
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("a".to_string(), ParamValue::text("1"))]);
    let err = client
        .post(&format!("{base}/submit"), &params, BodyEncoding::Xml)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::UnimplementedFormat("xml")));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_params_go_to_query() {
    let app = Router::new().route(
        "/item",
        axum::routing::delete(|RawQuery(query): RawQuery| async move {
            query.unwrap_or_default()
        }),
    );
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([("id".to_string(), ParamValue::text("42"))]);
    let resp = client
        .delete(&format!("{base}/item"), &params)
        .await
        .unwrap();

    assert_eq!(resp.body_text(), "id=42");
}

#[tokio::test]
async fn test_missing_attachment_is_an_attachment_error() {
    let app = Router::new().route("/upload", post(echo));
    let base = serve(app).await;

    let dir = tempfile::tempdir().unwrap();
    let client = HttpClient::new(jar(&dir));
    let params = Params::from([(
        "doc".to_string(),
        FileUpload::new(dir.path().join("missing.txt"), "text/plain", "missing.txt").into(),
    )]);
    let err = client
        .post(&format!("{base}/upload"), &params, BodyEncoding::Multipart)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Attachment { .. }));
}
