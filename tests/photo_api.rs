use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use tempfile::TempDir;
use tower::ServiceExt;

use photo_capture::{AppConfig, AppState, PhotoStore, build_app};

/// 1x1 透明 PNG
const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestApp {
    _dir: TempDir,
    store_dir: std::path::PathBuf,
    app: Router,
}

async fn new_test_app_with(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    let store_dir = dir.path().join("uploads");
    let static_dir = dir.path().join("public");
    std::fs::create_dir_all(&static_dir).expect("create static dir");
    std::fs::write(static_dir.join("index.html"), "<h1>capture</h1>").expect("write index");

    let mut config = AppConfig::default();
    config.storage.upload_dir = store_dir.to_string_lossy().into_owned();
    config.storage.static_dir = static_dir.to_string_lossy().into_owned();
    configure(&mut config);

    let store = PhotoStore::open(config.upload_path()).await.expect("open store");
    let app = build_app(AppState::new(store), &config);
    TestApp {
        _dir: dir,
        store_dir,
        app,
    }
}

async fn new_test_app() -> TestApp {
    new_test_app_with(|_| {}).await
}

fn urlencoded_upload(image: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("image={}", urlencoding::encode(image))))
        .expect("build request")
}

fn multipart_upload(image: &str) -> Request<Body> {
    let boundary = "----photo-capture-test";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"\r\n\r\n\
         {image}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("call app");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec();
    (status, headers, body)
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send(app, req).await;
    let json = serde_json::from_slice(&body).expect("parse json");
    (status, json)
}

fn stored_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .expect("read store dir")
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn upload_list_delete_round_trip() {
    let t = new_test_app().await;

    let (status, json) = send_json(
        &t.app,
        urlencoded_upload(&format!("data:image/png;base64,{TINY_PNG_B64}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["success"], true);
    let filename = json["filename"].as_str().expect("filename").to_string();
    assert!(filename.starts_with("photo_") && filename.ends_with(".png"));
    assert_eq!(stored_files(&t.store_dir), vec![filename.clone()]);

    let (status, list) = send_json(&t.app, get("/api/photos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["filename"], filename.as_str());
    assert!(list["items"][0]["capturedAt"].is_string());

    let (status, json) = send_json(&t.app, delete(&format!("/delete/{filename}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = send_json(&t.app, delete(&format!("/delete/{filename}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());

    let (_, list) = send_json(&t.app, get("/api/photos")).await;
    assert_eq!(list["total"], 0);
    assert!(stored_files(&t.store_dir).is_empty());
}

#[tokio::test]
async fn multipart_upload_from_browser_form_data_is_accepted() {
    let t = new_test_app().await;

    let (status, json) = send_json(
        &t.app,
        multipart_upload(&format!("data:image/png;base64,{TINY_PNG_B64}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let filename = json["filename"].as_str().expect("filename");

    let (status, headers, body) = send(&t.app, get(&format!("/uploads/{filename}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert!(body.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn upload_without_image_field_is_rejected_and_writes_nothing() {
    let t = new_test_app().await;

    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("other=1"))
        .expect("build request");
    let (status, json) = send_json(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_FAILED");

    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .body(Body::empty())
        .expect("build request");
    let (status, _) = send_json(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(stored_files(&t.store_dir).is_empty());
}

#[tokio::test]
async fn upload_with_invalid_payload_is_rejected() {
    let t = new_test_app().await;

    for bad in ["data:image/png;base64,@@@@", "aGVsbG8gd29ybGQ="] {
        let (status, json) = send_json(&t.app, urlencoded_upload(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}: {json}");
    }
    assert!(stored_files(&t.store_dir).is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let t = new_test_app_with(|c| c.storage.max_upload_bytes = 64).await;

    let (status, json) = send_json(&t.app, urlencoded_upload(TINY_PNG_B64)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
    assert!(stored_files(&t.store_dir).is_empty());
}

#[tokio::test]
async fn traversal_filenames_never_leak_outside_the_store() {
    let t = new_test_app().await;
    std::fs::write(t.store_dir.join("../secret.png"), b"\x89PNG\r\n\x1a\nsecret")
        .expect("write outside store");

    for uri in [
        "/uploads/..%2F..%2Fetc%2Fpasswd",
        "/uploads/..%2Fsecret.png",
        "/uploads/..",
        "/uploads/../secret.png",
    ] {
        let (status, _, body) = send(&t.app, get(uri)).await;
        assert!(
            status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND,
            "{uri} -> {status}"
        );
        assert!(!body.ends_with(b"secret"), "{uri} leaked content");
    }

    let (status, _) = send_json(&t.app, delete("/delete/..%2Fsecret.png")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.store_dir.join("../secret.png").exists());
}

#[tokio::test]
async fn retrieve_missing_photo_is_not_found() {
    let t = new_test_app().await;
    let (status, json) = send_json(&t.app, get("/uploads/photo_20000101_000000.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn listing_page_shows_newest_first_and_hides_other_files() {
    let t = new_test_app().await;
    let png = b"\x89PNG\r\n\x1a\n";
    std::fs::write(t.store_dir.join("photo_20240101_080000.png"), png).expect("write");
    std::fs::write(t.store_dir.join("photo_20240102_080000.png"), png).expect("write");
    std::fs::write(t.store_dir.join("readme.txt"), b"x").expect("write");

    let (status, headers, body) = send(&t.app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap_or("")
            .starts_with("text/html")
    );
    let html = String::from_utf8(body).expect("utf8 html");
    let newer = html.find("photo_20240102_080000.png").expect("newer listed");
    let older = html.find("photo_20240101_080000.png").expect("older listed");
    assert!(newer < older);
    assert!(html.contains("2024/01/02 08:00:00"));
    assert!(!html.contains("readme.txt"));

    let (_, list) = send_json(&t.app, get("/api/photos")).await;
    let names: Vec<_> = list["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|i| i["filename"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["photo_20240102_080000.png", "photo_20240101_080000.png"]
    );
}

#[tokio::test]
async fn listing_fails_with_500_when_store_directory_is_gone() {
    let t = new_test_app().await;
    std::fs::remove_dir(&t.store_dir).expect("remove store dir");

    let (status, json) = send_json(&t.app, get("/")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn static_files_and_health_are_served() {
    let t = new_test_app().await;

    let (status, _, body) = send(&t.app, get("/index.html")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>capture</h1>");

    let (status, json) = send_json(&t.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "photo-capture");
}

#[tokio::test]
async fn upload_preflight_is_answered_by_cors_layer() {
    let t = new_test_app().await;

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/upload")
        .header(header::ORIGIN, "http://localhost:8000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("build request");
    let (status, headers, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
