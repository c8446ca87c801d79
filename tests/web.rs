#![cfg(feature = "web")]

use std::io::{Cursor, Read};
use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tower::ServiceExt;

use stickerpro::api::build_pipeline;
use stickerpro::config::AppConfig;
use stickerpro::web::{AppState, router};

const BOUNDARY: &str = "stickerproTestBoundary";

fn test_config(base: &Path) -> AppConfig {
    AppConfig {
        max_files: 2,
        max_file_bytes: 4096,
        canvas_size: 32,
        outline_width: 2,
        upload_dir: base.join("uploads"),
        processed_dir: base.join("web_processed"),
        log_dir: None,
        ..AppConfig::default()
    }
}

fn app_with(config: AppConfig) -> Router {
    let pipeline = build_pipeline(config.remover, None, config.processing_params()).unwrap();
    router(AppState::new(config, pipeline).unwrap())
}

fn test_app(base: &Path) -> Router {
    app_with(test_config(base))
}

fn photo() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(24, 16, Rgba([255, 255, 255, 255]));
    for y in 4..12 {
        for x in 6..18 {
            img.put_pixel(x, y, Rgba([30, 90, 160, 255]));
        }
    }
    img
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    photo().write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn jpeg_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(photo())
        .to_rgb8()
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn download_link(page: &str) -> String {
    let start = page.find("/download/").expect("result page links the archive");
    let end = start + page[start..].find('"').unwrap();
    page[start..end].to_string()
}

fn entries_under(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn index_and_health_respond() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let index = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    let page = String::from_utf8(body_bytes(index).await).unwrap();
    assert!(page.contains("<form"));

    let health = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(health).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "stickerpro");
}

#[tokio::test]
async fn batch_is_archived_and_downloadable_once() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let png = png_bytes();

    let response = app
        .clone()
        .oneshot(upload_request(&[("cat.png", &png), ("dog photo.png", &png)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    let link = download_link(&page);

    let download = app.clone().oneshot(get(&link)).await.unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers()[header::CONTENT_TYPE],
        "application/zip"
    );
    let zip_bytes = body_bytes(download).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    assert_eq!(names, vec!["cat_processed.png", "dog_photo_processed.png"]);

    let mut entry = Vec::new();
    archive
        .by_name("cat_processed.png")
        .unwrap()
        .read_to_end(&mut entry)
        .unwrap();
    let sticker = image::load_from_memory(&entry).unwrap();
    assert_eq!((sticker.width(), sticker.height()), (32, 32));

    let again = app.oneshot(get(&link)).await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    // The session is purged once the archive body has been sent
    let processed = dir.path().join("web_processed");
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while entries_under(&processed) > 0 && std::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(entries_under(&processed), 0);
}

#[tokio::test]
async fn failed_file_is_listed_while_the_rest_are_archived() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(AppConfig {
        max_files: 3,
        ..test_config(dir.path())
    });
    let png = png_bytes();
    let jpeg = jpeg_bytes();

    let response = app
        .clone()
        .oneshot(upload_request(&[
            ("good.png", &png),
            ("bad.png", b"these bytes are not a png"),
            ("good.jpg", &jpeg),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("2 image(s) processed"));
    assert!(page.contains("Some files failed"));
    assert!(page.contains("bad.png"));

    let download = app.oneshot(get(&download_link(&page))).await.unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    let archive = zip::ZipArchive::new(Cursor::new(body_bytes(download).await)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
    names.sort();
    // good.jpg shares its stem with good.png and gets a numeric suffix
    assert_eq!(names, vec!["good_2_processed.png", "good_processed.png"]);
}

#[tokio::test]
async fn request_over_the_body_limit_names_the_limit() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(AppConfig {
        max_request_bytes: 64,
        ..test_config(dir.path())
    });
    let png = png_bytes();

    let response = app
        .oneshot(upload_request(&[("cat.png", &png)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("Upload too large"));
    assert!(page.contains("64 bytes"));
    assert_eq!(entries_under(&dir.path().join("web_processed")), 0);
}

#[tokio::test]
async fn too_many_files_are_rejected_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let png = png_bytes();

    let response = app
        .oneshot(upload_request(&[
            ("a.png", &png),
            ("b.png", &png),
            ("c.png", &png),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(entries_under(&dir.path().join("web_processed")), 0);
    assert_eq!(entries_under(&dir.path().join("uploads")), 0);
}

#[tokio::test]
async fn oversized_file_is_rejected_with_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let png = png_bytes();
    let huge = vec![7u8; 5000];

    let response = app
        .oneshot(upload_request(&[("small.png", &png), ("huge.png", &huge)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("huge.png"));
    assert_eq!(entries_under(&dir.path().join("web_processed")), 0);
}

#[tokio::test]
async fn unsupported_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(&[("notes.txt", b"hello")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(entries_under(&dir.path().join("web_processed")), 0);
}

#[tokio::test]
async fn undecodable_batch_reports_nothing_processed() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(&[("broken.png", b"not an image")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(entries_under(&dir.path().join("web_processed")), 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let bogus = app
        .clone()
        .oneshot(get("/download/not-a-uuid/processed_stickers_x.zip"))
        .await
        .unwrap();
    assert_eq!(bogus.status(), StatusCode::NOT_FOUND);

    let missing = app
        .oneshot(get(
            "/download/6f1c1c9e-3f55-4d6b-9a4e-2a1b7c9d0e11/processed_stickers_6f1c1c9e.zip",
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
