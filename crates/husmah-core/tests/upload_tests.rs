//! Image upload strategies against a mock image host.

use husmah_core::models::ProjectDraft;
use husmah_core::upload::{ImageFile, ImageUploader, UploadError};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPLOAD_PATH: &str = "/v1_1/demo/image/upload";

async fn setup() -> (MockServer, ImageUploader) {
    let server = MockServer::start().await;
    let uploader = ImageUploader::with_host(&server.uri(), "demo").unwrap();
    (server, uploader)
}

fn uploaded(url: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "secure_url": url }))
}

fn preset_missing() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": { "message": "Upload preset not found" }
    }))
}

#[tokio::test]
async fn test_first_accepted_preset_wins() {
    let (server, uploader) = setup().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("ml_default"))
        .respond_with(preset_missing())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .and(body_string_contains("unsigned_preset"))
        .respond_with(uploaded("https://cdn/front.png"))
        .expect(1)
        .mount(&server)
        .await;

    let image = ImageFile::new("front.png", b"png-bytes".to_vec());
    let url = uploader.upload(&image).await.unwrap();
    assert_eq!(url, "https://cdn/front.png");
}

#[tokio::test]
async fn test_all_presets_refused_falls_back_to_data_url() {
    let (server, uploader) = setup().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid upload preset"))
        .expect(4)
        .mount(&server)
        .await;

    let image = ImageFile::new("dot.gif", b"abc".to_vec());
    let url = uploader.upload(&image).await.unwrap();
    assert_eq!(url, "data:image/gif;base64,YWJj");
}

#[tokio::test]
async fn test_other_failures_abort_without_fallback() {
    let (server, uploader) = setup().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .expect(1)
        .mount(&server)
        .await;

    let image = ImageFile::new("front.jpg", b"jpg".to_vec());
    let err = uploader.upload(&image).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Image upload failed: Upload failed: 401 - Invalid API key"
    );
}

#[tokio::test]
async fn test_upload_images_fills_draft_in_order() {
    let (server, uploader) = setup().await;
    for (name, url) in [
        ("front.png", "https://cdn/front.png"),
        ("side-a.jpg", "https://cdn/side-a.jpg"),
        ("side-b.jpg", "https://cdn/side-b.jpg"),
    ] {
        Mock::given(method("POST"))
            .and(path(UPLOAD_PATH))
            .and(body_string_contains(name))
            .respond_with(uploaded(url))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut draft = ProjectDraft {
        name: "Riverside Villa".to_string(),
        main_image: "https://cdn/old.png".to_string(),
        all_images: vec!["https://cdn/kept.png".to_string()],
        ..Default::default()
    };
    let main = ImageFile::new("front.png", b"1".to_vec());
    let additional = vec![
        ImageFile::new("side-a.jpg", b"2".to_vec()),
        ImageFile::new("side-b.jpg", b"3".to_vec()),
    ];

    uploader
        .upload_images(&mut draft, Some(&main), &additional)
        .await
        .unwrap();

    assert_eq!(draft.main_image, "https://cdn/front.png");
    assert_eq!(
        draft.all_images,
        vec![
            "https://cdn/kept.png",
            "https://cdn/side-a.jpg",
            "https://cdn/side-b.jpg"
        ]
    );
}

#[tokio::test]
async fn test_main_image_failure_is_prefixed_and_draft_untouched() {
    let (server, uploader) = setup().await;
    Mock::given(method("POST"))
        .and(path(UPLOAD_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
        .mount(&server)
        .await;

    let mut draft = ProjectDraft::default();
    let main = ImageFile::new("front.png", b"1".to_vec());
    let err = uploader
        .upload_images(&mut draft, Some(&main), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::MainImage(_)));
    assert_eq!(
        err.to_string(),
        "Main image upload failed: Image upload failed: Upload failed: 500 - storage offline"
    );
    assert_eq!(draft, ProjectDraft::default());
}

#[tokio::test]
async fn test_unreachable_host_fails_fast() {
    let uploader = ImageUploader::with_host("http://127.0.0.1:1", "demo").unwrap();
    let mut draft = ProjectDraft::default();
    let main = ImageFile::new("front.png", b"1".to_vec());

    let err = uploader
        .upload_images(&mut draft, Some(&main), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Unreachable));
    assert_eq!(
        err.to_string(),
        "Unable to connect to image upload service. Please check your internet connection."
    );
}
