//! End-to-end edit requests against a mock Gemini endpoint.

use genedit::{
    EditRequest, FailureKind, GeminiEditor, ImageEditorExt, ImageFormat, ImageInput,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A real 10x10 RGB PNG.
const PNG_10X10_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAoAAAAKCAIAAAACUFjqAAAAEklEQVR4nGP4z8CAB+GTG8HSALfKY52fTcuYAAAAAElFTkSuQmCC";

const JPEG_BYTES: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

fn base_image() -> ImageInput {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(PNG_10X10_B64)
        .unwrap();
    ImageInput::new(bytes, "image/png", Some("base.png".into())).unwrap()
}

fn reference_image() -> ImageInput {
    ImageInput::with_format(JPEG_BYTES.to_vec(), ImageFormat::Jpeg)
}

fn editor(server: &MockServer) -> GeminiEditor {
    GeminiEditor::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap()
}

async fn mount_json(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/[^/]+:generateContent$"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn sent_parts(server: &MockServer) -> Vec<Value> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = requests[0].body_json().unwrap();
    body["contents"][0]["parts"].as_array().unwrap().clone()
}

fn image_response(text: Option<&str>) -> Value {
    let mut parts = vec![json!({
        "inlineData": {"mimeType": "image/png", "data": PNG_10X10_B64}
    })];
    if let Some(text) = text {
        parts.push(json!({ "text": text }));
    }
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": parts},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_edit_returns_data_uri_and_text() {
    let server = MockServer::start().await;
    mount_json(&server, image_response(Some("done"))).await;

    let result = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap();

    assert_eq!(
        result.image_url(),
        format!("data:image/png;base64,{PNG_10X10_B64}")
    );
    assert_eq!(result.text.as_deref(), Some("done"));
    assert_eq!(
        result.metadata.model.as_deref(),
        Some("gemini-2.5-flash-image-preview")
    );
}

#[tokio::test]
async fn test_image_only_response_has_no_text() {
    let server = MockServer::start().await;
    mount_json(&server, image_response(None)).await;

    let result = editor(&server)
        .generate(base_image(), None, "brighter")
        .await
        .unwrap();

    assert!(result.text.is_none());
    assert_eq!(result.image.decode().unwrap(), base_image().data());
}

#[tokio::test]
async fn test_request_shape_without_reference() {
    let server = MockServer::start().await;
    mount_json(&server, image_response(None)).await;

    let _ = editor(&server)
        .generate(base_image(), None, "   ")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["generationConfig"]["responseModalities"],
        json!(["IMAGE", "TEXT"])
    );

    let parts = sent_parts(&server).await;
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], PNG_10X10_B64);
    assert_eq!(parts[1]["text"], genedit::image::ENHANCE_INSTRUCTION);
}

#[tokio::test]
async fn test_request_shape_with_reference() {
    let server = MockServer::start().await;
    mount_json(&server, image_response(None)).await;

    let _ = editor(&server)
        .generate(base_image(), Some(reference_image()), "")
        .await
        .unwrap();

    let parts = sent_parts(&server).await;
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[2]["text"], genedit::image::STYLE_TRANSFER_INSTRUCTION);
}

#[tokio::test]
async fn test_user_prompt_is_trimmed() {
    let server = MockServer::start().await;
    mount_json(&server, image_response(None)).await;

    let _ = editor(&server)
        .generate(base_image(), Some(reference_image()), "  add a red hat \n")
        .await
        .unwrap();

    let parts = sent_parts(&server).await;
    assert_eq!(parts[2]["text"], "add a red hat");
}

#[tokio::test]
async fn test_block_reason_is_named() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
    )
    .await;

    let failure = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Blocked);
    assert!(failure.message.contains("SAFETY"));
}

#[tokio::test]
async fn test_recitation_and_safety_rejections_differ() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "candidates": [{ "finishReason": "RECITATION" }] }),
    )
    .await;
    let recitation = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap_err();

    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
    )
    .await;
    let safety = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap_err();

    assert_eq!(recitation.kind, FailureKind::Rejected);
    assert_eq!(safety.kind, FailureKind::Rejected);
    assert_ne!(recitation.message, safety.message);
}

#[tokio::test]
async fn test_text_only_response_fails_with_commentary() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "I can only edit photos."},
                    {"text": "Please upload one."}
                ]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;

    let failure = editor(&server)
        .generate(base_image(), None, "draw a cat")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::EmptyResult);
    assert_eq!(
        failure.message,
        "I can only edit photos. Please upload one."
    );
}

#[tokio::test]
async fn test_missing_api_key_makes_no_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_response(None)))
        .expect(0)
        .mount(&server)
        .await;

    let editor = GeminiEditor::builder()
        .base_url(server.uri())
        .build()
        .unwrap();
    let failure = editor.generate(base_image(), None, "").await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Configuration);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_error_is_generic_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("internal: backend pool exhausted"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let failure = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(!failure.message.contains("backend pool"));
    assert!(failure.message.contains("try again"));
}

#[tokio::test]
async fn test_malformed_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let failure = editor(&server)
        .generate(base_image(), None, "")
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Transport);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let editor = GeminiEditor::builder()
        .api_key("test-key")
        .base_url(uri)
        .build()
        .unwrap();
    let failure = editor.generate(base_image(), None, "").await.unwrap_err();

    assert_eq!(failure.kind, FailureKind::Transport);
}

#[tokio::test]
async fn test_caller_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_response(None))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let request = EditRequest::new(base_image(), None, "");
    let failure = editor(&server)
        .edit_with_timeout(&request, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Timeout);
    assert!(failure.message.contains("timed out"));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1beta/models/gemini-2\.5-flash-image-preview$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "models/x"})))
        .mount(&server)
        .await;

    use genedit::ImageEditor;
    editor(&server).health_check().await.unwrap();
}
