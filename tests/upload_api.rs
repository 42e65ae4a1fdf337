//! Integration tests for the upload + conversation REST API.
//!
//! Each test spins up an Axum server on a random port with a scripted
//! recognition backend, then exercises the real multipart / JSON contract.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{GrayImage, Luma};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;
use uuid::Uuid;

use chat_recall::api::api_routes;
use chat_recall::config::EngineConfig;
use chat_recall::error::RecognitionError;
use chat_recall::pipeline::BatchProcessor;
use chat_recall::recognition::{RecognitionBackend, RecognitionOutput};
use chat_recall::store::{ConversationStore, MemoryStore};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend scripted by input width, so outputs stay deterministic across the
/// two crops recognized per image. Unscripted widths (the header name crops)
/// return `Empty`, which drives the fallback speaker name.
struct ScriptedVision {
    by_width: HashMap<u32, RecognitionOutput>,
}

#[async_trait]
impl RecognitionBackend for ScriptedVision {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, image: &GrayImage) -> Result<RecognitionOutput, RecognitionError> {
        Ok(self
            .by_width
            .get(&image.width())
            .cloned()
            .unwrap_or(RecognitionOutput::Empty))
    }
}

/// Start an Axum server on a random port and return its port.
async fn start_server(outputs: HashMap<u32, RecognitionOutput>) -> u16 {
    let backend = Arc::new(ScriptedVision { by_width: outputs });
    let store: Arc<dyn ConversationStore> = Arc::new(MemoryStore::new());
    let processor = Arc::new(BatchProcessor::new(backend, EngineConfig::default(), 2));
    let app = api_routes(store, processor);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

/// Encode a dark grayscale image; region selection falls back to the default
/// viewport, whose crop width is width - width / 4. Test image sizes map to
/// viewport crops 400 → 300 and 600 → 450.
fn dark_png(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_pixel(width, height, Luma([20u8]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn scripted(outputs: &[(u32, &str)]) -> HashMap<u32, RecognitionOutput> {
    outputs
        .iter()
        .map(|(width, text)| (*width, RecognitionOutput::Text(text.to_string())))
        .collect()
}

/// Transcript recognized from the first screenshot (400px upload).
const FIRST_TRANSCRIPT: &str =
    "**Alice**\n10:00 — Lunch tomorrow?\n**You**\n10:01 — Sure, noon works";

/// Transcript recognized from the second screenshot (600px upload); overlaps
/// the first one the way consecutive captures do.
const SECOND_TRANSCRIPT: &str =
    "**You**\n10:01 — Sure, noon works\n**Alice**\n10:02 — See you at the usual place";

fn upload_form(
    files: Vec<(&str, Vec<u8>)>,
    title: &str,
    category: &str,
) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("category", category.to_string())
        .text("tags", "food, friends");
    for (name, bytes) in files {
        form = form.part(
            "files",
            reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()),
        );
    }
    form
}

async fn post_upload(port: u16, form: reqwest::multipart::Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/api/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

// ── Health ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(HashMap::new()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "chat-recall");
    })
    .await
    .expect("test timed out");
}

// ── Upload ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_reconstructs_a_conversation() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal");
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["files_processed"], 1);
        assert_eq!(body["files_failed"], 0);
        assert_eq!(body["message_count"], 2);

        let id: Uuid = body["conversation_id"].as_str().unwrap().parse().unwrap();
        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations/{id}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let conversation: Value = resp.json().await.unwrap();
        assert_eq!(conversation["title"], "Lunch plans");
        assert_eq!(conversation["category"], "personal");
        assert_eq!(conversation["tags"], serde_json::json!(["food", "friends"]));

        let messages = conversation["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["sender"], "Alice");
        assert_eq!(messages[0]["content"], "Lunch tomorrow?");
        assert_eq!(messages[0]["timestamp"], "10:00");
        assert_eq!(messages[1]["sender"], "You");
        assert_eq!(messages[1]["content"], "Sure, noon works");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn overlapping_batches_merge_without_duplicates() {
    timeout(TEST_TIMEOUT, async {
        let outputs = scripted(&[(300, FIRST_TRANSCRIPT), (450, SECOND_TRANSCRIPT)]);
        let port = start_server(outputs).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal");
        let body: Value = post_upload(port, form).await.json().await.unwrap();
        let id = body["conversation_id"].as_str().unwrap().to_string();

        // Second batch goes to the same conversation; its count reflects the
        // batch, not the stored total.
        let form = upload_form(vec![("shot2.png", dark_png(600, 400))], "Lunch plans", "personal")
            .text("conversation_id", id.clone());
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["conversation_id"], id);
        assert_eq!(body["message_count"], 2);

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations/{id}"))
            .await
            .unwrap();
        let conversation: Value = resp.json().await.unwrap();
        let contents: Vec<&str> = conversation["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec!["Lunch tomorrow?", "Sure, noon works", "See you at the usual place"]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn corrupt_file_counts_as_failed_not_fatal() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(
            vec![
                ("shot1.png", dark_png(400, 400)),
                ("broken.png", b"definitely not an image".to_vec()),
            ],
            "Lunch plans",
            "personal",
        );
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["files_processed"], 1);
        assert_eq!(body["files_failed"], 1);
        assert_eq!(body["message_count"], 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_with_no_files_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(HashMap::new()).await;

        let form = upload_form(vec![], "Empty", "misc");
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "No files uploaded");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreadable_batch_is_unprocessable() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(HashMap::new()).await;

        let form = upload_form(vec![("broken.png", b"garbage".to_vec())], "Broken", "misc");
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 422);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["files_failed"], 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_without_title_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = reqwest::multipart::Form::new().text("category", "personal").part(
            "files",
            reqwest::multipart::Part::bytes(dark_png(400, 400)).file_name("shot1.png"),
        );
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upload_with_invalid_conversation_id_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal")
            .text("conversation_id", "not-a-uuid");
        let resp = post_upload(port, form).await;
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

// ── Conversation CRUD ───────────────────────────────────────────────────

#[tokio::test]
async fn rest_list_conversations() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal");
        post_upload(port, form).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["title"], "Lunch plans");
        assert_eq!(body[0]["message_count"], 2);
        assert_eq!(body[0]["preview"], "Lunch tomorrow?. Sure, noon works");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_update_conversation_metadata() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal");
        let body: Value = post_upload(port, form).await.json().await.unwrap();
        let id = body["conversation_id"].as_str().unwrap().to_string();

        let resp = reqwest::Client::new()
            .put(format!("http://127.0.0.1:{port}/api/conversations/{id}"))
            .json(&serde_json::json!({"title": "Renamed"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let conversation: Value = resp.json().await.unwrap();
        assert_eq!(conversation["title"], "Renamed");
        assert_eq!(conversation["category"], "personal");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_delete_conversation() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(scripted(&[(300, FIRST_TRANSCRIPT)])).await;

        let form = upload_form(vec![("shot1.png", dark_png(400, 400))], "Lunch plans", "personal");
        let body: Value = post_upload(port, form).await.json().await.unwrap();
        let id = body["conversation_id"].as_str().unwrap().to_string();

        let resp = reqwest::Client::new()
            .delete(format!("http://127.0.0.1:{port}/api/conversations/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations/{id}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_missing_conversation_returns_404() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(HashMap::new()).await;

        let fake_id = Uuid::new_v4();
        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations/{fake_id}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Conversation not found");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_invalid_conversation_id_returns_400() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(HashMap::new()).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/conversations/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}
