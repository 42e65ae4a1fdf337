//! HTTP vision backend: posts screenshots to an OpenAI-compatible
//! chat-completions endpoint and returns the model's transcript.
//!
//! The endpoint never sees raw geometry, so this backend always yields
//! [`RecognitionOutput::Text`] (or `Empty`); the free-text grammar in the
//! engine takes it from there.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use image::{GrayImage, ImageFormat};
use secrecy::ExposeSecret;

use crate::config::VisionConfig;
use crate::error::RecognitionError;
use crate::recognition::{RecognitionBackend, RecognitionOutput};

/// Request timeout for one recognition call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Cap on generated transcript length.
const MAX_COMPLETION_TOKENS: u32 = 1000;

/// Sampling temperature; low so the model transcribes rather than composes.
const TEMPERATURE: f32 = 0.2;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts text from images.";

/// Instructions sent with every screenshot. The format they request is the
/// same one the free-text grammar parses.
const TRANSCRIPT_PROMPT: &str = "\
This image is a screenshot of a chat conversation.

Extract every text message from the image in the exact order it appears,
top to bottom.

For each message identify:
1. The sender's name. Messages aligned to the right belong to \"You\";
   messages aligned to the left belong to the other person, whose name is
   shown at the top of the chat.
2. The timestamp in HH:MM format, when visible.
3. The message content.

Format the output exactly like this:

**Sender Name**
HH:MM — First message
HH:MM — Second message by the same sender

**Other Sender Name**
HH:MM — Their message

If a message has no timestamp, write the message on its own line below the
previous one by the same sender. Do not add commentary.";

/// Recognition backend backed by a remote vision chat model.
pub struct HttpVisionBackend {
    client: reqwest::Client,
    config: VisionConfig,
}

impl HttpVisionBackend {
    pub fn new(config: VisionConfig) -> Result<Self, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RecognitionError::Unavailable {
                backend: "http-vision".into(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Re-encode the working bitmap as a PNG data URL.
    fn encode_data_url(&self, image: &GrayImage) -> Result<String, RecognitionError> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| RecognitionError::RequestFailed {
                backend: self.name().to_string(),
                reason: format!("Failed to encode image: {e}"),
            })?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());
        Ok(format!("data:image/png;base64,{encoded}"))
    }
}

#[async_trait]
impl RecognitionBackend for HttpVisionBackend {
    fn name(&self) -> &str {
        "http-vision"
    }

    async fn recognize(&self, image: &GrayImage) -> Result<RecognitionOutput, RecognitionError> {
        let data_url = self.encode_data_url(image)?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": [
                    {"type": "text", "text": TRANSCRIPT_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]}
            ],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
        });

        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    RecognitionError::Unavailable {
                        backend: self.name().to_string(),
                        reason: e.to_string(),
                    }
                } else {
                    RecognitionError::RequestFailed {
                        backend: self.name().to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(RecognitionError::RequestFailed {
                backend: self.name().to_string(),
                reason: format!("{status}: {err}"),
            });
        }

        let data: serde_json::Value =
            resp.json().await.map_err(|e| RecognitionError::InvalidResponse {
                backend: self.name().to_string(),
                reason: e.to_string(),
            })?;

        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| RecognitionError::InvalidResponse {
                backend: self.name().to_string(),
                reason: "Missing choices[0].message.content".into(),
            })?;

        let content = content.trim();
        if content.is_empty() {
            tracing::debug!("Vision model returned an empty transcript");
            return Ok(RecognitionOutput::Empty);
        }

        Ok(RecognitionOutput::Text(content.to_string()))
    }
}
