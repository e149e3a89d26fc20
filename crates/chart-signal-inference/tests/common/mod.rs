//! Shared fixtures for inference integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chart_signal_core::{ChartImage, FileUpload, encode_chart_image};
use chart_signal_inference::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InferenceError,
    InferenceTransport, Part,
};

/// Small encoded chart; the bytes need not decode.
#[allow(dead_code)]
pub fn fixture_chart() -> ChartImage {
    encode_chart_image(FileUpload::new("chart.png", "image/png", vec![137, 80, 78, 71]))
        .expect("chart fixture should encode")
}

/// Wraps `text` in a one-candidate response envelope.
#[allow(dead_code)]
pub fn text_response(text: &str) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content {
                role: Some("model".to_string()),
                parts: vec![Part::text(text)],
            }),
            finish_reason: Some("STOP".to_string()),
        }],
    }
}

/// Transport that records requests and replays one canned outcome.
#[allow(dead_code)]
pub struct RecordingTransport {
    pub requests: Mutex<Vec<(String, GenerateContentRequest)>>,
    pub outcome: Result<GenerateContentResponse, String>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn replying(response: GenerateContentResponse) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Ok(response),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcome: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl InferenceTransport for RecordingTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError> {
        self.requests
            .lock()
            .expect("request log lock should work")
            .push((model.to_string(), request.clone()));
        self.outcome
            .clone()
            .map_err(InferenceError::Communication)
    }
}
