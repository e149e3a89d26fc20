//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chart_signal_app::Controller;
use chart_signal_core::FileUpload;
use chart_signal_inference::{
    AnalysisClient, Candidate, Content, DEFAULT_MODEL, GenerateContentRequest,
    GenerateContentResponse, InferenceError, InferenceTransport, Part,
};

/// Body returned by the endpoint in the bullish scenario.
#[allow(dead_code)]
pub const BULLISH_BODY: &str = r#"{"signal":"CALL","confidence":82,"analysis":"Bullish engulfing near support.","expiration":"1 minute"}"#;

/// Scripted transport that counts calls.
pub struct ScriptedTransport {
    pub calls: Mutex<u32>,
    pub outcome: Result<String, String>,
}

#[async_trait]
impl InferenceTransport for ScriptedTransport {
    async fn generate_content(
        &self,
        _model: &str,
        _request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError> {
        *self.calls.lock().expect("call counter lock should work") += 1;
        match &self.outcome {
            Ok(text) => Ok(GenerateContentResponse {
                candidates: vec![Candidate {
                    content: Some(Content {
                        role: Some("model".to_string()),
                        parts: vec![Part::text(text.clone())],
                    }),
                    finish_reason: Some("STOP".to_string()),
                }],
            }),
            Err(message) => Err(InferenceError::Communication(message.clone())),
        }
    }
}

/// Controller whose endpoint answers with `text`.
#[allow(dead_code)]
pub fn controller_replying(text: &str) -> (Controller, Arc<ScriptedTransport>) {
    controller_with(Ok(text.to_string()))
}

/// Controller whose endpoint fails with `message`.
#[allow(dead_code)]
pub fn controller_failing(message: &str) -> (Controller, Arc<ScriptedTransport>) {
    controller_with(Err(message.to_string()))
}

fn controller_with(outcome: Result<String, String>) -> (Controller, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport {
        calls: Mutex::new(0),
        outcome,
    });
    let client =
        AnalysisClient::new(DEFAULT_MODEL, transport.clone()).expect("client fixture should build");
    (Controller::new(client), transport)
}

/// Upload of `chart.png` declaring `image/png`.
#[allow(dead_code)]
pub fn chart_png() -> FileUpload {
    FileUpload::new("chart.png", "image/png", vec![137, 80, 78, 71, 13, 10, 26, 10])
}
