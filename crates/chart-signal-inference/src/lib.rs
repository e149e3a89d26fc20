#![warn(missing_docs)]
//! # chart-signal-inference
//!
//! ## Purpose
//! Builds chart analysis requests and sends them to the external multimodal
//! inference service.
//!
//! ## Responsibilities
//! - Compose the fixed system instruction and the per-timeframe user prompt.
//! - Assemble a schema-constrained `generateContent` request around an
//!   encoded chart.
//! - Execute the request through an injectable [`InferenceTransport`].
//! - Provide the production [`GeminiTransport`] over HTTPS.
//!
//! ## Data flow
//! [`ChartImage`] + [`Timeframe`] -> [`build_analysis_request`] ->
//! [`AnalysisClient::analyze_chart`] -> [`InferenceTransport`] -> raw JSON
//! text handed to the analysis contract validator.
//!
//! ## Ownership and lifetimes
//! [`AnalysisClient`] is constructed once at startup and shared by reference;
//! the transport sits behind an `Arc` so tests can inject fakes.
//!
//! ## Error model
//! Precondition and configuration problems have their own variants. Every
//! transport or endpoint failure collapses into
//! [`InferenceError::Communication`], which keeps the underlying message.
//!
//! ## Security and privacy notes
//! The API key travels in a request header, never in the URL, and is never
//! logged. Image bytes are logged by size only.

use std::sync::Arc;

use async_trait::async_trait;
use chart_signal_analysis_contract::response_schema;
use chart_signal_core::{ChartImage, Timeframe};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Model used when configuration does not name one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public base URL of the inference API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Sampling temperature for every analysis request.
pub const ANALYSIS_TEMPERATURE: f64 = 0.2;

/// MIME type the model is forced to answer with.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Fixed instruction framing the model as a binary-options analyst.
pub fn system_instruction() -> String {
    format!(
        "Você é um analista especialista em negociação de opções binárias. Sua tarefa é analisar \
         um gráfico de candlestick fornecido e prever a direção da próxima vela. Você deve fornecer \
         sua análise estritamente no formato JSON solicitado, incluindo um tempo de expiração fixo \
         de '{}' para {} e '{}' para {}, sem nenhum texto ou formatação adicional.",
        Timeframe::M1.expiration_label(),
        Timeframe::M1.code(),
        Timeframe::M5.expiration_label(),
        Timeframe::M5.code(),
    )
}

/// Natural-language prompt for one chart at `timeframe`.
pub fn user_prompt(timeframe: Timeframe) -> String {
    format!(
        "Analise este gráfico de candlestick para o timeframe de {code} ({label}). Com base na \
         análise técnica, qual é o sinal para a próxima vela? Forneça um sinal claro (CALL, PUT ou \
         NEUTRO), um nível de confiança (0-100), uma breve explicação dos principais fatores e o \
         tempo de expiração. O tempo de expiração deve ser estritamente '{m1}' se o timeframe for \
         M1, e '{m5}' se o timeframe for M5. Para este gráfico, use '{expected}'.",
        code = timeframe.code(),
        label = timeframe.label(),
        m1 = Timeframe::M1.expiration_label(),
        m5 = Timeframe::M5.expiration_label(),
        expected = timeframe.expiration_label(),
    )
}

/// Request body of the `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// User turn holding the image and the prompt.
    pub contents: Vec<Content>,
    /// Fixed analyst instruction.
    pub system_instruction: Content,
    /// Output constraints.
    pub generation_config: GenerationConfig,
}

/// One turn of multimodal content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Author role (`user` or `model`); omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Either inline binary data or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline base64 blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Creates an inline data part.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Inline base64 payload.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Structured-output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Forced response MIME type.
    pub response_mime_type: String,
    /// Schema the response must satisfy.
    pub response_schema: Value,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response body of the `generateContent` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates; the first one is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content, absent when generation was blocked.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated, trimmed text of the first candidate.
    ///
    /// Returns `None` when there is no candidate or it has no text.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();

        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// Builds the schema-constrained analysis request for one chart.
///
/// # Errors
/// Returns [`InferenceError::EmptyImage`] when the chart has no payload.
pub fn build_analysis_request(
    image: &ChartImage,
    timeframe: Timeframe,
) -> Result<GenerateContentRequest, InferenceError> {
    if image.is_empty() {
        return Err(InferenceError::EmptyImage);
    }

    Ok(GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::inline(image.mime_type.clone(), image.base64_data.clone()),
                Part::text(user_prompt(timeframe)),
            ],
        }],
        system_instruction: Content {
            role: None,
            parts: vec![Part::text(system_instruction())],
        },
        generation_config: GenerationConfig {
            response_mime_type: JSON_MIME_TYPE.to_string(),
            response_schema: response_schema(),
            temperature: ANALYSIS_TEMPERATURE,
        },
    })
}

/// Abstract transport used by the analysis client.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Sends one `generateContent` request for `model`.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError>;
}

/// Capability object used to request chart analyses.
#[derive(Clone)]
pub struct AnalysisClient {
    model: String,
    transport: Arc<dyn InferenceTransport>,
}

impl AnalysisClient {
    /// Creates a client for `model` over `transport`.
    ///
    /// # Errors
    /// Returns [`InferenceError::InvalidModel`] when the model name is blank.
    pub fn new(
        model: impl Into<String>,
        transport: Arc<dyn InferenceTransport>,
    ) -> Result<Self, InferenceError> {
        let model = model.into();
        if model.trim().is_empty() || model.contains('/') {
            return Err(InferenceError::InvalidModel(model));
        }

        Ok(Self { model, transport })
    }

    /// Returns the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requests an analysis of `image` and returns the raw JSON text.
    ///
    /// # Errors
    /// Returns [`InferenceError::EmptyImage`] when ingestion has not produced
    /// a payload.
    /// Returns [`InferenceError::Communication`] for any transport or endpoint
    /// failure, including a response without text.
    #[tracing::instrument(
        name = "analyze_chart",
        skip_all,
        fields(model = %self.model, timeframe = %timeframe, mime = %image.mime_type)
    )]
    pub async fn analyze_chart(
        &self,
        image: &ChartImage,
        timeframe: Timeframe,
    ) -> Result<String, InferenceError> {
        let request = build_analysis_request(image, timeframe)?;
        debug!(payload_bytes = image.base64_data.len(), "sending analysis request");

        let response = self
            .transport
            .generate_content(&self.model, &request)
            .await?;

        match response.text() {
            Some(text) => {
                info!(response_bytes = text.len(), "analysis response received");
                Ok(text)
            }
            None => {
                let reason = response.finish_reason().unwrap_or("unknown");
                warn!(finish_reason = reason, "analysis response had no text");
                Err(InferenceError::Communication(format!(
                    "response contained no text (finish reason: {reason})"
                )))
            }
        }
    }
}

/// Production transport speaking the Gemini REST API.
#[derive(Clone)]
pub struct GeminiTransport {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl GeminiTransport {
    /// Creates a transport rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`InferenceError::InvalidEndpoint`] when the URL fails
    /// [`validate_endpoint`].
    /// Returns [`InferenceError::MissingApiKey`] when the key is blank.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, InferenceError> {
        let base_url = validate_endpoint(base_url)?;
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(InferenceError::MissingApiKey);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        })
    }

    /// Full URL of the `generateContent` method for `model`.
    ///
    /// # Errors
    /// Returns [`InferenceError::InvalidEndpoint`] when the joined URL is
    /// invalid.
    pub fn method_url(&self, model: &str) -> Result<Url, InferenceError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
            .map_err(|error| InferenceError::InvalidEndpoint(format!("invalid method url: {error}")))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[async_trait]
impl InferenceTransport for GeminiTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, InferenceError> {
        let url = self.method_url(model)?;
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|error| InferenceError::Communication(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InferenceError::Communication(error.to_string()))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => match parsed.error.status {
                    Some(api_status) => format!("{api_status}: {}", parsed.error.message),
                    None => parsed.error.message,
                },
                Err(_) => body.trim().to_string(),
            };
            let detail = if detail.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                detail
            };
            warn!(status = status.as_u16(), "inference endpoint returned an error");
            return Err(InferenceError::Communication(format!(
                "HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body).map_err(|error| {
            InferenceError::Communication(format!("unreadable response envelope: {error}"))
        })
    }
}

/// Validates the inference base URL.
///
/// HTTPS is required except for loopback hosts.
///
/// # Errors
/// Returns [`InferenceError::InvalidEndpoint`] for unparsable URLs or plain
/// HTTP to a non-loopback host.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, InferenceError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| InferenceError::InvalidEndpoint(format!("invalid url: {error}")))?;

    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback(&parsed) => Ok(parsed),
        _ => Err(InferenceError::InvalidEndpoint(
            "inference endpoint must use https".to_string(),
        )),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(address)) => address.is_loopback(),
        Some(url::Host::Ipv6(address)) => address.is_loopback(),
        None => false,
    }
}

/// Inference layer errors.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Endpoint URL violates policy.
    #[error("invalid inference endpoint: {0}")]
    InvalidEndpoint(String),
    /// No API key was provided.
    #[error("inference api key is missing")]
    MissingApiKey,
    /// Model name is blank or malformed.
    #[error("invalid model name: {0:?}")]
    InvalidModel(String),
    /// Chart has no encoded payload.
    #[error("chart image is empty; ingest an image first")]
    EmptyImage,
    /// Transport or endpoint failure; keeps the underlying message.
    #[error("communication failure with the inference service: {0}")]
    Communication(String),
}
