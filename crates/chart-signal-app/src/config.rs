//! Environment-driven runtime configuration.

use std::fmt;
use std::sync::Arc;

use chart_signal_inference::{AnalysisClient, DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiTransport};

use crate::AppError;

/// Primary API key variable.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Fallback API key variable.
pub const FALLBACK_API_KEY_VAR: &str = "API_KEY";
/// Model override variable.
pub const MODEL_VAR: &str = "CHART_SIGNAL_MODEL";
/// Endpoint override variable.
pub const ENDPOINT_VAR: &str = "CHART_SIGNAL_ENDPOINT";
/// Log format variable (`compact` or `json`).
pub const LOG_FORMAT_VAR: &str = "CHART_SIGNAL_LOG_FORMAT";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Process configuration, resolved once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Inference API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Inference base URL.
    pub endpoint: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads `.env` (when present) and reads the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when no API key is set or the log format
    /// is unknown.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(API_KEY_VAR)
            .or_else(|| read(FALLBACK_API_KEY_VAR))
            .ok_or_else(|| {
                AppError::Config(format!("{API_KEY_VAR} (or {FALLBACK_API_KEY_VAR}) is not set"))
            })?;

        let log_format = match read(LOG_FORMAT_VAR).map(|raw| raw.to_ascii_lowercase()) {
            None => LogFormat::Compact,
            Some(raw) if raw == "compact" => LogFormat::Compact,
            Some(raw) if raw == "json" => LogFormat::Json,
            Some(raw) => {
                return Err(AppError::Config(format!(
                    "{LOG_FORMAT_VAR} must be compact or json, got {raw}"
                )));
            }
        };

        Ok(Self {
            api_key,
            model: read(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: read(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            log_format,
        })
    }

    /// Builds the process-wide analysis client.
    ///
    /// # Errors
    /// Returns [`AppError::Inference`] when the endpoint, key, or model is
    /// rejected.
    pub fn build_client(&self) -> Result<AnalysisClient, AppError> {
        let transport = GeminiTransport::new(&self.endpoint, self.api_key.clone())?;
        Ok(AnalysisClient::new(self.model.clone(), Arc::new(transport))?)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("log_format", &self.log_format)
            .finish()
    }
}
