#![warn(missing_docs)]
//! # chart-signal-analysis-contract
//!
//! ## Purpose
//! Defines the structured output contract the inference model must honor and
//! the client-side validator that turns its JSON text into a typed result.
//!
//! ## Responsibilities
//! - Declare the response schema sent with every analysis request.
//! - Decode then validate raw model output into [`AnalysisResult`].
//! - Map signal wire labels onto the [`Signal`] enumeration.
//!
//! ## Data flow
//! Raw JSON text from the inference service -> [`parse_analysis_result`] ->
//! [`AnalysisResult`] -> UI session state.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs so nothing borrows from the transient
//! response buffer.
//!
//! ## Error model
//! Invalid JSON, missing fields, mistyped fields, blank text, and unknown
//! signal labels all return [`AnalysisContractError`]; every variant is a
//! malformed response from the caller's point of view. Out-of-range
//! confidence is not an error.
//!
//! ## Security and privacy notes
//! This crate processes model output only; it never sees credentials or image
//! bytes.

use std::fmt;

use chart_signal_core::Timeframe;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use thiserror::Error;

/// Fields every model response must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["signal", "confidence", "analysis", "expiration"];

/// Lowest confidence the model is asked to report.
pub const CONFIDENCE_MIN: f64 = 0.0;

/// Highest confidence the model is asked to report.
pub const CONFIDENCE_MAX: f64 = 100.0;

/// Predicted direction for the next candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    /// Buy / call: price expected to rise.
    Buy,
    /// Sell / put: price expected to fall.
    Sell,
    /// No clear direction; stay out.
    Neutral,
}

impl Signal {
    /// Canonical label shown to the user and requested from the model.
    pub fn label(self) -> &'static str {
        match self {
            Signal::Buy => "CALL",
            Signal::Sell => "PUT",
            Signal::Neutral => "NEUTRO",
        }
    }

    /// Heading used above the signal in the result view.
    pub fn heading(self) -> &'static str {
        match self {
            Signal::Buy => "Sinal de Compra",
            Signal::Sell => "Sinal de Venda",
            Signal::Neutral => "Sinal Neutro",
        }
    }

    /// Parses a wire label, case-insensitively.
    ///
    /// Accepts the binary-options labels (`CALL`, `PUT`, `NEUTRO`) and their
    /// plain equivalents (`BUY`, `SELL`, `NEUTRAL`).
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CALL" | "BUY" => Some(Signal::Buy),
            "PUT" | "SELL" => Some(Signal::Sell),
            "NEUTRO" | "NEUTRAL" => Some(Signal::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for Signal {
    type Error = AnalysisContractError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Signal::from_label(&raw).ok_or_else(|| {
            AnalysisContractError::InvalidContract(format!("unknown signal label: {raw}"))
        })
    }
}

impl From<Signal> for String {
    fn from(signal: Signal) -> Self {
        signal.label().to_string()
    }
}

/// Validated analysis produced by one successful inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Direction recommendation.
    pub signal: Signal,
    /// Model-reported certainty, nominally in `[0, 100]`; passed through as-is.
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f64,
    /// Short technical rationale.
    pub analysis: String,
    /// Recommended holding period.
    pub expiration: String,
}

/// Largest magnitude an `f64` holds without losing integer precision.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Writes whole confidences as integers (`82`, not `82.0`).
fn serialize_confidence<S>(confidence: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if confidence.fract() == 0.0 && confidence.abs() < EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*confidence as i64)
    } else {
        serializer.serialize_f64(*confidence)
    }
}

impl AnalysisResult {
    /// Returns `true` when confidence lies inside `[0, 100]`.
    pub fn confidence_in_range(&self) -> bool {
        (CONFIDENCE_MIN..=CONFIDENCE_MAX).contains(&self.confidence)
    }

    /// Returns `true` when expiration equals the fixed label for `timeframe`.
    pub fn expiration_matches(&self, timeframe: Timeframe) -> bool {
        self.expiration
            .trim()
            .eq_ignore_ascii_case(timeframe.expiration_label())
    }
}

#[derive(Deserialize)]
struct WireAnalysis {
    signal: String,
    confidence: f64,
    analysis: String,
    expiration: String,
}

/// Parses raw model output into a validated analysis result.
///
/// # Errors
/// Returns [`AnalysisContractError::Decode`] for invalid JSON or when a
/// required field is missing or mistyped.
/// Returns [`AnalysisContractError::InvalidContract`] when a text field is
/// blank or the signal label is not recognized.
pub fn parse_analysis_result(raw: &str) -> Result<AnalysisResult, AnalysisContractError> {
    let wire: WireAnalysis =
        serde_json::from_str(raw.trim()).map_err(AnalysisContractError::Decode)?;

    for (field, value) in [
        ("signal", &wire.signal),
        ("analysis", &wire.analysis),
        ("expiration", &wire.expiration),
    ] {
        if value.trim().is_empty() {
            return Err(AnalysisContractError::InvalidContract(format!(
                "{field} is empty"
            )));
        }
    }

    let signal = Signal::try_from(wire.signal)?;

    Ok(AnalysisResult {
        signal,
        confidence: wire.confidence,
        analysis: wire.analysis,
        expiration: wire.expiration,
    })
}

/// Builds the structured-output schema attached to every analysis request.
///
/// Uses the inference API's OpenAPI-style type names.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "signal": {
                "type": "STRING",
                "description": "O sinal de negociação para a próxima vela. Deve ser 'CALL' (compra/alta), 'PUT' (venda/baixa), ou 'NEUTRO' (aguardar/sem sinal claro)."
            },
            "confidence": {
                "type": "NUMBER",
                "description": "Nível de confiança no sinal, de 0 a 100."
            },
            "analysis": {
                "type": "STRING",
                "description": "Uma análise técnica concisa (máximo 3-4 frases) explicando o porquê do sinal. Mencione os principais indicadores ou padrões observados (ex: engolfo de alta, zona de suporte, RSI sobrevendido)."
            },
            "expiration": {
                "type": "STRING",
                "description": format!(
                    "O tempo de expiração recomendado para a operação. Use '{}' para timeframe {} e '{}' para timeframe {}.",
                    Timeframe::M1.expiration_label(),
                    Timeframe::M1.code(),
                    Timeframe::M5.expiration_label(),
                    Timeframe::M5.code(),
                )
            }
        },
        "required": REQUIRED_FIELDS,
    })
}

/// Analysis contract errors.
#[derive(Debug, Error)]
pub enum AnalysisContractError {
    /// JSON decode failure, including missing or mistyped fields.
    #[error("analysis decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("analysis contract violation: {0}")]
    InvalidContract(String),
}
