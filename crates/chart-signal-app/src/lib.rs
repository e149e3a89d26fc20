#![warn(missing_docs)]
//! # chart-signal-app
//!
//! ## Purpose
//! Orchestrates ingestion, inference, validation, and session state for
//! `chart-signal`.
//!
//! ## Responsibilities
//! - Own the session state and the injected analysis client ([`Controller`]).
//! - Run one analysis end to end: request, validate, record.
//! - Convert every failure into the user-facing [`FailureKind`] taxonomy.
//! - Load configuration and install logging for the binary.
//!
//! ## Data flow
//! CLI input -> [`Controller::upload`] -> [`Controller::analyze`] ->
//! [`run_analysis`] (inference + contract validation) ->
//! [`SessionState::complete`] -> [`project_session_status`] for output.
//!
//! ## Ownership and lifetimes
//! The controller owns its session; each request works on an owned ticket
//! snapshot, so no state is borrowed across the await point.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`] and mapped to
//! [`FailureKind`] at the controller boundary; nothing escapes as a panic.
//!
//! ## Security and privacy notes
//! - API keys live only in [`config::AppConfig`] and are redacted from its
//!   `Debug` output.
//! - Failure detail passes through [`redact_sensitive`] before display or
//!   logging.

pub mod config;
pub mod logging;

use chart_signal_analysis_contract::{
    AnalysisContractError, AnalysisResult, parse_analysis_result,
};
use chart_signal_core::{CoreError, FileUpload, Timeframe, UploadSource};
use chart_signal_inference::{AnalysisClient, InferenceError};
use chart_signal_ui::{AnalysisTicket, FailureKind, Phase, Rejection, SessionState, View};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Build-time application version loaded from root `VERSION`.
pub const APP_VERSION: &str = env!("CHART_SIGNAL_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Flat, serializable snapshot of the session for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    /// Phase name.
    pub phase: String,
    /// Selected timeframe code.
    pub timeframe: String,
    /// Name of the ingested chart.
    pub image: Option<String>,
    /// Whether the analyze control is enabled.
    pub can_analyze: bool,
    /// Analyze control label.
    pub analyze_label: String,
    /// Validated result, when displaying.
    pub result: Option<AnalysisResult>,
    /// Error message, when failed.
    pub error: Option<String>,
}

/// Projects session state into a flat status snapshot.
pub fn project_session_status(state: &SessionState) -> SessionStatus {
    SessionStatus {
        phase: format!("{:?}", state.phase()),
        timeframe: state.timeframe().code().to_string(),
        image: state.image().map(|image| image.name.clone()),
        can_analyze: state.can_analyze(),
        analyze_label: state.analyze_label().to_string(),
        result: state.result().cloned(),
        error: state.error().map(str::to_string),
    }
}

/// Requests and validates one analysis.
///
/// Out-of-range confidence and a mismatched expiration are logged, not
/// corrected.
///
/// # Errors
/// Returns [`AppError::Inference`] when the request fails.
/// Returns [`AppError::Analysis`] when the response violates the contract.
pub async fn run_analysis(
    client: &AnalysisClient,
    ticket: &AnalysisTicket,
) -> Result<AnalysisResult, AppError> {
    let raw = client.analyze_chart(&ticket.image, ticket.timeframe).await?;
    let result = parse_analysis_result(&raw)?;

    if !result.confidence_in_range() {
        warn!(confidence = result.confidence, "model confidence outside 0-100");
    }
    if !result.expiration_matches(ticket.timeframe) {
        warn!(
            expiration = %result.expiration,
            expected = ticket.timeframe.expiration_label(),
            "model expiration does not match timeframe"
        );
    }

    info!(
        signal = result.signal.label(),
        confidence = result.confidence,
        "analysis validated"
    );
    Ok(result)
}

/// Session controller: the only writer of [`SessionState`].
pub struct Controller {
    session: SessionState,
    client: AnalysisClient,
}

impl Controller {
    /// Creates a controller in the initial configuring state.
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            session: SessionState::new(),
            client,
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Changes the timeframe of the next request.
    ///
    /// # Errors
    /// Returns [`Rejection::Busy`] while a request is in flight.
    pub fn select_timeframe(&mut self, timeframe: Timeframe) -> Result<(), Rejection> {
        self.session.select_timeframe(timeframe)
    }

    /// Ingests an upload from either entry point.
    ///
    /// # Errors
    /// Propagates the session's [`Rejection`]; state is unchanged on error.
    pub fn upload(&mut self, upload: FileUpload, source: UploadSource) -> Result<(), Rejection> {
        match self.session.accept_upload(upload, source) {
            Ok(image) => {
                info!(
                    name = %image.name,
                    mime = %image.mime_type,
                    dimensions = ?image.preview.dimensions,
                    "chart ingested"
                );
                Ok(())
            }
            Err(rejection) => {
                if rejection.is_user_visible() {
                    warn!(reason = %rejection, "upload rejected");
                }
                Err(rejection)
            }
        }
    }

    /// Runs one analysis to completion and records the outcome.
    ///
    /// # Errors
    /// Returns [`Rejection::NoImage`] or [`Rejection::Busy`] when the analyze
    /// guard blocks; no request is made in that case.
    pub async fn analyze(&mut self) -> Result<Phase, Rejection> {
        let ticket = self.session.begin_analysis()?;

        let outcome = run_analysis(&self.client, &ticket).await.map_err(|error| {
            warn!(error = %redact_sensitive(&error.to_string()), "analysis failed");
            error.failure_kind()
        });

        self.session.complete(outcome)
    }

    /// View to render for the current state.
    pub fn view(&self) -> View<'_> {
        self.session.view()
    }
}

/// Secret markers and the separators that must follow them for a match.
const SECRET_MARKERS: [(&str, &[char]); 6] = [
    ("x-goog-api-key", &['=', ':']),
    ("key", &['=']),
    ("authorization", &['=', ':']),
    ("bearer", &[' ']),
    ("token", &['=', ':']),
    ("password", &['=', ':']),
];

/// Redacts common secret markers in log-safe output.
///
/// A marker only counts when a separator and a value follow it, so prose
/// such as "Missing Authorization header" survives. Everything after a
/// matched marker is replaced, since the secret's extent is not known.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let cut = SECRET_MARKERS
        .iter()
        .filter_map(|(marker, separators)| {
            lower
                .match_indices(marker)
                .find(|(position, _)| {
                    let rest = &lower[position + marker.len()..];
                    rest.starts_with(*separators) && !rest[1..].trim().is_empty()
                })
                .map(|(position, _)| (position, *marker))
        })
        .min_by_key(|(position, _)| *position);

    match cut {
        Some((position, marker)) => {
            let prefix = &input[..position];
            format!("{prefix}{marker}=<redacted>")
        }
        None => input.to_string(),
    }
}

/// Maps an inference error onto the user-facing taxonomy.
pub fn failure_from_inference(error: &InferenceError) -> FailureKind {
    match error {
        InferenceError::EmptyImage => FailureKind::NoImageProvided,
        InferenceError::Communication(detail) if detail.trim().is_empty() => FailureKind::Unknown,
        InferenceError::Communication(detail) => {
            FailureKind::InferenceTransport(redact_sensitive(detail.trim()))
        }
        other => FailureKind::InferenceTransport(redact_sensitive(&other.to_string())),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
    /// Logging could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
    /// Ingestion failure.
    #[error("ingest error: {0}")]
    Ingest(#[from] CoreError),
    /// Inference request failure.
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
    /// Response contract violation.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisContractError),
}

impl AppError {
    /// User-facing classification of this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AppError::Inference(error) => failure_from_inference(error),
            AppError::Analysis(_) => FailureKind::MalformedResponse,
            AppError::Ingest(_) => FailureKind::UnsupportedFileType,
            AppError::Config(_) | AppError::Logging(_) => FailureKind::Unknown,
        }
    }
}
