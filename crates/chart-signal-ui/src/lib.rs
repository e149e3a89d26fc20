#![warn(missing_docs)]
//! # chart-signal-ui
//!
//! ## Purpose
//! Defines the front-end-agnostic session state machine for `chart-signal`
//! and the Portuguese presentation text it renders.
//!
//! ## Responsibilities
//! - Own the single sources of truth: timeframe, chart, in-flight flag,
//!   result, error.
//! - Enforce the `Configuring -> Requesting -> {Displaying, Failed}`
//!   transitions and their guards.
//! - Project state into one [`View`] plus control-enablement flags.
//! - Localize the failure taxonomy and loader progress messages.
//!
//! ## Data flow
//! Front-end events call [`SessionState`] methods ->
//! [`SessionState::begin_analysis`] hands an owned [`AnalysisTicket`] to the
//! orchestrator -> the outcome returns through [`SessionState::complete`] ->
//! [`SessionState::view`] drives rendering.
//!
//! ## Ownership and lifetimes
//! `SessionState` owns every value; tickets are cloned snapshots so the
//! in-flight request never borrows the session.
//!
//! ## Error model
//! Guard violations return [`Rejection`] and leave state untouched, except
//! the missing-image guard which also records its inline message.
//!
//! ## Security and privacy notes
//! Session state holds no credentials. Error text shown to users is built
//! from already-redacted detail strings.

use std::fmt;
use std::time::Duration;

use chart_signal_analysis_contract::AnalysisResult;
use chart_signal_core::{
    ChartImage, CoreError, FileUpload, Timeframe, UploadSource, encode_chart_image,
};
use thiserror::Error;

/// Label of the analyze button when idle.
pub const ANALYZE_LABEL: &str = "Analisar Gráfico";

/// Label of the analyze button while a request is in flight.
pub const ANALYZING_LABEL: &str = "Analisando...";

/// Disclaimer shown under every view.
pub const DISCLAIMER: &str = "Aviso: Esta ferramenta é apenas para fins informativos e não \
                              constitui aconselhamento financeiro. Negociar envolve riscos.";

/// Rotating progress messages shown while the analysis runs.
pub const LOADER_MESSAGES: [&str; 9] = [
    "Inicializando motor de análise...",
    "Procurando por padrões de candlestick...",
    "Identificando níveis de suporte e resistência...",
    "Avaliando a estrutura do mercado...",
    "Analisando a força de compradores e vendedores...",
    "Buscando por oportunidades de arbitragem...",
    "Compilando análise técnica...",
    "Gerando sinal de negociação...",
    "Finalizando recomendações...",
];

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Selecting timeframe and chart.
    Configuring,
    /// One analysis request is in flight.
    Requesting,
    /// A validated result is shown.
    Displaying,
    /// The last analysis failed.
    Failed,
}

/// User-facing failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Analyze requested before any chart was ingested.
    NoImageProvided,
    /// Upload was not an image.
    UnsupportedFileType,
    /// Network or endpoint failure; carries the underlying message.
    InferenceTransport(String),
    /// Response was missing or mistyped required fields.
    MalformedResponse,
    /// Failure with no recognizable message.
    Unknown,
}

impl FailureKind {
    /// Localized message displayed for this failure.
    pub fn message(&self) -> String {
        match self {
            FailureKind::NoImageProvided => {
                "Por favor, envie uma imagem do gráfico primeiro.".to_string()
            }
            FailureKind::UnsupportedFileType => {
                "Por favor, selecione um arquivo de imagem válido.".to_string()
            }
            FailureKind::InferenceTransport(detail) => {
                format!("A análise falhou: Erro na comunicação com a IA: {detail}")
            }
            FailureKind::MalformedResponse => {
                "A análise falhou: Resposta da IA está em um formato inválido.".to_string()
            }
            FailureKind::Unknown => "Ocorreu um erro desconhecido durante a análise.".to_string(),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Guard violations reported by session methods.
#[derive(Debug, Error)]
pub enum Rejection {
    /// Interaction is disabled while a request is in flight.
    #[error("Uma análise já está em andamento.")]
    Busy,
    /// Analyze requested without a chart.
    #[error("{}", FailureKind::NoImageProvided.message())]
    NoImage,
    /// Upload failed validation.
    #[error("{}", FailureKind::UnsupportedFileType.message())]
    UnsupportedUpload {
        /// Entry point of the rejected upload.
        origin: UploadSource,
        /// Ingestion failure detail.
        #[source]
        cause: CoreError,
    },
    /// Outcome delivered while no request was outstanding.
    #[error("Nenhuma análise está em andamento.")]
    NotRequesting,
}

impl Rejection {
    /// Returns `true` when the front end should show a message.
    ///
    /// Rejected drops are ignored silently.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Rejection::UnsupportedUpload {
                origin: UploadSource::Drop,
                ..
            } | Rejection::NotRequesting
        )
    }
}

/// Owned snapshot of the inputs of one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    /// Chart to analyze.
    pub image: ChartImage,
    /// Timeframe the chart was captured at.
    pub timeframe: Timeframe,
}

/// Single view rendered for the current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    /// Timeframe selector and uploader only.
    Configuration,
    /// Loader for the in-flight request.
    Loading {
        /// Timeframe being analyzed.
        timeframe: Timeframe,
    },
    /// Result card.
    Result(&'a AnalysisResult),
    /// Error banner.
    Error(&'a str),
}

/// Session state owned by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: Phase,
    timeframe: Timeframe,
    image: Option<ChartImage>,
    result: Option<AnalysisResult>,
    in_flight: bool,
    error: Option<String>,
}

impl SessionState {
    /// Creates the initial `Configuring` state with the default timeframe.
    pub fn new() -> Self {
        Self {
            phase: Phase::Configuring,
            timeframe: Timeframe::default(),
            image: None,
            result: None,
            in_flight: false,
            error: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Selected timeframe.
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Ingested chart, if any.
    pub fn image(&self) -> Option<&ChartImage> {
        self.image.as_ref()
    }

    /// Last validated result, if any.
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Displayed error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Changes the timeframe for the next request.
    ///
    /// An existing result or error stays visible.
    ///
    /// # Errors
    /// Returns [`Rejection::Busy`] while a request is in flight.
    pub fn select_timeframe(&mut self, timeframe: Timeframe) -> Result<(), Rejection> {
        if self.in_flight {
            return Err(Rejection::Busy);
        }
        self.timeframe = timeframe;
        Ok(())
    }

    /// Ingests an upload and resets the analysis context.
    ///
    /// # Errors
    /// Returns [`Rejection::Busy`] while a request is in flight.
    /// Returns [`Rejection::UnsupportedUpload`] when the file is not an image;
    /// state is unchanged.
    pub fn accept_upload(
        &mut self,
        upload: FileUpload,
        source: UploadSource,
    ) -> Result<&ChartImage, Rejection> {
        if self.in_flight {
            return Err(Rejection::Busy);
        }

        let image = encode_chart_image(upload)
            .map_err(|cause| Rejection::UnsupportedUpload {
                origin: source,
                cause,
            })?;

        self.result = None;
        self.error = None;
        self.phase = Phase::Configuring;
        let stored: &ChartImage = self.image.insert(image);
        Ok(stored)
    }

    /// Starts an analysis and returns the request inputs.
    ///
    /// # Errors
    /// Returns [`Rejection::Busy`] while a request is in flight.
    /// Returns [`Rejection::NoImage`] when no chart was ingested; the inline
    /// message is recorded but the phase does not change.
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, Rejection> {
        if self.in_flight {
            return Err(Rejection::Busy);
        }

        let Some(image) = self.image.clone() else {
            self.result = None;
            self.error = Some(FailureKind::NoImageProvided.message());
            return Err(Rejection::NoImage);
        };

        self.result = None;
        self.error = None;
        self.in_flight = true;
        self.phase = Phase::Requesting;

        Ok(AnalysisTicket {
            image,
            timeframe: self.timeframe,
        })
    }

    /// Applies the outcome of the in-flight request.
    ///
    /// # Errors
    /// Returns [`Rejection::NotRequesting`] when nothing is in flight.
    pub fn complete(
        &mut self,
        outcome: Result<AnalysisResult, FailureKind>,
    ) -> Result<Phase, Rejection> {
        if !self.in_flight {
            return Err(Rejection::NotRequesting);
        }

        self.in_flight = false;
        match outcome {
            Ok(result) => {
                self.error = None;
                self.result = Some(result);
                self.phase = Phase::Displaying;
            }
            Err(failure) => {
                self.result = None;
                self.error = Some(failure.message());
                self.phase = Phase::Failed;
            }
        }

        Ok(self.phase)
    }

    /// Projects the state into the one view to render.
    pub fn view(&self) -> View<'_> {
        if self.in_flight {
            return View::Loading {
                timeframe: self.timeframe,
            };
        }
        if let Some(error) = &self.error {
            return View::Error(error);
        }
        if let Some(result) = &self.result {
            return View::Result(result);
        }
        View::Configuration
    }

    /// Returns `true` when the analyze control is enabled.
    pub fn can_analyze(&self) -> bool {
        self.image.is_some() && !self.in_flight
    }

    /// Returns `true` when the timeframe selector accepts input.
    pub fn selector_enabled(&self) -> bool {
        !self.in_flight
    }

    /// Returns `true` when the file picker accepts input.
    pub fn uploader_enabled(&self) -> bool {
        !self.in_flight
    }

    /// Returns `true` when drops onto the upload area are processed.
    pub fn drop_enabled(&self) -> bool {
        !self.in_flight
    }

    /// Text of the analyze control.
    pub fn analyze_label(&self) -> &'static str {
        if self.in_flight {
            ANALYZING_LABEL
        } else {
            ANALYZE_LABEL
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a confidence value as a percentage (`82%`).
pub fn format_confidence(confidence: f64) -> String {
    format!("{confidence}%")
}

/// Heading shown above the loader.
pub fn loader_heading(timeframe: Timeframe) -> String {
    format!("Analisando Gráfico de {}...", timeframe.code())
}

/// How long each loader message stays on screen.
pub fn loader_interval(timeframe: Timeframe) -> Duration {
    match timeframe {
        Timeframe::M1 => Duration::from_millis(1_500),
        Timeframe::M5 => Duration::from_millis(4_500),
    }
}

/// Loader message to show after `elapsed` time in flight.
pub fn loader_message(timeframe: Timeframe, elapsed: Duration) -> &'static str {
    let step = elapsed.as_millis() / loader_interval(timeframe).as_millis();
    LOADER_MESSAGES[(step % LOADER_MESSAGES.len() as u128) as usize]
}

/// Text lines of the result card.
pub fn result_lines(result: &AnalysisResult) -> Vec<String> {
    vec![
        "Resultado da Análise".to_string(),
        format!("{}: {}", result.signal.heading(), result.signal.label()),
        format!("Expiração: {}", result.expiration),
        format!("Confiança: {}", format_confidence(result.confidence)),
        "Análise Técnica da IA:".to_string(),
        result.analysis.clone(),
    ]
}
