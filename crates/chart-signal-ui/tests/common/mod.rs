//! Shared fixtures for session state tests.

use chart_signal_analysis_contract::{AnalysisResult, Signal};
use chart_signal_core::FileUpload;

/// Upload declaring an image type; bytes need not decode.
#[allow(dead_code)]
pub fn png_upload(name: &str) -> FileUpload {
    FileUpload::new(name, "image/png", vec![137, 80, 78, 71, 13, 10, 26, 10])
}

/// Upload declaring a text type.
#[allow(dead_code)]
pub fn text_upload() -> FileUpload {
    FileUpload::new("notes.txt", "text/plain", b"not a chart".to_vec())
}

/// Validated result matching the bullish scenario.
#[allow(dead_code)]
pub fn bullish_result() -> AnalysisResult {
    AnalysisResult {
        signal: Signal::Buy,
        confidence: 82.0,
        analysis: "Bullish engulfing near support.".to_string(),
        expiration: "1 minute".to_string(),
    }
}
