#![warn(missing_docs)]
//! # chart-signal binary
//!
//! Command-line front end: ingest one chart, analyze it, print the view.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use chart_signal_app::config::AppConfig;
use chart_signal_app::logging::init_logging;
use chart_signal_app::{Controller, app_version, project_session_status};
use chart_signal_core::{FileUpload, Timeframe, UploadSource};
use chart_signal_ui::{
    DISCLAIMER, View, loader_heading, loader_interval, loader_message, result_lines,
};
use clap::Parser;
use tracing::error;

/// Binary-options chart analyst backed by a multimodal model.
#[derive(Debug, Parser)]
#[command(name = "chart-signal", version = app_version(), about)]
struct Args {
    /// Candlestick chart image (PNG, JPEG, GIF, WebP, BMP).
    image: PathBuf,

    /// Candle interval of the chart: M1 or M5.
    #[arg(short, long, default_value_t = Timeframe::M1)]
    timeframe: Timeframe,

    /// Print the final session status as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// CLI entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("chart-signal: {error}");
            return ExitCode::from(2);
        }
    };

    if let Err(error) = init_logging(config.log_format) {
        eprintln!("chart-signal: {error}");
        return ExitCode::from(2);
    }

    let client = match config.build_client() {
        Ok(client) => client,
        Err(error) => {
            error!(%error, "failed to build analysis client");
            eprintln!("chart-signal: {error}");
            return ExitCode::from(2);
        }
    };

    let mut controller = Controller::new(client);
    if let Err(rejection) = controller.select_timeframe(args.timeframe) {
        eprintln!("{rejection}");
        return ExitCode::FAILURE;
    }

    let upload = match FileUpload::from_path(&args.image) {
        Ok(upload) => upload,
        Err(error) => {
            eprintln!("chart-signal: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(rejection) = controller.upload(upload, UploadSource::Picker) {
        eprintln!("{rejection}");
        return ExitCode::FAILURE;
    }

    let timeframe = controller.session().timeframe();
    let outcome = {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(loader_interval(timeframe));
        let analysis = controller.analyze();
        tokio::pin!(analysis);

        eprintln!("{}", loader_heading(timeframe));
        loop {
            tokio::select! {
                outcome = &mut analysis => break outcome,
                _ = ticker.tick() => {
                    eprintln!("  {}", loader_message(timeframe, started.elapsed()));
                }
            }
        }
    };

    if let Err(rejection) = outcome {
        eprintln!("{rejection}");
        return ExitCode::FAILURE;
    }

    if args.json {
        match serde_json::to_string_pretty(&project_session_status(controller.session())) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => {
                eprintln!("chart-signal: {error}");
                return ExitCode::FAILURE;
            }
        }
    }

    match controller.view() {
        View::Result(result) => {
            if !args.json {
                for line in result_lines(result) {
                    println!("{line}");
                }
                println!();
                println!("{DISCLAIMER}");
            }
            ExitCode::SUCCESS
        }
        View::Error(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        View::Configuration | View::Loading { .. } => ExitCode::FAILURE,
    }
}
