//! Integration tests for the analyze action guards.

mod common;

use chart_signal_core::{Timeframe, UploadSource};
use chart_signal_ui::{FailureKind, Phase, Rejection, SessionState, View};

#[test]
fn analyze_guard_tests_no_image_is_a_no_op_for_every_timeframe() {
    for timeframe in Timeframe::ALL {
        let mut state = SessionState::new();
        state.select_timeframe(timeframe).expect("selector is enabled");

        let rejection = state.begin_analysis().expect_err("analyze needs an image");
        assert!(matches!(rejection, Rejection::NoImage));
        assert_eq!(state.phase(), Phase::Configuring);
        assert!(!state.is_in_flight());
        assert_eq!(state.timeframe(), timeframe);
        assert_eq!(
            state.error(),
            Some(FailureKind::NoImageProvided.message().as_str())
        );
    }
}

#[test]
fn analyze_guard_tests_blocks_second_request_while_in_flight() {
    let mut state = SessionState::new();
    state
        .accept_upload(common::png_upload("chart.png"), UploadSource::Picker)
        .expect("png is accepted");
    state.begin_analysis().expect("first analyze starts");

    let rejection = state.begin_analysis().expect_err("second analyze is blocked");
    assert!(matches!(rejection, Rejection::Busy));
    assert!(rejection.is_user_visible());
    assert_eq!(rejection.to_string(), "Uma análise já está em andamento.");
    assert!(!state.can_analyze());
    assert_eq!(state.phase(), Phase::Requesting);
}

#[test]
fn analyze_guard_tests_inputs_are_frozen_while_requesting() {
    let mut state = SessionState::new();
    state
        .accept_upload(common::png_upload("chart.png"), UploadSource::Picker)
        .expect("png is accepted");
    let ticket = state.begin_analysis().expect("analyze starts");

    assert!(!state.selector_enabled());
    assert!(!state.uploader_enabled());
    assert!(!state.drop_enabled());
    assert!(matches!(state.select_timeframe(Timeframe::M5), Err(Rejection::Busy)));
    assert!(matches!(
        state.accept_upload(common::png_upload("other.png"), UploadSource::Drop),
        Err(Rejection::Busy)
    ));
    assert_eq!(state.timeframe(), Timeframe::M1);
    assert_eq!(state.image().map(|image| image.name.as_str()), Some("chart.png"));
    assert_eq!(ticket.timeframe, Timeframe::M1);
    assert_eq!(state.view(), View::Loading { timeframe: Timeframe::M1 });
    assert_eq!(state.analyze_label(), "Analisando...");
}

#[test]
fn analyze_guard_tests_completion_without_request_is_rejected() {
    let mut state = SessionState::new();
    let rejection = state
        .complete(Ok(common::bullish_result()))
        .expect_err("nothing is in flight");
    assert!(matches!(rejection, Rejection::NotRequesting));
    assert_eq!(rejection.to_string(), "Nenhuma análise está em andamento.");
    assert!(state.result().is_none());
}
