//! Integration tests for the timeframe to expiration mapping.

use chart_signal_core::Timeframe;

#[test]
fn expiration_mapping_tests_fixed_label_per_timeframe() {
    assert_eq!(Timeframe::M1.expiration_label(), "1 minute");
    assert_eq!(Timeframe::M5.expiration_label(), "5 minutes");
}

#[test]
fn expiration_mapping_tests_default_is_one_minute() {
    assert_eq!(Timeframe::default(), Timeframe::M1);
    assert_eq!(Timeframe::ALL, [Timeframe::M1, Timeframe::M5]);
}
