//! Integration tests for chart image ingestion.

mod common;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chart_signal_core::{CoreError, FileUpload, encode_chart_image};

#[test]
fn image_ingestion_tests_encodes_png_with_preview() {
    let bytes = common::png_bytes(3, 2);
    let image = encode_chart_image(FileUpload::new("chart.png", "image/png", bytes.clone()))
        .expect("png upload should be accepted");

    assert_eq!(image.name, "chart.png");
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(STANDARD.decode(&image.base64_data).unwrap(), bytes);
    assert!(image.preview.data_url.starts_with("data:image/png;base64,"));
    assert!(image.preview.data_url.ends_with(&image.base64_data));
    assert_eq!(image.preview.dimensions, Some((3, 2)));
}

#[test]
fn image_ingestion_tests_rejects_text_files() {
    let error = encode_chart_image(FileUpload::new("notes.txt", "text/plain", b"hello".to_vec()))
        .expect_err("text upload should be rejected");
    assert!(matches!(error, CoreError::UnsupportedFileType { .. }));
}

#[test]
fn image_ingestion_tests_rejects_empty_images() {
    let error = encode_chart_image(FileUpload::new("empty.png", "image/png", Vec::new()))
        .expect_err("empty upload should be rejected");
    assert!(matches!(error, CoreError::EmptyImage(_)));
}

#[test]
fn image_ingestion_tests_accepts_undecodable_image_without_dimensions() {
    let image = encode_chart_image(FileUpload::new("odd.heic", "image/heic", vec![0, 1, 2, 3]))
        .expect("declared image type is enough for ingestion");
    assert_eq!(image.preview.dimensions, None);
    assert!(!image.is_empty());
}
