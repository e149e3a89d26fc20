//! Validates wire fixtures and built requests against frozen JSON schemas.

use chart_signal_analysis_contract::{parse_analysis_result, response_schema};
use chart_signal_core::{FileUpload, Timeframe, encode_chart_image};
use chart_signal_inference::build_analysis_request;
use jsonschema::JSONSchema;
use serde_json::Value;

const CONTRACTS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts");

fn read_contract(relative: &str) -> String {
    std::fs::read_to_string(format!("{CONTRACTS_DIR}/{relative}"))
        .expect("contract file should be readable")
}

fn load_json(relative: &str) -> Value {
    serde_json::from_str(&read_contract(relative)).expect("contract file should be valid json")
}

fn compile_validator(relative: &str) -> JSONSchema {
    let schema = load_json(relative);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn analysis_fixture_matches_schema_and_parser() {
    let validator = compile_validator("analysis-result.schema.json");
    let fixture = load_json("fixtures/analysis-result.valid.json");
    assert!(
        validator.is_valid(&fixture),
        "valid analysis fixture should validate against schema"
    );

    let parsed = parse_analysis_result(&read_contract("fixtures/analysis-result.valid.json"))
        .expect("parser should accept the valid fixture");
    assert_eq!(parsed.signal.label(), "CALL");
    assert!(parsed.expiration_matches(Timeframe::M1));
}

#[test]
fn incomplete_analysis_is_rejected_by_schema_and_parser() {
    let validator = compile_validator("analysis-result.schema.json");
    let fixture = load_json("fixtures/analysis-result.missing-expiration.json");
    assert!(!validator.is_valid(&fixture));

    let parsed =
        parse_analysis_result(&read_contract("fixtures/analysis-result.missing-expiration.json"));
    assert!(parsed.is_err(), "parser should reject a missing field");
}

#[test]
fn response_schema_requires_every_field() {
    let schema = response_schema();
    let required: Vec<&str> = schema["required"]
        .as_array()
        .expect("required should be an array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(required, ["signal", "confidence", "analysis", "expiration"]);
}

#[test]
fn built_request_matches_schema() {
    let validator = compile_validator("generate-content-request.schema.json");
    let image = encode_chart_image(FileUpload::new(
        "chart.jpg",
        "image/jpeg",
        vec![0xFF, 0xD8, 0xFF, 0xE0],
    ))
    .expect("jpeg upload should encode");

    for timeframe in Timeframe::ALL {
        let request = build_analysis_request(&image, timeframe).expect("request should build");
        let body = serde_json::to_value(&request).expect("request should serialize");
        assert!(
            validator.is_valid(&body),
            "{timeframe} request should validate against schema"
        );
    }
}
