//! Publishes the workspace `VERSION` file as `CHART_SIGNAL_VERSION`.

use std::path::Path;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir");
    let version_path = Path::new(&manifest_dir).join("../../VERSION");
    println!("cargo:rerun-if-changed={}", version_path.display());

    let version = match std::fs::read_to_string(&version_path) {
        Ok(raw) => raw.trim().to_string(),
        Err(_) => std::env::var("CARGO_PKG_VERSION").expect("package version"),
    };

    let well_formed = !version.is_empty()
        && version
            .split(['.', '-'])
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(well_formed, "VERSION must look like 1.2.3, got {version:?}");

    println!("cargo:rustc-env=CHART_SIGNAL_VERSION={version}");
}
