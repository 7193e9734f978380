//! Integration Test: Core / Surface Separation
//!
//! **Policy**: `footprint-core` never depends on a surface. Argument parsing,
//! log subscribers and terminal output belong to `footprint-cli`; the core
//! talks to surfaces only through `ViewSink`.

use std::fs;

use architectural_enforcement::{production_lines, rust_files, workspace_root};

const SURFACE_CRATES: &[&str] = &["clap", "tracing-subscriber", "anyhow", "crossterm", "ratatui"];

#[test]
fn test_core_manifest_has_no_surface_dependencies() {
    let manifest = workspace_root().join("footprint/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).expect("core manifest readable");

    let offending: Vec<&str> = content
        .lines()
        .filter_map(|line| {
            let name = line.split('=').next()?.trim();
            SURFACE_CRATES.contains(&name).then_some(name)
        })
        .collect();

    assert!(
        offending.is_empty(),
        "footprint-core depends on surface crates: {offending:?}"
    );
}

#[test]
fn test_core_source_does_not_print() {
    let mut violations = Vec::new();
    for file in rust_files(&workspace_root().join("footprint/core/src")) {
        let content = fs::read_to_string(&file).expect("source readable");
        for (number, code, full) in production_lines(&content) {
            if code.contains("println!") || code.contains("eprintln!") {
                violations.push(format!("{}:{} - {}", file.display(), number, full.trim()));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "footprint-core writes to the terminal directly:\n{}",
        violations.join("\n")
    );
}
