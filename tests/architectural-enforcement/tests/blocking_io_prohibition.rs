//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async code in the footprint crates MUST NOT block the runtime.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::io`, async `reqwest`.
//!
//! Blocking calls are tolerated in plain `fn`s that run before or outside the
//! runtime (config loading, logging setup) and in test modules.

use architectural_enforcement::{is_in_async_function, scan_production, Violation};

fn blocking_io_rule(lines: &[&str], idx: usize, code: &str) -> Option<&'static str> {
    if code.contains("reqwest::blocking") {
        return Some("Blocking HTTP client");
    }

    if !is_in_async_function(lines, idx) {
        return None;
    }

    if code.contains("std::fs::") {
        Some("Blocking file I/O in async")
    } else if code.contains("std::net::") {
        Some("Blocking network I/O in async")
    } else if code.contains("std::process::Command") {
        Some("Blocking process I/O in async")
    } else if code.contains("std::io::stdin()") || code.contains("std::io::stdout()") {
        Some("Blocking stdin/stdout in async")
    } else {
        None
    }
}

fn report(violations: &[Violation], headline: &str) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {headline}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s) in production code.",
        violations.len()
    );
}

#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = scan_production(blocking_io_rule);
    report(&violations, "Blocking I/O calls found in async code!");
}

#[test]
fn test_rule_flags_std_fs_in_async_fn() {
    let lines = vec![
        "async fn bad() {",
        "    let s = std::fs::read_to_string(\"x\");",
        "}",
    ];
    assert_eq!(
        blocking_io_rule(&lines, 1, lines[1]),
        Some("Blocking file I/O in async")
    );
}

#[test]
fn test_rule_allows_std_fs_in_sync_fn() {
    let lines = vec![
        "pub fn load_config() {",
        "    let s = std::fs::read_to_string(\"x\");",
        "}",
    ];
    assert_eq!(blocking_io_rule(&lines, 1, lines[1]), None);
}

#[test]
fn test_rule_flags_blocking_reqwest_anywhere() {
    let lines = vec!["fn f() {", "    let c = reqwest::blocking::Client::new();", "}"];
    assert_eq!(
        blocking_io_rule(&lines, 1, lines[1]),
        Some("Blocking HTTP client")
    );
}
