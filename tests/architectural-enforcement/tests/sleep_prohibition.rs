//! Integration Test: Sleep Prohibition
//!
//! **Policy**: production code MUST NOT call `std::thread::sleep`.
//! Pacing (status reveal, narration, render delay) goes through tokio timers
//! so it can be cancelled and so paused-clock tests stay deterministic.

use architectural_enforcement::scan_production;

fn sleep_rule(_lines: &[&str], _idx: usize, code: &str) -> Option<&'static str> {
    if code.contains("thread::sleep") {
        Some("Blocking sleep")
    } else {
        None
    }
}

#[test]
fn test_no_thread_sleep_in_production_code() {
    let violations = scan_production(sleep_rule);

    if !violations.is_empty() {
        eprintln!("\n❌ std::thread::sleep found in production code!");
        eprintln!("Use tokio::time::sleep / interval / sleep_until instead.\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!("\nFound {} sleep violation(s).", violations.len());
    }
}

#[test]
fn test_rule_matches_qualified_and_imported_sleep() {
    assert!(sleep_rule(&[], 0, "std::thread::sleep(d);").is_some());
    assert!(sleep_rule(&[], 0, "thread::sleep(d);").is_some());
    assert!(sleep_rule(&[], 0, "tokio::time::sleep(d).await;").is_none());
}
