//! Architectural Enforcement
//!
//! Source scanners shared by the integration tests in `tests/`:
//! - No blocking I/O inside async code
//! - No blocking sleeps in the core
//! - The core stays free of surface crates
//!
//! Test modules (everything after `#[cfg(test)]`) are not scanned.

use std::fs;
use std::path::{Path, PathBuf};

/// One rule broken on one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the line lives in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Rule that was broken
    pub rule: &'static str,
    /// Offending source, trimmed
    pub source: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.rule,
            self.source
        )
    }
}

/// Workspace root, derived from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Production source directories of the footprint crates
pub fn production_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    vec![
        root.join("footprint/core/src"),
        root.join("footprint/cli/src"),
    ]
}

/// Every `.rs` file under `dir`
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Production lines of a file: test modules and comments stripped
///
/// Yields `(line_number, code_part, full_line)`.
pub fn production_lines(content: &str) -> Vec<(usize, &str, &str)> {
    let mut lines = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim_start().starts_with("#[cfg(test)]") {
            break;
        }
        let code_part = line.split("//").next().unwrap_or(line);
        lines.push((idx + 1, code_part, line));
    }
    lines
}

/// Check if the line at `current_idx` sits in an `async fn` or async block
pub fn is_in_async_function(lines: &[&str], current_idx: usize) -> bool {
    for i in (0..=current_idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") || line.contains("async move") || line.ends_with("async {") {
            return true;
        }

        if is_fn_signature(line) {
            return false;
        }

        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return false;
        }
    }
    false
}

fn is_fn_signature(line: &str) -> bool {
    let line = line
        .trim_start_matches("pub(crate) ")
        .trim_start_matches("pub ");
    line.starts_with("fn ") || line.starts_with("const fn ")
}

/// Scan `content` with `rule`, collecting violations for `path`
///
/// `rule` receives all lines of the file and the index under inspection and
/// returns the rule name when the line breaks it.
pub fn scan_source<F>(path: &Path, content: &str, rule: F) -> Vec<Violation>
where
    F: Fn(&[&str], usize, &str) -> Option<&'static str>,
{
    let all: Vec<&str> = content.lines().collect();
    production_lines(content)
        .into_iter()
        .filter_map(|(number, code, full)| {
            rule(&all, number - 1, code).map(|name| Violation {
                path: path.to_path_buf(),
                line: number,
                rule: name,
                source: full.trim().to_string(),
            })
        })
        .collect()
}

/// Scan every production file with `rule`
pub fn scan_production<F>(rule: F) -> Vec<Violation>
where
    F: Fn(&[&str], usize, &str) -> Option<&'static str> + Copy,
{
    let mut violations = Vec::new();
    for dir in production_dirs() {
        for file in rust_files(&dir) {
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            violations.extend(scan_source(&file, &content, rule));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_function_detection() {
        let code = vec![
            "async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
        ];
        assert!(is_in_async_function(&code, 1));
    }

    #[test]
    fn test_sync_function_detection() {
        let code = vec![
            "pub fn load() {",
            "    let contents = std::fs::read_to_string(\"config.toml\")?;",
            "}",
        ];
        assert!(!is_in_async_function(&code, 1));
    }

    #[test]
    fn test_async_block_detection() {
        let code = vec![
            "fn spawn_it() {",
            "    tokio::spawn(async move {",
            "        std::thread::sleep(d);",
            "    });",
            "}",
        ];
        assert!(is_in_async_function(&code, 2));
    }

    #[test]
    fn test_test_module_is_skipped() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n";
        let lines = production_lines(content);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, 1);
    }

    #[test]
    fn test_comments_are_stripped() {
        let lines = production_lines("let x = 1; // std::fs::read\n");
        assert!(!lines[0].1.contains("std::fs"));
    }

    #[test]
    fn test_production_dirs_exist() {
        for dir in production_dirs() {
            assert!(dir.exists(), "missing {}", dir.display());
        }
    }
}
