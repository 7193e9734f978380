//! footprint - Username Exposure Lookup
//!
//! Terminal front end for the footprint lookup service. Looks a username up
//! on tracked sites and in leaked-credential databases and prints the result.
//!
//! # Usage
//!
//! ```bash
//! # One search, plain text
//! footprint alice
//!
//! # One search, HTML fragment
//! footprint --format html alice > alice.html
//!
//! # Interactive: one username per line, EOF to quit
//! footprint
//!
//! # Check that the backend is reachable
//! footprint --check
//!
//! # Verbose logging
//! RUST_LOG=debug footprint alice
//! ```
//!
//! # Interactive Commands
//!
//! - `:toggle footprint` / `:toggle breaches`: collapse or expand a section
//! - `:quit`: exit
//!
//! # Exit Codes
//!
//! - `0`: search succeeded (or backend reachable)
//! - `1`: search failed or timed out (or backend unreachable)
//! - `2`: empty username

mod surface;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use footprint_core::{
    load_config, load_config_from_path, ChannelSink, ConfigOverrides, HttpLookupBackend,
    LookupBackend, LookupConfig, LookupError, SearchOrchestrator, SectionKind,
};

use surface::{print_updates, OutputFormat};

/// footprint - find where a username shows up and whether it leaked
#[derive(Parser, Debug)]
#[command(name = "footprint")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Username to look up (omit for interactive mode)
    username: Option<String>,

    /// Output format for results
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Lookup service base URL
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Request deadline in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Disable progress narration
    #[arg(long)]
    no_narration: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "FOOTPRINT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Check that the backend is reachable and exit
    #[arg(long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "FOOTPRINT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.backend_url {
            overrides = overrides.with_backend_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            overrides = overrides.with_request_timeout_secs(secs);
        }
        if self.no_narration {
            overrides = overrides.with_narration(false);
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr; stdout only carries rendered results.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(format!(
                "footprint_cli={level},footprint_core={level}"
            ))
        })
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load(args: &Args) -> Result<LookupConfig> {
    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        backend = %config.backend_url,
        timeout_secs = config.request_timeout.as_secs(),
        overlap_policy = %config.overlap_policy,
        "Configuration loaded"
    );
    Ok(config)
}

fn exit_status(outcome: &Result<(), LookupError>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) if e.is_validation() => 2,
        Err(_) => 1,
    }
}

async fn check(backend: &HttpLookupBackend) -> ExitCode {
    let url = backend.base_url().clone();
    if backend.health_check().await {
        info!(url = %url, "Backend reachable");
        ExitCode::SUCCESS
    } else {
        warn!(url = %url, "Backend unreachable");
        ExitCode::from(1)
    }
}

/// Read usernames from stdin until EOF, `:quit` or Ctrl-C
async fn interactive(orchestrator: &SearchOrchestrator<HttpLookupBackend>) -> Result<ExitCode> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();

    loop {
        stderr.write_all(b"username> ").await?;
        stderr.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            ":quit" | ":q" => break,
            command if command.starts_with(":toggle") => {
                let kind = match command.trim_start_matches(":toggle").trim() {
                    "footprint" => SectionKind::Footprint,
                    "breaches" => SectionKind::Breaches,
                    other => {
                        warn!(section = other, "Unknown section");
                        continue;
                    }
                };
                if orchestrator.toggle_section(kind).is_none() {
                    warn!(section = ?kind, "No such section in the current result");
                }
            }
            _ => {
                // already rendered, alerted and logged by the orchestrator
                if let Err(e) = orchestrator.perform_search(&line).await {
                    tracing::debug!(error = %e, "Search ended without a result");
                }
                orchestrator.status().flush().await;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = load(&args)?;
    let backend = HttpLookupBackend::from_config(&config).context("Failed to create backend")?;

    if args.check {
        return Ok(check(&backend).await);
    }

    let (sink, updates) = ChannelSink::channel();
    let printer = tokio::spawn(print_updates(updates, args.format));

    let orchestrator = SearchOrchestrator::new(backend, Arc::new(sink), config);
    orchestrator.attach();

    let code = match args.username {
        Some(ref username) => {
            let outcome = orchestrator.perform_search(username).await.map(|_| ());
            orchestrator.status().flush().await;
            ExitCode::from(exit_status(&outcome))
        }
        None => interactive(&orchestrator).await?,
    };

    // dropping the orchestrator closes the update channel
    drop(orchestrator);
    printer.await.context("Printer task failed")?;

    Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("footprint: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::parse_from([
            "footprint",
            "--backend-url",
            "http://localhost:8080",
            "--timeout-secs",
            "5",
            "--no-narration",
            "alice",
        ]);
        assert_eq!(args.username.as_deref(), Some("alice"));

        let mut config = LookupConfig::default();
        args.overrides().apply(&mut config);
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, std::time::Duration::from_secs(5));
        assert!(!config.narration);
    }

    #[test]
    fn test_no_flags_no_overrides() {
        let args = Args::parse_from(["footprint"]);
        assert_eq!(args.username, None);
        assert_eq!(args.format, OutputFormat::Text);

        let mut config = LookupConfig::default();
        args.overrides().apply(&mut config);
        assert_eq!(config.source(), footprint_core::ConfigSource::Default);
    }

    #[test]
    fn test_html_format_flag() {
        let args = Args::parse_from(["footprint", "--format", "html", "bob"]);
        assert_eq!(args.format, OutputFormat::Html);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_status(&Ok(())), 0);
        assert_eq!(exit_status(&Err(LookupError::Validation)), 2);
        assert_eq!(
            exit_status(&Err(LookupError::Timeout {
                after: std::time::Duration::from_secs(40)
            })),
            1
        );
    }
}
