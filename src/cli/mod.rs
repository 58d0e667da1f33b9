use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkguard::{Validator, load_config};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "linkguard")]
#[command(about = "Validate, vet and normalize URLs for link shortening")]
#[command(version = linkguard::VERSION)]
pub struct Cli {
    /// JSON validator config (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run URLs through the full validator and print each verdict
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the canonical form of each URL
    Normalize {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Apply the best-effort phishing heuristic to each URL
    Safe {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let validator =
        Validator::from_config(&config).context("Failed to build validator from config")?;
    debug!(
        "validator ready: {} blocked hosts, {} blocked patterns",
        validator.blocked_host_count(),
        validator.blocked_pattern_count()
    );

    let stdout = std::io::stdout();
    let all_passed = execute(&validator, &cli.command, &mut stdout.lock())?;
    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print one line per URL. Returns whether every URL passed.
fn execute(validator: &Validator, command: &Commands, out: &mut impl Write) -> Result<bool> {
    let mut all_passed = true;
    match command {
        Commands::Check { urls } => {
            for url in urls {
                match validator.validate_with_reason(url) {
                    Ok(()) => writeln!(out, "{}\tvalid", url)?,
                    Err(reason) => {
                        all_passed = false;
                        writeln!(out, "{}\tinvalid: {}", url, reason)?;
                    }
                }
            }
        }
        Commands::Normalize { urls } => {
            for url in urls {
                match validator.normalize_url(url) {
                    Ok(canonical) => writeln!(out, "{}", canonical)?,
                    Err(e) => {
                        all_passed = false;
                        writeln!(out, "{}\terror: {}", url, e)?;
                    }
                }
            }
        }
        Commands::Safe { urls } => {
            for url in urls {
                let safe = validator.is_safe(url);
                all_passed &= safe;
                writeln!(out, "{}\t{}", url, if safe { "safe" } else { "suspicious" })?;
            }
        }
    }
    Ok(all_passed)
}
