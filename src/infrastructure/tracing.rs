use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output destination for tracing
pub enum TracingOutput {
    /// Human-readable output on stderr, leaving stdout for command results
    Stderr,
    /// Append to a log file
    File(PathBuf),
}

/// Initialize tracing based on configuration
/// Priority: DNS_MANAGER_LOG env > verbose flag > default (info)
pub fn init_tracing(verbose: bool, output: TracingOutput) -> Result<()> {
    let filter = EnvFilter::try_from_env("DNS_MANAGER_LOG").unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("dns_manager={}", level))
    });

    match output {
        TracingOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
        TracingOutput::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(file),
                )
                .init();
        }
    }
    Ok(())
}
