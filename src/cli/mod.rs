pub mod bind;
pub mod dnsmasq;
pub mod history;
pub mod init;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use dns_manager::SshSession;
use dns_manager::infrastructure::config::{Config, ConfigStore, ConnectionOverrides};
use dns_manager::infrastructure::journal::Journal;

/// Flags shared by every subcommand.
#[derive(Args)]
pub struct GlobalArgs {
    /// Config file (default: ~/.dns-manager/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Remote host to manage
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// ssh user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// ssh port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// ssh private key
    #[arg(long, global = true)]
    pub identity: Option<PathBuf>,
}

/// Settings resolved once per invocation.
pub struct Context {
    pub config: Config,
    overrides: ConnectionOverrides,
    journal: Option<Journal>,
}

impl Context {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let store = match &args.config {
            Some(path) => ConfigStore::at(path),
            None => ConfigStore::new()?,
        };
        let config = store
            .load()
            .with_context(|| format!("Failed to load {}", store.path().display()))?;

        let journal = match Journal::new() {
            Ok(journal) => Some(journal),
            Err(e) => {
                tracing::warn!(error = %e, "History disabled");
                None
            }
        };

        Ok(Self {
            config,
            overrides: ConnectionOverrides {
                host: args.host.clone(),
                user: args.user.clone(),
                port: args.port,
                identity_file: args.identity.clone(),
            },
            journal,
        })
    }

    pub fn connect(&self) -> Result<SshSession> {
        let connection = self.config.connection.resolve(&self.overrides)?;
        println!(
            "Connecting to {}@{}...",
            connection.username, connection.hostname
        );
        Ok(SshSession::connect(connection)?)
    }

    /// Add a line to the local history. Failures only warn.
    pub fn record(&self, session: &SshSession, message: &str) {
        let Some(journal) = &self.journal else {
            return;
        };
        if let Err(e) = journal.record(&session.config().hostname, message) {
            tracing::warn!(error = %e, "Failed to write history");
        }
    }
}
