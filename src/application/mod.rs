mod bind_server;
mod dnsmasq_server;
mod transaction;

pub use bind_server::BindServer;
pub use dnsmasq_server::DnsmasqServer;

use std::fmt;

/// Outcome of a single step in a multi-step operation.
///
/// Lets the CLI layer tell work done apart from work found already done.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Success(String),
    Skipped(String),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(msg) => write!(f, "{}", msg),
            Self::Skipped(msg) => write!(f, "Skipped: {}", msg),
        }
    }
}

/// What `delete_zone` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Neither registered nor on disk. Nothing was changed or restarted.
    NotPresent,
}
