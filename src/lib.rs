//! Configure BIND and dnsmasq on remote CentOS-family hosts over ssh.
//!
//! A controller ([`BindServer`], [`DnsmasqServer`]) owns one
//! [`RemoteHost`] session, renders config files from typed settings, checks
//! them with the daemon's own checker, installs them with a backup and
//! restarts the service.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{BindServer, DeleteOutcome, DnsmasqServer, StepOutcome};
pub use error::DnsConfigError;
pub use infrastructure::remote::{
    CommandOutput, ConnectionConfig, Credential, MemoryHost, RemoteHost, SessionError, SshSession,
};
