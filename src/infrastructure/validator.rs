//! Syntax checks run on staged files before they are installed.

use thiserror::Error;

use crate::domain::ZoneName;
use crate::infrastructure::remote::{RemoteHost, SessionError, shell_quote};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{checker} rejected {path}:\n{diagnostic}")]
    Rejected {
        checker: &'static str,
        path: String,
        diagnostic: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A daemon-provided checker and the file it checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// `named-checkconf FILE`
    NamedConf { path: String },
    /// `named-checkzone ZONE FILE`
    Zone { zone: ZoneName, path: String },
    /// `dnsmasq --test --conf-file=FILE`
    Dnsmasq { path: String },
}

impl Check {
    pub fn named_conf(path: impl Into<String>) -> Self {
        Self::NamedConf { path: path.into() }
    }

    pub fn zone(zone: &ZoneName, path: impl Into<String>) -> Self {
        Self::Zone {
            zone: zone.clone(),
            path: path.into(),
        }
    }

    pub fn dnsmasq(path: impl Into<String>) -> Self {
        Self::Dnsmasq { path: path.into() }
    }

    pub fn checker(&self) -> &'static str {
        match self {
            Self::NamedConf { .. } => "named-checkconf",
            Self::Zone { .. } => "named-checkzone",
            Self::Dnsmasq { .. } => "dnsmasq --test",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::NamedConf { path } | Self::Zone { path, .. } | Self::Dnsmasq { path } => path,
        }
    }

    pub fn command_line(&self) -> String {
        match self {
            Self::NamedConf { path } => format!("named-checkconf {}", shell_quote(path)),
            Self::Zone { zone, path } => format!(
                "named-checkzone {} {}",
                shell_quote(zone.as_str()),
                shell_quote(path)
            ),
            Self::Dnsmasq { path } => {
                format!("dnsmasq --test --conf-file={}", shell_quote(path))
            }
        }
    }

    /// Run the checker. Any non-zero exit rejects the file.
    pub fn run<H: RemoteHost + ?Sized>(&self, host: &H) -> Result<(), ValidationError> {
        let output = host.exec(&self.command_line())?;
        if output.success() {
            tracing::debug!(checker = self.checker(), path = self.path(), "Check passed");
            return Ok(());
        }

        Err(ValidationError::Rejected {
            checker: self.checker(),
            path: self.path().to_string(),
            diagnostic: output.diagnostic(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::{CommandOutput, MemoryHost};

    #[test]
    fn command_lines() {
        let zone = ZoneName::new("example.com").unwrap();
        assert_eq!(
            Check::zone(&zone, "/var/named/db.example.com.dnsmgr-new").command_line(),
            "named-checkzone example.com /var/named/db.example.com.dnsmgr-new"
        );
        assert_eq!(
            Check::named_conf("/etc/named.conf").command_line(),
            "named-checkconf /etc/named.conf"
        );
        assert_eq!(
            Check::dnsmasq("/etc/dnsmasq.conf").command_line(),
            "dnsmasq --test --conf-file=/etc/dnsmasq.conf"
        );
    }

    #[test]
    fn non_zero_exit_carries_diagnostic() {
        let host = MemoryHost::new();
        host.respond(
            "named-checkzone",
            CommandOutput {
                status: Some(1),
                stdout: "zone example.com/IN: loading from master file failed\n".into(),
                stderr: "dns_master_load: unexpected end of input\n".into(),
            },
        );

        let zone = ZoneName::new("example.com").unwrap();
        let err = Check::zone(&zone, "/tmp/zone").run(&host).unwrap_err();
        match err {
            ValidationError::Rejected {
                checker,
                diagnostic,
                ..
            } => {
                assert_eq!(checker, "named-checkzone");
                assert!(diagnostic.contains("unexpected end of input"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_exit_passes() {
        let host = MemoryHost::new();
        host.respond("named-checkconf", CommandOutput::ok(""));
        assert!(Check::named_conf("/etc/named.conf").run(&host).is_ok());
    }
}
