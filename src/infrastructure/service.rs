//! systemd units and rpm packages on the remote host.

use thiserror::Error;

use crate::infrastructure::remote::{RemoteHost, SessionError, shell_quote};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Failed to restart {unit}: {diagnostic}")]
    Restart { unit: String, diagnostic: String },

    #[error("{unit} is not running after restart (state: {state})")]
    Inactive { unit: String, state: String },

    #[error("Failed to enable {unit}: {diagnostic}")]
    Enable { unit: String, diagnostic: String },

    #[error("Failed to install {packages}: {diagnostic}")]
    Install {
        packages: String,
        diagnostic: String,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn restart<H: RemoteHost + ?Sized>(host: &H, unit: &str) -> Result<(), ServiceError> {
    tracing::info!(unit, "Restarting service");
    let output = host.exec(&format!("systemctl restart {}", shell_quote(unit)))?;
    if !output.success() {
        return Err(ServiceError::Restart {
            unit: unit.to_string(),
            diagnostic: output.diagnostic(),
        });
    }
    Ok(())
}

/// `systemctl is-active` must print exactly `active`.
pub fn ensure_active<H: RemoteHost + ?Sized>(host: &H, unit: &str) -> Result<(), ServiceError> {
    let output = host.exec(&format!("systemctl is-active {}", shell_quote(unit)))?;
    let state = output.stdout.trim();
    if state == "active" {
        return Ok(());
    }

    Err(ServiceError::Inactive {
        unit: unit.to_string(),
        state: if state.is_empty() {
            output.diagnostic()
        } else {
            state.to_string()
        },
    })
}

/// Restart and confirm the unit came back up.
pub fn reload<H: RemoteHost + ?Sized>(host: &H, unit: &str) -> Result<(), ServiceError> {
    restart(host, unit)?;
    ensure_active(host, unit)
}

pub fn enable_and_start<H: RemoteHost + ?Sized>(host: &H, unit: &str) -> Result<(), ServiceError> {
    for action in ["enable", "start"] {
        let output = host.exec(&format!("systemctl {} {}", action, shell_quote(unit)))?;
        if !output.success() {
            return Err(ServiceError::Enable {
                unit: unit.to_string(),
                diagnostic: output.diagnostic(),
            });
        }
    }
    ensure_active(host, unit)
}

pub fn is_installed<H: RemoteHost + ?Sized>(host: &H, package: &str) -> Result<bool, ServiceError> {
    Ok(host
        .exec(&format!("rpm -q {}", shell_quote(package)))?
        .success())
}

pub fn install_packages<H: RemoteHost + ?Sized>(
    host: &H,
    packages: &[&str],
) -> Result<(), ServiceError> {
    let list = packages
        .iter()
        .map(|p| shell_quote(p))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(packages = %list, "Installing packages");

    let output = host.exec(&format!("yum -y install {}", list))?;
    if !output.success() {
        return Err(ServiceError::Install {
            packages: list,
            diagnostic: output.diagnostic(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::{CommandOutput, MemoryHost};

    #[test]
    fn reload_restarts_then_checks_state() {
        let host = MemoryHost::new();
        reload(&host, "named").unwrap();
        assert_eq!(
            host.commands(),
            ["systemctl restart named", "systemctl is-active named"]
        );
    }

    #[test]
    fn failed_state_is_reported() {
        let host = MemoryHost::new();
        host.respond(
            "systemctl is-active",
            CommandOutput {
                status: Some(3),
                stdout: "failed\n".into(),
                stderr: String::new(),
            },
        );

        match reload(&host, "named").unwrap_err() {
            ServiceError::Inactive { unit, state } => {
                assert_eq!(unit, "named");
                assert_eq!(state, "failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn restart_failure_skips_state_check() {
        let host = MemoryHost::new();
        host.respond(
            "systemctl restart",
            CommandOutput::failed(1, "Job for named.service failed"),
        );

        assert!(matches!(
            reload(&host, "named"),
            Err(ServiceError::Restart { .. })
        ));
        assert!(!host.ran("systemctl is-active"));
    }

    #[test]
    fn packages_are_installed_in_one_transaction() {
        let host = MemoryHost::new();
        host.respond("rpm -q", CommandOutput::failed(1, "package bind is not installed"));

        assert!(!is_installed(&host, "bind").unwrap());
        install_packages(&host, &["bind", "bind-utils"]).unwrap();
        assert!(host.ran("yum -y install bind bind-utils"));
    }
}
