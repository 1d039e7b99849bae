//! Staged installs of remote config files.
//!
//! New content is written next to the live file, checked there, and only
//! then moved into place. A live file is copied to `<live>.bak` right
//! before it is replaced, and every replaced file is put back if anything
//! fails afterwards.

use crate::error::DnsConfigError;
use crate::infrastructure::remote::{RemoteHost, shell_quote};
use crate::infrastructure::service;
use crate::infrastructure::validator::Check;

pub(crate) const STAGING_SUFFIX: &str = ".dnsmgr-new";
pub(crate) const BACKUP_SUFFIX: &str = ".bak";

/// Owner, group and mode applied to every installed file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ownership<'a> {
    pub owner: &'a str,
    pub group: &'a str,
    pub mode: &'a str,
}

#[derive(Debug, Clone)]
enum Pending {
    Replace { live: String, staged: String },
    Remove { live: String },
}

/// A live file this transaction touched. `backup` is `None` when the file
/// did not exist before.
#[derive(Debug)]
struct Applied {
    live: String,
    backup: Option<String>,
}

pub(crate) struct StagedInstall<'h, H: RemoteHost + ?Sized> {
    host: &'h H,
    pending: Vec<Pending>,
    applied: Vec<Applied>,
}

impl<'h, H: RemoteHost + ?Sized> StagedInstall<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self {
            host,
            pending: Vec::new(),
            applied: Vec::new(),
        }
    }

    /// Write `contents` to the staging path for `live` and return that path.
    pub fn stage(&mut self, live: &str, contents: &str) -> Result<String, DnsConfigError> {
        let staged = format!("{}{}", live, STAGING_SUFFIX);
        tracing::debug!(path = %staged, "Staging file");
        // Recorded first so a partial write is still cleaned up.
        self.pending.push(Pending::Replace {
            live: live.to_string(),
            staged: staged.clone(),
        });
        self.host.write_file(&staged, contents)?;
        Ok(staged)
    }

    /// Schedule removal of a live file.
    pub fn remove(&mut self, live: &str) {
        self.pending.push(Pending::Remove {
            live: live.to_string(),
        });
    }

    pub fn check(&self, check: &Check) -> Result<(), DnsConfigError> {
        check.run(self.host)?;
        Ok(())
    }

    /// Back up, move and label every pending file, in staging order.
    ///
    /// An entry leaves the queue only once it is fully applied, so after a
    /// failure `rollback` still sees every staged file that was not moved.
    pub fn commit(&mut self, ownership: Ownership<'_>) -> Result<(), DnsConfigError> {
        while let Some(next) = self.pending.first().cloned() {
            self.apply(next, ownership)?;
            self.pending.remove(0);
        }
        Ok(())
    }

    fn apply(&mut self, pending: Pending, ownership: Ownership<'_>) -> Result<(), DnsConfigError> {
        match pending {
            Pending::Replace { live, staged } => {
                let backup = self.backup(&live)?;
                self.applied.push(Applied {
                    live: live.clone(),
                    backup,
                });
                self.host.rename_file(&staged, &live)?;
                self.apply_ownership(&live, ownership)?;
                tracing::info!(path = %live, "Installed");
            }
            Pending::Remove { live } => {
                let Some(backup) = self.backup(&live)? else {
                    return Ok(());
                };
                self.applied.push(Applied {
                    live: live.clone(),
                    backup: Some(backup),
                });
                self.host.remove_file(&live)?;
                tracing::info!(path = %live, "Removed");
            }
        }
        Ok(())
    }

    /// Drop staged files and put back every live file this transaction
    /// touched, newest first. Returns whether any live file changed.
    pub fn rollback(&mut self) -> bool {
        for pending in std::mem::take(&mut self.pending) {
            if let Pending::Replace { staged, .. } = pending
                && let Err(e) = self.host.remove_file(&staged)
            {
                tracing::warn!(path = %staged, error = %e, "Failed to remove staged file");
            }
        }

        let touched = !self.applied.is_empty();
        while let Some(applied) = self.applied.pop() {
            let result = match &applied.backup {
                Some(backup) => self.host.copy_file(backup, &applied.live),
                None => self.host.remove_file(&applied.live),
            };
            match result {
                Ok(()) => tracing::warn!(path = %applied.live, "Restored previous version"),
                Err(e) => {
                    tracing::warn!(path = %applied.live, error = %e, "Failed to restore previous version")
                }
            }
        }
        touched
    }

    fn backup(&self, live: &str) -> Result<Option<String>, DnsConfigError> {
        if !self.host.exists(live)? {
            return Ok(None);
        }
        let backup = format!("{}{}", live, BACKUP_SUFFIX);
        self.host.copy_file(live, &backup)?;
        Ok(Some(backup))
    }

    fn apply_ownership(&self, path: &str, ownership: Ownership<'_>) -> Result<(), DnsConfigError> {
        let quoted = shell_quote(path);
        self.host.exec_checked(&format!(
            "chown {}:{} {}",
            shell_quote(ownership.owner),
            shell_quote(ownership.group),
            quoted
        ))?;
        self.host
            .exec_checked(&format!("chmod {} {}", shell_quote(ownership.mode), quoted))?;

        // SELinux may be disabled; a missing restorecon must not block the install.
        let output = self.host.exec(&format!("restorecon -v {}", quoted))?;
        if !output.success() {
            tracing::warn!(path, diagnostic = %output.diagnostic(), "restorecon failed");
        }
        Ok(())
    }
}

/// Run `prepare` to stage and check files, then install them, run `verify`
/// against the live files and reload `unit`.
///
/// A failure inside `prepare` only discards staged files. A failure after
/// the first live file moved restores every backup and makes one attempt
/// to restart `unit` on the old configuration. The first error is
/// returned either way.
pub(crate) fn install_and_reload<H, P, V>(
    host: &H,
    unit: &str,
    ownership: Ownership<'_>,
    prepare: P,
    verify: V,
) -> Result<(), DnsConfigError>
where
    H: RemoteHost + ?Sized,
    P: FnOnce(&mut StagedInstall<'_, H>) -> Result<(), DnsConfigError>,
    V: FnOnce(&H) -> Result<(), DnsConfigError>,
{
    let mut tx = StagedInstall::new(host);

    if let Err(e) = prepare(&mut tx) {
        tx.rollback();
        return Err(e);
    }

    let result = tx
        .commit(ownership)
        .and_then(|()| verify(host))
        .and_then(|()| service::reload(host, unit).map_err(DnsConfigError::from));

    if let Err(e) = result {
        tracing::warn!(unit, error = %e, "Rolling back");
        if tx.rollback()
            && let Err(restart_err) = service::restart(host, unit)
        {
            tracing::warn!(unit, error = %restart_err, "Restart after rollback failed");
        }
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::{CommandOutput, MemoryHost};

    const OWNERSHIP: Ownership<'static> = Ownership {
        owner: "root",
        group: "named",
        mode: "640",
    };

    #[test]
    fn commit_backs_up_and_moves() {
        let host = MemoryHost::new().with_file("/etc/a.conf", "old\n");
        let mut tx = StagedInstall::new(&host);
        tx.stage("/etc/a.conf", "new\n").unwrap();
        assert_eq!(host.file("/etc/a.conf.dnsmgr-new").as_deref(), Some("new\n"));

        tx.commit(OWNERSHIP).unwrap();

        assert_eq!(host.file("/etc/a.conf").as_deref(), Some("new\n"));
        assert_eq!(host.file("/etc/a.conf.bak").as_deref(), Some("old\n"));
        assert!(host.file("/etc/a.conf.dnsmgr-new").is_none());
        assert!(host.ran("chown root:named /etc/a.conf"));
        assert!(host.ran("chmod 640 /etc/a.conf"));
        assert!(host.ran("restorecon -v /etc/a.conf"));
    }

    #[test]
    fn rollback_restores_backups_and_drops_new_files() {
        let host = MemoryHost::new().with_file("/etc/a.conf", "old\n");
        let mut tx = StagedInstall::new(&host);
        tx.stage("/etc/a.conf", "new\n").unwrap();
        tx.stage("/etc/b.conf", "created\n").unwrap();
        tx.commit(OWNERSHIP).unwrap();

        assert!(tx.rollback());
        assert_eq!(host.file("/etc/a.conf").as_deref(), Some("old\n"));
        assert!(host.file("/etc/b.conf").is_none());
    }

    #[test]
    fn removed_file_comes_back_on_rollback() {
        let host = MemoryHost::new().with_file("/var/named/db.x", "zone\n");
        let mut tx = StagedInstall::new(&host);
        tx.remove("/var/named/db.x");
        tx.remove("/var/named/db.missing");
        tx.commit(OWNERSHIP).unwrap();
        assert!(host.file("/var/named/db.x").is_none());

        tx.rollback();
        assert_eq!(host.file("/var/named/db.x").as_deref(), Some("zone\n"));
    }

    #[test]
    fn failed_commit_leaves_no_staged_files() {
        let host = MemoryHost::new().with_file("/etc/a.conf", "old\n");
        host.respond("chown", CommandOutput::failed(1, "chown: invalid group: 'root:named'"));
        let mut tx = StagedInstall::new(&host);
        tx.stage("/etc/a.conf", "new\n").unwrap();
        tx.stage("/etc/b.conf", "created\n").unwrap();

        assert!(tx.commit(OWNERSHIP).is_err());
        tx.rollback();

        let files = host.files();
        assert!(files.keys().all(|path| !path.ends_with(STAGING_SUFFIX)));
        assert_eq!(host.file("/etc/a.conf").as_deref(), Some("old\n"));
        assert!(host.file("/etc/b.conf").is_none());
    }

    #[test]
    fn restorecon_failure_is_not_fatal() {
        let host = MemoryHost::new();
        host.respond("restorecon", CommandOutput::failed(127, "restorecon: command not found"));
        let mut tx = StagedInstall::new(&host);
        tx.stage("/etc/a.conf", "new\n").unwrap();
        assert!(tx.commit(OWNERSHIP).is_ok());
    }

    #[test]
    fn failed_check_leaves_live_file_alone() {
        let host = MemoryHost::new().with_file("/etc/a.conf", "old\n");
        host.respond("named-checkconf", CommandOutput::failed(1, "syntax error"));
        let before = host.files();

        let result = install_and_reload(
            &host,
            "named",
            OWNERSHIP,
            |tx| {
                let staged = tx.stage("/etc/a.conf", "broken\n")?;
                tx.check(&Check::named_conf(staged))
            },
            |_| Ok(()),
        );

        assert!(matches!(result, Err(DnsConfigError::Validation(_))));
        assert_eq!(host.files(), before);
        assert!(!host.ran("systemctl restart"));
    }

    #[test]
    fn failed_verify_restores_and_restarts() {
        let host = MemoryHost::new().with_file("/etc/a.conf", "old\n");

        let result = install_and_reload(
            &host,
            "named",
            OWNERSHIP,
            |tx| tx.stage("/etc/a.conf", "new\n").map(|_| ()),
            |_| Err(DnsConfigError::Address("verify".into())),
        );

        assert!(result.is_err());
        assert_eq!(host.file("/etc/a.conf").as_deref(), Some("old\n"));
        assert!(host.ran("systemctl restart named"));
    }
}
