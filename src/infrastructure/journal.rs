use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Local, append-only record of the operations run against remote hosts.
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Journal at `~/.dns-manager/history.log`.
    pub fn new() -> Result<Self> {
        let path = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".dns-manager")
            .join("history.log");
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one line: `[timestamp] host: message`.
    pub fn record(&self, host: &str, message: &str) -> Result<()> {
        self.ensure_dir()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open history file")?;

        let timestamp = humantime::format_rfc3339_seconds(SystemTime::now());
        writeln!(file, "[{}] {}: {}", timestamp, host, message)?;
        Ok(())
    }

    /// Last `lines` entries, oldest first. With `host`, only entries
    /// recorded against that host count.
    pub fn tail(&self, lines: usize, host: Option<&str>) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read history file")?;

        let entries: Vec<&str> = content
            .lines()
            .filter(|line| host.is_none_or(|host| entry_host(line) == Some(host)))
            .collect();
        let start = entries.len().saturating_sub(lines);
        Ok(entries[start..].join("\n"))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to clear history file")?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Host part of a `[timestamp] host: message` line.
fn entry_host(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once("] ")?;
    rest.split_once(": ").map(|(host, _)| host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_and_tail() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("logs").join("history.log"));

        journal.record("ns1", "configure bind").unwrap();
        journal.record("ns1", "add-zone example.com").unwrap();
        journal.record("ns2", "delete-zone example.com").unwrap();

        let tail = journal.tail(2, None).unwrap();
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("ns1: add-zone example.com"));
        assert!(lines[1].starts_with('['));
        assert!(lines[1].ends_with("ns2: delete-zone example.com"));
    }

    #[test]
    fn tail_can_follow_one_host() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("history.log"));

        journal.record("ns1", "configure bind").unwrap();
        journal.record("ns2", "configure dnsmasq").unwrap();
        journal.record("ns1", "add-zone example.com").unwrap();
        journal.record("ns10", "add-zone other.example").unwrap();

        let tail = journal.tail(10, Some("ns1")).unwrap();
        let lines: Vec<&str> = tail.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("ns1: configure bind"));
        assert!(lines[1].ends_with("ns1: add-zone example.com"));

        assert_eq!(journal.tail(1, Some("ns2")).unwrap().lines().count(), 1);
        assert_eq!(journal.tail(10, Some("ns3")).unwrap(), "");
    }

    #[test]
    fn missing_journal_is_empty() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("history.log"));
        assert_eq!(journal.tail(10, None).unwrap(), "");
        journal.clear().unwrap();
    }

    #[test]
    fn clear_removes_entries() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::at(dir.path().join("history.log"));
        journal.record("ns1", "install bind").unwrap();
        journal.clear().unwrap();
        assert!(!journal.path().exists());
    }
}
