//! Remote shell capability.
//!
//! Everything the controllers do to a host goes through [`RemoteHost`]:
//! run a command, read a file, write a file. The file helpers (`exists`,
//! `copy_file`, `rename_file`, `remove_file`) default to plain shell
//! commands so a transport only has to provide the three primitives.

use thiserror::Error;

mod memory;
mod ssh;

pub use memory::MemoryHost;
pub use ssh::{ConnectionConfig, Credential, SshSession};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to connect to {host}: {message}")]
    Connect { host: String, message: String },

    #[error("Remote command `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("Failed to read {path} on remote host: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write {path} on remote host: {message}")]
    Write { path: String, message: String },

    #[error("Session already closed")]
    Closed,
}

/// Exit status and captured output of a remote command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the command was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout and stderr joined, trimmed. Checkers split their messages
    /// across both streams.
    pub fn diagnostic(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => match self.status {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            },
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

pub trait RemoteHost {
    /// Run a shell command on the host and capture its result.
    /// A non-zero exit is not an error at this level.
    fn exec(&self, command: &str) -> Result<CommandOutput, SessionError>;

    /// Read a file, `None` if it does not exist.
    fn read_file(&self, path: &str) -> Result<Option<String>, SessionError>;

    /// Create or truncate a file with the given contents.
    fn write_file(&self, path: &str, contents: &str) -> Result<(), SessionError>;

    fn exists(&self, path: &str) -> Result<bool, SessionError> {
        Ok(self.exec(&format!("test -e {}", shell_quote(path)))?.success())
    }

    /// Copy preserving mode, ownership and SELinux label.
    fn copy_file(&self, from: &str, to: &str) -> Result<(), SessionError> {
        self.exec_checked(&format!("cp -p {} {}", shell_quote(from), shell_quote(to)))
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<(), SessionError> {
        self.exec_checked(&format!("mv -f {} {}", shell_quote(from), shell_quote(to)))
    }

    /// Remove a file. Missing files are not an error.
    fn remove_file(&self, path: &str) -> Result<(), SessionError> {
        self.exec_checked(&format!("rm -f {}", shell_quote(path)))
    }

    /// Run a command and turn a non-zero exit into an error.
    fn exec_checked(&self, command: &str) -> Result<(), SessionError> {
        let output = self.exec(command)?;
        if output.success() {
            Ok(())
        } else {
            Err(SessionError::Command {
                command: command.to_string(),
                message: output.diagnostic(),
            })
        }
    }
}

/// Quote a word for a POSIX shell. Plain paths and names pass through
/// unchanged so logged commands stay readable.
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@%+=,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
