use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{CommandOutput, RemoteHost, SessionError, shell_quote};

/// ssh exits with 255 when the connection itself fails.
const SSH_CONNECTION_FAILURE: i32 = 255;

const DEFAULT_PORT: u16 = 22;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CONTROL_PERSIST_SECS: u32 = 60;

#[derive(Clone)]
pub enum Credential {
    /// Handed to `sshpass` through the `SSHPASS` environment variable.
    Password(String),
    KeyFile(PathBuf),
    /// Whatever the local ssh client would use (agent, `~/.ssh/config`).
    Agent,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => write!(f, "Password(<redacted>)"),
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            Self::Agent => write!(f, "Agent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            credential: Credential::Agent,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }
}

/// Session driven by the system `ssh` client.
///
/// All commands share one multiplexed master connection (`ControlMaster`),
/// which is torn down by [`SshSession::disconnect`] or on drop.
pub struct SshSession {
    config: ConnectionConfig,
    control_path: PathBuf,
    open: bool,
}

impl SshSession {
    /// Open the master connection and check that the host answers.
    pub fn connect(config: ConnectionConfig) -> Result<Self, SessionError> {
        info!(host = %config.hostname, user = %config.username, "Connecting");

        let mut session = Self {
            // %C expands to a hash of host, port and user
            control_path: std::env::temp_dir().join("dns-manager-%C"),
            config,
            open: true,
        };

        let output = session.run("true", None)?;
        if !output.success() {
            session.open = false;
            return Err(SessionError::Connect {
                host: session.config.hostname.clone(),
                message: output.diagnostic(),
            });
        }

        debug!(host = %session.config.hostname, "Connected");
        Ok(session)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn disconnect(mut self) {
        self.close_master();
    }

    fn close_master(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        let result = self
            .exit_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match result {
            Ok(output) if output.status.success() => {
                debug!(host = %self.config.hostname, "Disconnected")
            }
            Ok(output) => warn!(
                host = %self.config.hostname,
                "Failed to close ssh master: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!(host = %self.config.hostname, "Failed to close ssh master: {}", e),
        }
    }

    /// `ssh -O exit` for the master. `%C` in the control path hashes the
    /// port, so it must match the one the master was opened with.
    fn exit_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p")
            .arg(self.config.port.to_string())
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .args(["-O", "exit"])
            .arg(self.config.destination());
        cmd
    }

    fn build_command(&self, remote_command: &str) -> Command {
        let mut cmd = match &self.config.credential {
            Credential::Password(password) => {
                let mut cmd = Command::new("sshpass");
                cmd.args(["-e", "ssh"]).env("SSHPASS", password);
                cmd
            }
            _ => Command::new("ssh"),
        };

        let timeout = self.config.connect_timeout.as_secs().max(1);
        cmd.arg("-p")
            .arg(self.config.port.to_string())
            .arg("-o")
            .arg(format!("ConnectTimeout={}", timeout))
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .args(["-o", "ControlMaster=auto"])
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-o")
            .arg(format!("ControlPersist={}", CONTROL_PERSIST_SECS));

        match &self.config.credential {
            Credential::Password(_) => {
                cmd.args(["-o", "PubkeyAuthentication=no"]);
            }
            Credential::KeyFile(path) => {
                cmd.arg("-i")
                    .arg(path)
                    .args(["-o", "IdentitiesOnly=yes", "-o", "BatchMode=yes"]);
            }
            Credential::Agent => {
                cmd.args(["-o", "BatchMode=yes"]);
            }
        }

        cmd.arg(self.config.destination())
            .arg("--")
            .arg(remote_command);
        cmd
    }

    fn run(&self, remote_command: &str, input: Option<&str>) -> Result<CommandOutput, SessionError> {
        if !self.open {
            return Err(SessionError::Closed);
        }

        let mut cmd = self.build_command(remote_command);
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let program = cmd.get_program().to_string_lossy().into_owned();
        let mut child = cmd
            .spawn()
            .map_err(|source| SessionError::Spawn { program, source })?;

        let io_error = |e: std::io::Error| SessionError::Command {
            command: remote_command.to_string(),
            message: e.to_string(),
        };

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(io_error)?;
        }

        let output = child.wait_with_output().map_err(io_error)?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn connection_lost(&self, output: &CommandOutput) -> Option<SessionError> {
        (output.status == Some(SSH_CONNECTION_FAILURE)).then(|| SessionError::Connect {
            host: self.config.hostname.clone(),
            message: output.diagnostic(),
        })
    }
}

impl RemoteHost for SshSession {
    fn exec(&self, command: &str) -> Result<CommandOutput, SessionError> {
        debug!(host = %self.config.hostname, "$ {}", command);
        let output = self.run(command, None)?;
        if let Some(err) = self.connection_lost(&output) {
            return Err(err);
        }
        Ok(output)
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, SessionError> {
        if !self.exists(path)? {
            return Ok(None);
        }

        let output = self.exec(&format!("cat {}", shell_quote(path)))?;
        if !output.success() {
            return Err(SessionError::Read {
                path: path.to_string(),
                message: output.diagnostic(),
            });
        }
        Ok(Some(output.stdout))
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<(), SessionError> {
        debug!(host = %self.config.hostname, path, bytes = contents.len(), "Writing file");
        let output = self.run(&format!("cat > {}", shell_quote(path)), Some(contents))?;
        if let Some(err) = self.connection_lost(&output) {
            return Err(err);
        }
        if !output.success() {
            return Err(SessionError::Write {
                path: path.to_string(),
                message: output.diagnostic(),
            });
        }
        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close_master();
    }
}
