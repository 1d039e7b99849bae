use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{CommandOutput, RemoteHost, SessionError};

/// In-memory stand-in for a remote host.
///
/// Files live in a map keyed by absolute path. Commands are recorded and
/// answered from scripted responses matched by prefix; anything without a
/// response succeeds with empty output, except `systemctl is-active` which
/// reports `active`.
#[derive(Debug)]
pub struct MemoryHost {
    files: RefCell<BTreeMap<String, String>>,
    commands: RefCell<Vec<String>>,
    responses: RefCell<Vec<(String, CommandOutput)>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            commands: RefCell::new(Vec::new()),
            responses: RefCell::new(vec![(
                "systemctl is-active".to_string(),
                CommandOutput::ok("active\n"),
            )]),
        }
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        self
    }

    /// Answer every command starting with `prefix` with `output`.
    /// Later responses take precedence over earlier ones.
    pub fn respond(&self, prefix: &str, output: CommandOutput) {
        self.responses
            .borrow_mut()
            .push((prefix.to_string(), output));
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn files(&self) -> BTreeMap<String, String> {
        self.files.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    /// Whether any recorded command starts with `prefix`.
    pub fn ran(&self, prefix: &str) -> bool {
        self.commands.borrow().iter().any(|c| c.starts_with(prefix))
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    fn missing(path: &str) -> SessionError {
        SessionError::Command {
            command: format!("access {}", path),
            message: "No such file or directory".to_string(),
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteHost for MemoryHost {
    fn exec(&self, command: &str) -> Result<CommandOutput, SessionError> {
        self.commands.borrow_mut().push(command.to_string());
        let output = self
            .responses
            .borrow()
            .iter()
            .rev()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }

    fn read_file(&self, path: &str) -> Result<Option<String>, SessionError> {
        Ok(self.file(path))
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<(), SessionError> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool, SessionError> {
        Ok(self.files.borrow().contains_key(path))
    }

    fn copy_file(&self, from: &str, to: &str) -> Result<(), SessionError> {
        let contents = self.file(from).ok_or_else(|| Self::missing(from))?;
        self.write_file(to, &contents)
    }

    fn rename_file(&self, from: &str, to: &str) -> Result<(), SessionError> {
        let contents = self
            .files
            .borrow_mut()
            .remove(from)
            .ok_or_else(|| Self::missing(from))?;
        self.write_file(to, &contents)
    }

    fn remove_file(&self, path: &str) -> Result<(), SessionError> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscripted_commands_succeed() {
        let host = MemoryHost::new();
        let output = host.exec("chown root:named /etc/named.conf").unwrap();
        assert!(output.success());
        assert!(host.ran("chown"));
    }

    #[test]
    fn later_responses_win() {
        let host = MemoryHost::new();
        host.respond("named-checkconf", CommandOutput::failed(1, "first"));
        host.respond("named-checkconf", CommandOutput::failed(1, "second"));
        let output = host.exec("named-checkconf /etc/named.conf").unwrap();
        assert_eq!(output.stderr, "second");
    }

    #[test]
    fn service_reports_active_by_default() {
        let host = MemoryHost::new();
        let output = host.exec("systemctl is-active named").unwrap();
        assert_eq!(output.stdout.trim(), "active");
    }

    #[test]
    fn file_operations() {
        let host = MemoryHost::new().with_file("/etc/a", "one");
        host.copy_file("/etc/a", "/etc/a.bak").unwrap();
        host.rename_file("/etc/a", "/etc/b").unwrap();

        assert_eq!(host.file("/etc/a"), None);
        assert_eq!(host.file("/etc/b").as_deref(), Some("one"));
        assert_eq!(host.file("/etc/a.bak").as_deref(), Some("one"));
        assert!(host.rename_file("/etc/missing", "/etc/c").is_err());

        host.remove_file("/etc/b").unwrap();
        host.remove_file("/etc/b").unwrap();
        assert!(!host.exists("/etc/b").unwrap());
    }
}
