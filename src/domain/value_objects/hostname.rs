use std::fmt;

use super::label::{LabelError, MAX_NAME_LEN, check_labels};

/// Target of a CNAME or PTR record.
///
/// Either relative to the zone (`mail`) or fully qualified
/// (`mail.example.com` / `mail.example.com.`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname(String);

#[derive(Debug, thiserror::Error)]
pub enum HostnameError {
    #[error("Hostname is empty")]
    Empty,

    #[error("Hostname too long ({0} characters, max 253)")]
    TooLong(usize),

    #[error("'{name}' is not a valid hostname: {source}")]
    InvalidLabel { name: String, source: LabelError },
}

impl Hostname {
    pub fn new(name: impl Into<String>) -> Result<Self, HostnameError> {
        let name = name.into().trim().to_lowercase();
        let bare = name.strip_suffix('.').unwrap_or(&name);

        if bare.is_empty() {
            return Err(HostnameError::Empty);
        }
        if bare.len() > MAX_NAME_LEN {
            return Err(HostnameError::TooLong(bare.len()));
        }

        check_labels(bare).map_err(|source| HostnameError::InvalidLabel {
            name: name.clone(),
            source,
        })?;

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form written into zone files.
    ///
    /// A dotted name is treated as fully qualified and gets the trailing
    /// dot; a single label stays relative to the zone origin.
    pub fn zone_file_form(&self) -> String {
        if self.0.contains('.') && !self.0.ends_with('.') {
            format!("{}.", self.0)
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
