use std::fmt;
use std::str::FromStr;

use super::label::{LabelError, MAX_NAME_LEN, check_labels};

/// A zone apex such as `example.com` or `1.168.192.in-addr.arpa`.
///
/// Stored lowercased and without the trailing root dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneName(String);

#[derive(Debug, thiserror::Error)]
pub enum ZoneNameError {
    #[error("Zone name is empty")]
    Empty,

    #[error("Zone name too long ({0} characters, max 253)")]
    TooLong(usize),

    #[error("Zone name '{name}' is not a valid label sequence: {source}")]
    InvalidLabel { name: String, source: LabelError },
}

impl ZoneName {
    pub fn new(name: impl Into<String>) -> Result<Self, ZoneNameError> {
        let name = name.into().trim().to_lowercase();
        let name = name.strip_suffix('.').unwrap_or(&name).to_string();

        if name.is_empty() {
            return Err(ZoneNameError::Empty);
        }

        if name.len() > MAX_NAME_LEN {
            return Err(ZoneNameError::TooLong(name.len()));
        }

        check_labels(&name).map_err(|source| ZoneNameError::InvalidLabel {
            name: name.clone(),
            source,
        })?;

        Ok(Self(name))
    }

    /// Skip validation for names built from known-good parts.
    pub(crate) fn new_unchecked(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully-qualified form with the trailing dot, as used in zone files.
    pub fn fqdn(&self) -> String {
        format!("{}.", self.0)
    }

    pub fn is_reverse(&self) -> bool {
        self.0.ends_with(".in-addr.arpa")
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZoneName {
    type Err = ZoneNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for ZoneName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ZoneName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ZoneName::new(s).map_err(serde::de::Error::custom)
    }
}
