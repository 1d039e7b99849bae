use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

use super::hostname::{Hostname, HostnameError};
use super::label::{LabelError, check_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Cname,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Cname => write!(f, "CNAME"),
        }
    }
}

impl FromStr for RecordType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "CNAME" => Ok(Self::Cname),
            _ => Err(RecordError::UnsupportedType(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Unsupported record type '{0}' (expected A or CNAME)")]
    UnsupportedType(String),

    #[error("Invalid record name '{name}': {source}")]
    InvalidName { name: String, source: LabelError },

    #[error("A record value must be an IPv4 address, got: {0}")]
    InvalidAddress(String),

    #[error("CNAME value is not a valid hostname: {0}")]
    InvalidTarget(#[from] HostnameError),

    #[error("Expected \"NAME TYPE VALUE\", got: {0}")]
    Malformed(String),
}

/// Owner name of a record: `@` for the apex, otherwise labels relative to
/// the zone. The first label may be the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordName(String);

impl RecordName {
    pub fn apex() -> Self {
        Self("@".to_string())
    }

    pub fn new(name: impl Into<String>) -> Result<Self, RecordError> {
        let name = name.into().trim().to_lowercase();
        if name == "@" || name == "*" {
            return Ok(Self(name));
        }

        let rest = name.strip_prefix("*.").unwrap_or(&name);
        if let Err(source) = rest.split('.').try_for_each(check_label) {
            return Err(RecordError::InvalidName { name, source });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_apex(&self) -> bool {
        self.0 == "@"
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Cname(Hostname),
}

/// A single forward-zone resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    name: RecordName,
    data: RecordData,
}

impl Record {
    pub fn a(name: RecordName, address: Ipv4Addr) -> Self {
        Self {
            name,
            data: RecordData::A(address),
        }
    }

    pub fn cname(name: RecordName, target: Hostname) -> Self {
        Self {
            name,
            data: RecordData::Cname(target),
        }
    }

    /// Build a record from its textual parts, checking that the value
    /// has the shape the type requires.
    pub fn new(name: &str, record_type: RecordType, value: &str) -> Result<Self, RecordError> {
        let name = RecordName::new(name)?;
        let value = value.trim();
        match record_type {
            RecordType::A => {
                let address = value
                    .parse::<Ipv4Addr>()
                    .map_err(|_| RecordError::InvalidAddress(value.to_string()))?;
                Ok(Self::a(name, address))
            }
            RecordType::Cname => Ok(Self::cname(name, Hostname::new(value)?)),
        }
    }

    /// Parse from string: "www A 192.168.1.10" or "ftp CNAME www"
    pub fn parse(s: &str) -> Result<Self, RecordError> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [name, record_type, value] = parts.as_slice() else {
            return Err(RecordError::Malformed(s.to_string()));
        };
        Self::new(name, record_type.parse()?, value)
    }

    pub fn name(&self) -> &RecordName {
        &self.name
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }

    pub fn record_type(&self) -> RecordType {
        match self.data {
            RecordData::A(_) => RecordType::A,
            RecordData::Cname(_) => RecordType::Cname,
        }
    }

    /// Value column as written into the zone file.
    pub fn zone_file_value(&self) -> String {
        match &self.data {
            RecordData::A(address) => address.to_string(),
            RecordData::Cname(target) => target.zone_file_form(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.record_type(),
            self.zone_file_value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_record() {
        let record = Record::parse("www A 192.168.1.10").unwrap();
        assert_eq!(record.name().as_str(), "www");
        assert_eq!(record.record_type(), RecordType::A);
        assert_eq!(record.zone_file_value(), "192.168.1.10");
    }

    #[test]
    fn parses_cname_case_insensitively() {
        let record = Record::parse("ftp cname www").unwrap();
        assert_eq!(record.record_type(), RecordType::Cname);
        assert_eq!(record.zone_file_value(), "www");
    }

    #[test]
    fn apex_and_wildcard_names() {
        assert!(RecordName::new("@").unwrap().is_apex());
        assert!(RecordName::new("*").is_ok());
        assert!(RecordName::new("*.dev").is_ok());
        assert!(RecordName::new("a.*").is_err());
        assert!(RecordName::new("bad name").is_err());
    }

    #[test]
    fn apex_constructor_matches_parsed_at_sign() {
        let record = Record::a(RecordName::apex(), "192.168.1.10".parse().unwrap());
        assert_eq!(record.name(), &RecordName::new("@").unwrap());
        assert!(record.name().is_apex());
        assert_eq!(record.to_string(), "@ A 192.168.1.10");
    }

    #[test]
    fn a_record_requires_ipv4() {
        assert!(matches!(
            Record::new("www", RecordType::A, "mail.example.com"),
            Err(RecordError::InvalidAddress(_))
        ));
        assert!(matches!(
            Record::new("www", RecordType::A, "::1"),
            Err(RecordError::InvalidAddress(_))
        ));
        assert!(matches!(
            Record::new("www", RecordType::A, "300.1.1.1"),
            Err(RecordError::InvalidAddress(_))
        ));
    }

    #[test]
    fn cname_requires_hostname() {
        assert!(matches!(
            Record::new("webmail", RecordType::Cname, "not a host!"),
            Err(RecordError::InvalidTarget(_))
        ));
    }

    #[test]
    fn unsupported_type_and_malformed_input() {
        assert!(matches!(
            Record::parse("www MX mail"),
            Err(RecordError::UnsupportedType(_))
        ));
        assert!(matches!(
            Record::parse("www A"),
            Err(RecordError::Malformed(_))
        ));
    }
}
