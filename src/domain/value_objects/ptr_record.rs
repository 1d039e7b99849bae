use std::fmt;
use std::net::Ipv4Addr;

use thiserror::Error;

use super::hostname::{Hostname, HostnameError};

#[derive(Debug, Error)]
pub enum PtrRecordError {
    #[error("Expected IP=HOSTNAME, got: {0}")]
    Malformed(String),

    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid PTR hostname: {0}")]
    InvalidHostname(#[from] HostnameError),
}

/// Reverse mapping of one address to a hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtrRecord {
    pub ip: Ipv4Addr,
    pub hostname: Hostname,
}

impl PtrRecord {
    pub fn new(ip: Ipv4Addr, hostname: Hostname) -> Self {
        Self { ip, hostname }
    }

    /// Parse from string: "192.168.1.10=www.example.com"
    pub fn parse(s: &str) -> Result<Self, PtrRecordError> {
        let (ip, hostname) = s
            .split_once('=')
            .ok_or_else(|| PtrRecordError::Malformed(s.to_string()))?;
        Self::from_parts(ip, hostname)
    }

    pub fn from_parts(ip: &str, hostname: &str) -> Result<Self, PtrRecordError> {
        let ip = ip.trim();
        let ip = ip
            .parse::<Ipv4Addr>()
            .map_err(|_| PtrRecordError::InvalidAddress(ip.to_string()))?;
        Ok(Self::new(ip, Hostname::new(hostname)?))
    }
}

impl fmt::Display for PtrRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.ip, self.hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip_and_hostname() {
        let record = PtrRecord::parse("192.168.1.10=www.example.com").unwrap();
        assert_eq!(record.ip, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(record.hostname.zone_file_form(), "www.example.com.");
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(matches!(
            PtrRecord::parse("192.168.1.10 www"),
            Err(PtrRecordError::Malformed(_))
        ));
        assert!(matches!(
            PtrRecord::parse("192.168.1=www.example.com"),
            Err(PtrRecordError::InvalidAddress(_))
        ));
        assert!(matches!(
            PtrRecord::parse("192.168.1.10=bad host"),
            Err(PtrRecordError::InvalidHostname(_))
        ));
    }
}
