use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

use super::zone_name::ZoneName;

#[derive(Debug, Error)]
pub enum CidrError {
    #[error("Expected NETWORK/PREFIX (e.g. 192.168.1.0/24), got: {0}")]
    Malformed(String),

    #[error("Invalid network address: {0}")]
    InvalidAddress(String),

    #[error("Invalid prefix length: {0}")]
    InvalidPrefix(String),

    #[error("Reverse zones are only generated on octet boundaries (/8, /16, /24), got /{0}")]
    UnsupportedPrefix(u8),

    #[error("{network}/{prefix} has host bits set (did you mean {expected}/{prefix}?)")]
    HostBitsSet {
        network: Ipv4Addr,
        prefix: u8,
        expected: Ipv4Addr,
    },
}

/// An IPv4 network on an octet boundary, the unit a reverse zone covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Cidr {
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if !matches!(prefix, 8 | 16 | 24) {
            return Err(CidrError::UnsupportedPrefix(prefix));
        }

        let mask = u32::MAX << (32 - prefix);
        let expected = Ipv4Addr::from(u32::from(network) & mask);
        if expected != network {
            return Err(CidrError::HostBitsSet {
                network,
                prefix,
                expected,
            });
        }

        Ok(Self { network, prefix })
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn network_octets(&self) -> usize {
        usize::from(self.prefix / 8)
    }

    /// Reverse zone name, e.g. `192.168.1.0/24` → `1.168.192.in-addr.arpa`.
    pub fn reverse_zone(&self) -> ZoneName {
        let octets = self.network.octets();
        let mut labels: Vec<String> = octets[..self.network_octets()]
            .iter()
            .rev()
            .map(u8::to_string)
            .collect();
        labels.push("in-addr.arpa".to_string());
        ZoneName::new_unchecked(labels.join("."))
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::MAX << (32 - self.prefix);
        u32::from(ip) & mask == u32::from(self.network)
    }

    /// Owner name of `ip` relative to the reverse zone
    /// (`10` in a /24, `10.1` in a /16).
    pub fn relative_owner(&self, ip: Ipv4Addr) -> String {
        ip.octets()[self.network_octets()..]
            .iter()
            .rev()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (address, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrError::Malformed(s.to_string()))?;

        let network = address
            .parse::<Ipv4Addr>()
            .map_err(|_| CidrError::InvalidAddress(address.to_string()))?;
        let prefix = prefix
            .parse::<u8>()
            .ok()
            .filter(|p| *p <= 32)
            .ok_or_else(|| CidrError::InvalidPrefix(prefix.to_string()))?;

        Self::new(network, prefix)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}
