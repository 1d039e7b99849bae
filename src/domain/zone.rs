use std::collections::HashMap;
use std::net::IpAddr;

use thiserror::Error;

use super::value_objects::{Cidr, Hostname, PtrRecord, Record, RecordType};

#[derive(Debug, Error)]
pub enum ZoneConfigError {
    #[error("Slave zones are transferred from their masters and cannot carry records")]
    SlaveWithRecords,

    #[error("Slave zone needs at least one master address")]
    NoMasters,

    #[error("'{0}' has a CNAME record and other data; a CNAME must be the only record for a name")]
    CnameConflict(String),

    #[error("{ip} is outside the reverse zone network {network}")]
    AddressOutsideNetwork { ip: String, network: Cidr },

    #[error("A CNAME at the zone apex would clash with its SOA and NS records")]
    CnameAtApex,

    #[error("Duplicate PTR record for {0}")]
    DuplicatePtr(String),

    #[error("PTR target for {ip} must be fully qualified, got: {hostname}")]
    RelativePtrTarget { ip: String, hostname: String },
}

/// Role of the server for a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneType {
    Master,
    Slave { masters: Vec<IpAddr> },
}

impl ZoneType {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Slave { .. } => "slave",
        }
    }
}

/// Desired content of a forward zone. `add_zone` rewrites the whole zone
/// file from this on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneConfig {
    pub zone_type: ZoneType,
    pub records: Vec<Record>,
    /// Name servers for the NS records. Empty means `ns1`/`ns2` under the zone.
    pub nameservers: Vec<Hostname>,
    /// SOA serial. `None` lets the controller pick one from the clock.
    pub serial: Option<u32>,
}

impl ZoneConfig {
    pub fn master(records: Vec<Record>) -> Self {
        Self {
            zone_type: ZoneType::Master,
            records,
            nameservers: Vec::new(),
            serial: None,
        }
    }

    pub fn slave(masters: Vec<IpAddr>) -> Self {
        Self {
            zone_type: ZoneType::Slave { masters },
            records: Vec::new(),
            nameservers: Vec::new(),
            serial: None,
        }
    }

    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn with_nameservers(mut self, nameservers: Vec<Hostname>) -> Self {
        self.nameservers = nameservers;
        self
    }

    /// Records of one type, in input order.
    pub fn records_of(&self, record_type: RecordType) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |r| r.record_type() == record_type)
    }

    pub fn validate(&self) -> Result<(), ZoneConfigError> {
        if let ZoneType::Slave { masters } = &self.zone_type {
            if masters.is_empty() {
                return Err(ZoneConfigError::NoMasters);
            }
            if !self.records.is_empty() {
                return Err(ZoneConfigError::SlaveWithRecords);
            }
            return Ok(());
        }

        if self
            .records_of(RecordType::Cname)
            .any(|record| record.name().is_apex())
        {
            return Err(ZoneConfigError::CnameAtApex);
        }

        // (records for the name, has a CNAME)
        let mut owners: HashMap<&str, (usize, bool)> = HashMap::new();
        for record in &self.records {
            let entry = owners.entry(record.name().as_str()).or_default();
            entry.0 += 1;
            entry.1 |= record.record_type() == RecordType::Cname;
        }
        if let Some((name, _)) = owners
            .iter()
            .find(|(_, (count, has_cname))| *has_cname && *count > 1)
        {
            return Err(ZoneConfigError::CnameConflict(name.to_string()));
        }

        Ok(())
    }
}

/// Desired content of a reverse zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PtrZoneConfig {
    pub records: Vec<PtrRecord>,
    pub nameservers: Vec<Hostname>,
    pub serial: Option<u32>,
}

impl PtrZoneConfig {
    pub fn new(records: Vec<PtrRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn validate(&self, network: &Cidr) -> Result<(), ZoneConfigError> {
        let mut seen = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if !network.contains(record.ip) {
                return Err(ZoneConfigError::AddressOutsideNetwork {
                    ip: record.ip.to_string(),
                    network: *network,
                });
            }
            if !record.hostname.as_str().contains('.') {
                return Err(ZoneConfigError::RelativePtrTarget {
                    ip: record.ip.to_string(),
                    hostname: record.hostname.to_string(),
                });
            }
            if seen.contains(&record.ip) {
                return Err(ZoneConfigError::DuplicatePtr(record.ip.to_string()));
            }
            seen.push(record.ip);
        }
        Ok(())
    }
}
