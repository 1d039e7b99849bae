//! TOML record files accepted by `add-zone --file` and `add-ptr-zone --file`.
//!
//! Everything arrives as plain strings and is checked on conversion into
//! the domain types, so a bad file is rejected before any remote work.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::RecordType;
use crate::domain::{Hostname, PtrRecord, PtrZoneConfig, Record, ZoneConfig, ZoneType};
use crate::error::DnsConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[default]
    Master,
    Slave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

/// ```toml
/// serial = 2024060101
/// nameservers = ["ns1.example.com"]
///
/// [[records]]
/// name = "www"
/// type = "A"
/// value = "192.168.1.10"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneFile {
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub masters: Vec<String>,
    pub serial: Option<u32>,
    pub nameservers: Vec<String>,
    pub records: Vec<RecordEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtrEntry {
    pub ip: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtrZoneFile {
    pub serial: Option<u32>,
    pub nameservers: Vec<String>,
    pub records: Vec<PtrEntry>,
}

fn nameservers(names: Vec<String>) -> Result<Vec<Hostname>, DnsConfigError> {
    names
        .into_iter()
        .map(|name| Hostname::new(name).map_err(DnsConfigError::from))
        .collect()
}

impl TryFrom<ZoneFile> for ZoneConfig {
    type Error = DnsConfigError;

    fn try_from(file: ZoneFile) -> Result<Self, Self::Error> {
        let records = file
            .records
            .iter()
            .map(|entry| {
                let record_type: RecordType = entry.record_type.parse()?;
                Record::new(&entry.name, record_type, &entry.value)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let zone_type = match file.kind {
            ZoneKind::Master => ZoneType::Master,
            ZoneKind::Slave => ZoneType::Slave {
                masters: file
                    .masters
                    .iter()
                    .map(|ip| {
                        ip.parse::<IpAddr>()
                            .map_err(|_| DnsConfigError::Address(ip.clone()))
                    })
                    .collect::<Result<_, _>>()?,
            },
        };

        let config = ZoneConfig {
            zone_type,
            records,
            nameservers: nameservers(file.nameservers)?,
            serial: file.serial,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<PtrZoneFile> for PtrZoneConfig {
    type Error = DnsConfigError;

    fn try_from(file: PtrZoneFile) -> Result<Self, Self::Error> {
        let records = file
            .records
            .iter()
            .map(|entry| PtrRecord::from_parts(&entry.ip, &entry.hostname))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PtrZoneConfig {
            records,
            nameservers: nameservers(file.nameservers)?,
            serial: file.serial,
        })
    }
}
