use serde::{Deserialize, Serialize};

use crate::domain::ZoneName;

/// Remote locations and ownership used by the BIND controller.
/// Defaults match a stock CentOS `bind` package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindPaths {
    pub named_conf: String,
    /// Zone stanzas managed by this tool, included from `named_conf`.
    pub zone_registry: String,
    pub zones_dir: String,
    pub service: String,
    pub owner: String,
    pub group: String,
    pub mode: String,
}

impl Default for BindPaths {
    fn default() -> Self {
        Self {
            named_conf: "/etc/named.conf".into(),
            zone_registry: "/etc/named.dnsmgr.zones".into(),
            zones_dir: "/var/named".into(),
            service: "named".into(),
            owner: "root".into(),
            group: "named".into(),
            mode: "640".into(),
        }
    }
}

impl BindPaths {
    /// Zone file name relative to the `directory` option.
    pub fn zone_file_name(&self, zone: &ZoneName) -> String {
        format!("db.{}", zone.as_str())
    }

    /// Slave zones are written by named itself into its `slaves/` directory.
    pub fn slave_file_name(&self, zone: &ZoneName) -> String {
        format!("slaves/db.{}", zone.as_str())
    }

    /// Absolute path of a file named in a zone stanza.
    pub fn resolve(&self, file: &str) -> String {
        if file.starts_with('/') {
            file.to_string()
        } else {
            format!("{}/{}", self.zones_dir.trim_end_matches('/'), file)
        }
    }

    pub fn zone_file(&self, zone: &ZoneName) -> String {
        self.resolve(&self.zone_file_name(zone))
    }
}

/// Remote locations and ownership used by the dnsmasq controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsmasqPaths {
    pub config_path: String,
    pub service: String,
    pub owner: String,
    pub group: String,
    pub mode: String,
}

impl Default for DnsmasqPaths {
    fn default() -> Self {
        Self {
            config_path: "/etc/dnsmasq.conf".into(),
            service: "dnsmasq".into(),
            owner: "root".into(),
            group: "root".into(),
            mode: "644".into(),
        }
    }
}
