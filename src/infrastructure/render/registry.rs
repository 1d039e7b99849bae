use std::collections::BTreeMap;
use std::net::IpAddr;

use thiserror::Error;

use crate::domain::{ZoneName, ZoneType};

use super::MANAGED_HEADER;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("line {line}: expected a zone stanza, found: {text}")]
    UnexpectedLine { line: usize, text: String },

    #[error("line {line}: invalid zone name: {message}")]
    InvalidZoneName { line: usize, message: String },

    #[error("line {line}: invalid master address: {text}")]
    InvalidMaster { line: usize, text: String },

    #[error("zone '{zone}' is missing its '{field}' statement")]
    MissingField { zone: String, field: &'static str },

    #[error("zone '{0}' is registered twice")]
    DuplicateZone(String),

    #[error("zone '{0}' stanza is not terminated")]
    Unterminated(String),
}

/// One `zone "..." IN { ... };` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredZone {
    pub name: ZoneName,
    /// `master` or `slave`, as written in the stanza.
    pub zone_type: String,
    /// As written in the stanza, usually relative to the `directory` option.
    pub file: String,
    pub masters: Vec<IpAddr>,
}

impl RegisteredZone {
    pub fn new(name: ZoneName, zone_type: &ZoneType, file: impl Into<String>) -> Self {
        let masters = match zone_type {
            ZoneType::Master => Vec::new(),
            ZoneType::Slave { masters } => masters.clone(),
        };
        Self {
            name,
            zone_type: zone_type.keyword().to_string(),
            file: file.into(),
            masters,
        }
    }

    fn render(&self) -> String {
        let mut out = format!("zone \"{}\" IN {{\n", self.name);
        out.push_str(&format!("        type {};\n", self.zone_type));
        if !self.masters.is_empty() {
            let masters: String = self.masters.iter().map(|ip| format!("{}; ", ip)).collect();
            out.push_str(&format!("        masters {{ {}}};\n", masters));
        }
        out.push_str(&format!("        file \"{}\";\n", self.file));
        if self.masters.is_empty() {
            out.push_str("        allow-update { none; };\n");
        }
        out.push_str("};\n");
        out
    }
}

/// The zone registration file: every zone this tool manages, one stanza
/// each, rendered in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    zones: BTreeMap<ZoneName, RegisteredZone>,
}

struct OpenStanza {
    name: ZoneName,
    zone_type: Option<String>,
    file: Option<String>,
    masters: Vec<IpAddr>,
    /// A `masters {` list spread over several lines, collected until its
    /// closing brace. Holds the text so far and the line it started on.
    masters_block: Option<(String, usize)>,
}

impl Registry {
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        let mut open: Option<OpenStanza> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
                continue;
            }

            match open.as_mut() {
                None => open = Some(Self::parse_opening(line, line_no)?),
                Some(stanza) if stanza.masters_block.is_some() => {
                    if let Some((block, start)) = stanza.masters_block.as_mut() {
                        // statement() dropped the separator after the opening line
                        block.push_str("; ");
                        block.push_str(line);
                        if line.contains('}') {
                            let start = *start;
                            let block = std::mem::take(block);
                            stanza.masters_block = None;
                            stanza.masters = parse_address_list(&block, start)?;
                        }
                    }
                }
                Some(_) if line == "};" => {
                    if let Some(stanza) = open.take() {
                        registry.close(stanza)?;
                    }
                }
                Some(stanza) => {
                    if let Some(value) = statement(line, "type") {
                        stanza.zone_type = Some(value.to_string());
                    } else if let Some(value) = statement(line, "file") {
                        stanza.file = Some(value.trim_matches('"').to_string());
                    } else if let Some(list) = statement(line, "masters") {
                        if list.contains('}') {
                            stanza.masters = parse_address_list(list, line_no)?;
                        } else {
                            stanza.masters_block = Some((list.to_string(), line_no));
                        }
                    }
                    // other statements (allow-update, notify, ...) are not tracked
                }
            }
        }

        match open {
            Some(stanza) => Err(RegistryError::Unterminated(stanza.name.to_string())),
            None => Ok(registry),
        }
    }

    fn parse_opening(line: &str, line_no: usize) -> Result<OpenStanza, RegistryError> {
        let unexpected = || RegistryError::UnexpectedLine {
            line: line_no,
            text: line.to_string(),
        };

        let rest = line.strip_prefix("zone").ok_or_else(unexpected)?.trim_start();
        let rest = rest.strip_prefix('"').ok_or_else(unexpected)?;
        let (name, tail) = rest.split_once('"').ok_or_else(unexpected)?;
        let tail = tail.trim();
        let tail = tail.strip_prefix("IN").unwrap_or(tail).trim();
        if tail != "{" {
            return Err(unexpected());
        }

        let name = ZoneName::new(name).map_err(|e| RegistryError::InvalidZoneName {
            line: line_no,
            message: e.to_string(),
        })?;

        Ok(OpenStanza {
            name,
            zone_type: None,
            file: None,
            masters: Vec::new(),
            masters_block: None,
        })
    }

    fn close(&mut self, stanza: OpenStanza) -> Result<(), RegistryError> {
        let zone = stanza.name.to_string();
        let zone_type = stanza.zone_type.ok_or_else(|| RegistryError::MissingField {
            zone: zone.clone(),
            field: "type",
        })?;
        let file = stanza.file.ok_or_else(|| RegistryError::MissingField {
            zone: zone.clone(),
            field: "file",
        })?;

        if self.zones.contains_key(&stanza.name) {
            return Err(RegistryError::DuplicateZone(zone));
        }

        self.zones.insert(
            stanza.name.clone(),
            RegisteredZone {
                name: stanza.name,
                zone_type,
                file,
                masters: stanza.masters,
            },
        );
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = format!("// {}\n", MANAGED_HEADER);
        for zone in self.zones.values() {
            out.push('\n');
            out.push_str(&zone.render());
        }
        out
    }

    /// Insert or replace the stanza for a zone, returning the previous one.
    pub fn upsert(&mut self, zone: RegisteredZone) -> Option<RegisteredZone> {
        self.zones.insert(zone.name.clone(), zone)
    }

    pub fn remove(&mut self, name: &ZoneName) -> Option<RegisteredZone> {
        self.zones.remove(name)
    }

    pub fn get(&self, name: &ZoneName) -> Option<&RegisteredZone> {
        self.zones.get(name)
    }

    pub fn zones(&self) -> impl Iterator<Item = &RegisteredZone> {
        self.zones.values()
    }

}

/// Value of a `keyword value;` statement.
fn statement<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim().trim_end_matches(';').trim())
}

/// `{ 10.0.0.1; 10.0.0.2; }` → addresses. `start` is the line the list
/// began on.
fn parse_address_list(list: &str, start: usize) -> Result<Vec<IpAddr>, RegistryError> {
    list.trim()
        .trim_end_matches(';')
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| RegistryError::InvalidMaster {
                line: start,
                text: s.to_string(),
            })
        })
        .collect()
}
