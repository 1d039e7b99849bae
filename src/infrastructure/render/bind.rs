use crate::domain::{
    BindOptions, Cidr, Hostname, PtrZoneConfig, RecordType, ZoneConfig, ZoneName,
};
use crate::infrastructure::paths::BindPaths;

use super::MANAGED_HEADER;

const DEFAULT_TTL: u32 = 86400;
const REFRESH: u32 = 3600;
const RETRY: u32 = 1800;
const EXPIRE: u32 = 604800;
const MINIMUM_TTL: u32 = 86400;

const INDENT: &str = "        ";

/// Main `named.conf`: resolver options, logging, root hints and the
/// include of the zone registration file.
pub fn named_conf(options: &BindOptions, paths: &BindPaths) -> String {
    let dir = paths.zones_dir.trim_end_matches('/');
    let forwarders: String = options
        .forwarders
        .iter()
        .map(|ip| format!("{}; ", ip))
        .collect();
    let forward = if options.forward_only { "only" } else { "first" };

    let mut out = format!("// {}\n", MANAGED_HEADER);
    out.push_str("options {\n");
    for line in [
        "listen-on port 53 { any; };".to_string(),
        "listen-on-v6 { none; };".to_string(),
        format!("directory       \"{}\";", dir),
        format!("dump-file       \"{}/data/cache_dump.db\";", dir),
        format!("statistics-file \"{}/data/named_stats.txt\";", dir),
        format!("memstatistics-file \"{}/data/named_mem_stats.txt\";", dir),
        format!("secroots-file   \"{}/data/named.secroots\";", dir),
        format!("recursing-file  \"{}/data/named.recursing\";", dir),
        "allow-query     { any; };".to_string(),
        format!("forward {};", forward),
        format!("forwarders {{ {}}};", forwarders),
    ] {
        out.push_str(INDENT);
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("};\n\n");

    out.push_str("logging {\n");
    out.push_str(&format!("{INDENT}channel default_debug {{\n"));
    out.push_str(&format!("{INDENT}{INDENT}file \"data/named.run\";\n"));
    out.push_str(&format!("{INDENT}{INDENT}severity dynamic;\n"));
    out.push_str(&format!("{INDENT}}};\n"));
    out.push_str("};\n\n");

    out.push_str("zone \".\" IN {\n");
    out.push_str(&format!("{INDENT}type hint;\n"));
    out.push_str(&format!("{INDENT}file \"named.ca\";\n"));
    out.push_str("};\n\n");

    out.push_str(&include_directive(paths));
    out.push('\n');
    out
}

/// The line that wires the zone registration file into `named.conf`.
pub fn include_directive(paths: &BindPaths) -> String {
    format!("include \"{}\";", paths.zone_registry)
}

/// Forward zone file. A records come first, then CNAME records, each in
/// the order given.
pub fn zone_file(zone: &ZoneName, config: &ZoneConfig, serial: u32) -> String {
    let mut out = header(zone, &config.nameservers, serial);

    let a_records: Vec<_> = config.records_of(RecordType::A).collect();
    if !a_records.is_empty() {
        out.push_str("\n; A records\n");
        for record in a_records {
            out.push_str(&record_line(
                record.name().as_str(),
                "A",
                &record.zone_file_value(),
            ));
        }
    }

    let cnames: Vec<_> = config.records_of(RecordType::Cname).collect();
    if !cnames.is_empty() {
        out.push_str("\n; CNAME records\n");
        for record in cnames {
            out.push_str(&record_line(
                record.name().as_str(),
                "CNAME",
                &record.zone_file_value(),
            ));
        }
    }

    out
}

/// Reverse zone file for `network`, owners relative to the reverse zone.
pub fn ptr_zone_file(network: &Cidr, config: &PtrZoneConfig, serial: u32) -> String {
    let zone = network.reverse_zone();
    let mut out = header(&zone, &config.nameservers, serial);

    if !config.records.is_empty() {
        out.push_str("\n; PTR records\n");
        for record in &config.records {
            out.push_str(&record_line(
                &network.relative_owner(record.ip),
                "PTR",
                &record.hostname.zone_file_form(),
            ));
        }
    }

    out
}

fn header(zone: &ZoneName, nameservers: &[Hostname], serial: u32) -> String {
    let nameservers: Vec<String> = if nameservers.is_empty() {
        vec![
            format!("ns1.{}", zone.fqdn()),
            format!("ns2.{}", zone.fqdn()),
        ]
    } else {
        nameservers.iter().map(Hostname::zone_file_form).collect()
    };

    let pad = " ".repeat(24);
    let mut out = format!("; {}\n; {}\n", zone, MANAGED_HEADER);
    out.push_str(&format!("$TTL {}\n", DEFAULT_TTL));
    out.push_str(&format!(
        "{:<15} IN  SOA    {} admin.{} (\n",
        "@",
        nameservers[0],
        zone.fqdn()
    ));
    out.push_str(&format!("{pad}{:<11} ; Serial\n", serial));
    out.push_str(&format!("{pad}{:<11} ; Refresh\n", REFRESH));
    out.push_str(&format!("{pad}{:<11} ; Retry\n", RETRY));
    out.push_str(&format!("{pad}{:<11} ; Expire\n", EXPIRE));
    out.push_str(&format!("{pad}{:<11} ; Minimum TTL\n", format!("{} )", MINIMUM_TTL)));

    out.push_str("\n; Name servers\n");
    for ns in &nameservers {
        out.push_str(&record_line("@", "NS", ns));
    }
    out
}

fn record_line(name: &str, record_type: &str, value: &str) -> String {
    format!("{:<15} IN  {:<6} {}\n", name, record_type, value)
}
