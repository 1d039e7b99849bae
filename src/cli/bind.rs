use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use dns_manager::domain::{
    BindOptions, Cidr, Hostname, PtrRecord, PtrZoneConfig, Record, ZoneConfig, ZoneName,
};
use dns_manager::infrastructure::config::{PtrZoneFile, ZoneFile};
use dns_manager::{BindServer, DeleteOutcome, SshSession};

use super::Context;

pub struct ZoneArgs {
    pub zone: String,
    pub records: Vec<String>,
    pub file: Option<PathBuf>,
    pub masters: Vec<IpAddr>,
    pub serial: Option<u32>,
    pub nameservers: Vec<String>,
}

pub struct PtrZoneArgs {
    pub network: String,
    pub records: Vec<String>,
    pub file: Option<PathBuf>,
    pub serial: Option<u32>,
    pub nameservers: Vec<String>,
}

fn server(ctx: &Context) -> Result<BindServer<SshSession>> {
    Ok(BindServer::with_paths(ctx.connect()?, ctx.config.bind.clone()))
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_nameservers(names: &[String]) -> Result<Vec<Hostname>> {
    names
        .iter()
        .map(|name| {
            Hostname::new(name.as_str())
                .with_context(|| format!("Invalid name server '{}'", name))
        })
        .collect()
}

pub fn install(ctx: &Context) -> Result<()> {
    let server = server(ctx)?;
    let outcome = server.install()?;
    println!("  {}", outcome);
    ctx.record(server.host(), "bind install");
    Ok(())
}

pub fn configure(ctx: &Context, forwarders: Vec<IpAddr>, forward_first: bool) -> Result<()> {
    let summary = forwarders
        .iter()
        .map(IpAddr::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let options = BindOptions {
        forwarders,
        forward_only: !forward_first,
    };

    let server = server(ctx)?;
    println!("Configuring BIND (forwarders: {})...", summary);
    server.configure(options)?;
    println!("  named.conf installed and named restarted.");

    ctx.record(server.host(), &format!("bind configure forwarders={}", summary));
    Ok(())
}

pub fn add_zone(ctx: &Context, args: ZoneArgs) -> Result<()> {
    // Everything is parsed before connecting.
    let zone = ZoneName::new(&args.zone)?;

    let mut config = match &args.file {
        Some(path) => ZoneConfig::try_from(read_toml::<ZoneFile>(path)?)?,
        None if !args.masters.is_empty() => ZoneConfig::slave(args.masters.clone()),
        None => ZoneConfig::master(
            args.records
                .iter()
                .map(|r| Record::parse(r))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    if let Some(serial) = args.serial {
        config.serial = Some(serial);
    }
    if !args.nameservers.is_empty() {
        config.nameservers = parse_nameservers(&args.nameservers)?;
    }

    let kind = config.zone_type.keyword();
    let count = config.records.len();

    let server = server(ctx)?;
    println!("Adding {} zone {}...", kind, zone);
    server.add_zone(&zone, config)?;
    match kind {
        "slave" => println!("  Zone registered, named will transfer it from its masters."),
        _ => println!("  Zone installed with {} record(s).", count),
    }

    ctx.record(server.host(), &format!("bind add-zone {} ({} records)", zone, count));
    Ok(())
}

pub fn add_ptr_zone(ctx: &Context, args: PtrZoneArgs) -> Result<()> {
    let network: Cidr = args.network.parse()?;

    let mut config = match &args.file {
        Some(path) => PtrZoneConfig::try_from(read_toml::<PtrZoneFile>(path)?)?,
        None => PtrZoneConfig::new(
            args.records
                .iter()
                .map(|r| PtrRecord::parse(r))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    if let Some(serial) = args.serial {
        config.serial = Some(serial);
    }
    if !args.nameservers.is_empty() {
        config.nameservers = parse_nameservers(&args.nameservers)?;
    }
    let count = config.records.len();

    let server = server(ctx)?;
    println!("Adding reverse zone for {}...", network);
    let zone = server.add_ptr_zone(&network, config)?;
    println!("  Zone {} installed with {} record(s).", zone, count);

    ctx.record(
        server.host(),
        &format!("bind add-ptr-zone {} -> {} ({} records)", network, zone, count),
    );
    Ok(())
}

pub fn delete_zone(ctx: &Context, zone: String, force: bool) -> Result<()> {
    let zone = ZoneName::new(&zone)?;
    let server = server(ctx)?;

    if !force {
        match server.zone(&zone)? {
            Some(entry) => {
                println!("This will delete the zone:");
                println!("  Zone: {}", entry.name);
                println!("  Type: {}", entry.zone_type);
                println!("  File: {}", server.paths().resolve(&entry.file));
                println!("\nRun with --force to confirm.");
            }
            None => println!("Zone '{}' is not registered.", zone),
        }
        return Ok(());
    }

    match server.delete_zone(&zone)? {
        DeleteOutcome::Removed => {
            println!("Zone {} deleted and named restarted.", zone);
            ctx.record(server.host(), &format!("bind delete-zone {}", zone));
        }
        DeleteOutcome::NotPresent => println!("Zone '{}' does not exist, nothing to do.", zone),
    }
    Ok(())
}

pub fn list_zones(ctx: &Context) -> Result<()> {
    let server = server(ctx)?;
    let zones = server.list_zones()?;

    if zones.is_empty() {
        println!("No zones registered.");
        println!("\nAdd a zone with:");
        println!("  dns-manager bind add-zone example.com --record \"@ A 192.168.1.10\"");
        println!("  dns-manager bind add-ptr-zone 192.168.1.0/24 --record \"192.168.1.10=host.example.com\"");
        return Ok(());
    }

    println!("Registered zones:\n");
    for zone in zones {
        let masters = if zone.masters.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = zone.masters.iter().map(IpAddr::to_string).collect();
            format!(" (masters: {})", list.join(", "))
        };
        let kind = if zone.name.is_reverse() {
            format!("{} (reverse)", zone.zone_type)
        } else {
            zone.zone_type.clone()
        };
        println!("  {:<30} {:<16} {}{}", zone.name.as_str(), kind, zone.file, masters);
    }

    Ok(())
}
