use std::net::IpAddr;

use anyhow::Result;

use dns_manager::DnsmasqServer;
use dns_manager::domain::DnsmasqOptions;

use super::Context;

fn server(ctx: &Context) -> Result<DnsmasqServer<dns_manager::SshSession>> {
    Ok(DnsmasqServer::with_paths(
        ctx.connect()?,
        ctx.config.dnsmasq.clone(),
    ))
}

pub fn install(ctx: &Context) -> Result<()> {
    let server = server(ctx)?;
    let outcome = server.install()?;
    println!("  {}", outcome);
    ctx.record(server.host(), "dnsmasq install");
    Ok(())
}

pub fn configure(ctx: &Context, servers: Vec<IpAddr>, cache_size: u32) -> Result<()> {
    let server = server(ctx)?;
    let summary = servers
        .iter()
        .map(IpAddr::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    println!("Configuring dnsmasq (upstream: {})...", summary);
    server.configure(DnsmasqOptions::new(servers).with_cache_size(cache_size))?;
    println!("  dnsmasq configured and restarted.");

    ctx.record(
        server.host(),
        &format!("dnsmasq configure servers={} cache-size={}", summary, cache_size),
    );
    Ok(())
}
