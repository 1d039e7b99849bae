use crate::domain::DnsmasqOptions;

use super::MANAGED_HEADER;

/// `dnsmasq.conf` with one `server=` line per upstream and the cache size.
pub fn dnsmasq_conf(options: &DnsmasqOptions) -> String {
    let mut out = format!("# {}\n", MANAGED_HEADER);
    for server in &options.upstream_servers {
        out.push_str(&format!("server={}\n", server));
    }
    out.push_str(&format!("cache-size={}\n", options.cache_size));
    out
}
