use std::net::IpAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("At least one forwarder address is required")]
    NoForwarders,

    #[error("At least one upstream DNS server is required")]
    NoUpstreams,
}

/// Top-level BIND resolver settings written by `configure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    pub forwarders: Vec<IpAddr>,
    /// `forward only;` when set, `forward first;` otherwise.
    pub forward_only: bool,
}

impl BindOptions {
    pub fn new(forwarders: Vec<IpAddr>) -> Self {
        Self {
            forwarders,
            forward_only: true,
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.forwarders.is_empty() {
            return Err(OptionsError::NoForwarders);
        }
        Ok(())
    }
}

/// dnsmasq forwarder and cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsmasqOptions {
    pub upstream_servers: Vec<IpAddr>,
    pub cache_size: u32,
}

impl DnsmasqOptions {
    pub fn new(upstream_servers: Vec<IpAddr>) -> Self {
        Self {
            upstream_servers,
            cache_size: 0,
        }
    }

    pub fn with_cache_size(mut self, cache_size: u32) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.upstream_servers.is_empty() {
            return Err(OptionsError::NoUpstreams);
        }
        Ok(())
    }
}
