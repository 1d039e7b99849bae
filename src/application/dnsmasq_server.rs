use crate::domain::DnsmasqOptions;
use crate::error::DnsConfigError;
use crate::infrastructure::paths::DnsmasqPaths;
use crate::infrastructure::remote::RemoteHost;
use crate::infrastructure::render;
use crate::infrastructure::service;
use crate::infrastructure::validator::Check;

use super::StepOutcome;
use super::transaction::{Ownership, install_and_reload};

const PACKAGE: &str = "dnsmasq";

/// dnsmasq controller for one remote host. dnsmasq only forwards and
/// caches here, so there is no zone handling.
pub struct DnsmasqServer<H: RemoteHost> {
    host: H,
    paths: DnsmasqPaths,
}

impl<H: RemoteHost> DnsmasqServer<H> {
    pub fn new(host: H) -> Self {
        Self::with_paths(host, DnsmasqPaths::default())
    }

    pub fn with_paths(host: H, paths: DnsmasqPaths) -> Self {
        Self { host, paths }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn install(&self) -> Result<StepOutcome, DnsConfigError> {
        if service::is_installed(&self.host, PACKAGE)? {
            return Ok(StepOutcome::Skipped("dnsmasq already installed.".into()));
        }

        service::install_packages(&self.host, &[PACKAGE])?;
        service::enable_and_start(&self.host, &self.paths.service)?;
        Ok(StepOutcome::Success(format!(
            "Installed dnsmasq and started {}.",
            self.paths.service
        )))
    }

    pub fn configure(&self, options: DnsmasqOptions) -> Result<(), DnsConfigError> {
        options.validate()?;

        let outcome = self.install()?;
        tracing::debug!(%outcome, "dnsmasq package");

        let contents = render::dnsmasq::dnsmasq_conf(&options);
        install_and_reload(
            &self.host,
            &self.paths.service,
            Ownership {
                owner: &self.paths.owner,
                group: &self.paths.group,
                mode: &self.paths.mode,
            },
            |tx| {
                let staged = tx.stage(&self.paths.config_path, &contents)?;
                tx.check(&Check::dnsmasq(staged))
            },
            |_| Ok(()),
        )?;

        tracing::info!(
            upstreams = options.upstream_servers.len(),
            cache_size = options.cache_size,
            "dnsmasq configured"
        );
        Ok(())
    }
}
