use time::OffsetDateTime;

use crate::domain::{BindOptions, Cidr, PtrZoneConfig, ZoneConfig, ZoneName, ZoneType};
use crate::error::DnsConfigError;
use crate::infrastructure::paths::BindPaths;
use crate::infrastructure::remote::RemoteHost;
use crate::infrastructure::render::{self, RegisteredZone, Registry};
use crate::infrastructure::service;
use crate::infrastructure::validator::Check;

use super::transaction::{Ownership, StagedInstall, install_and_reload};
use super::{DeleteOutcome, StepOutcome};

const PACKAGES: [&str; 2] = ["bind", "bind-utils"];

/// BIND controller for one remote host.
///
/// Owns the session for its whole life. Remote files are read fresh on
/// every call; nothing about the host is cached here.
pub struct BindServer<H: RemoteHost> {
    host: H,
    paths: BindPaths,
}

impl<H: RemoteHost> BindServer<H> {
    pub fn new(host: H) -> Self {
        Self::with_paths(host, BindPaths::default())
    }

    pub fn with_paths(host: H, paths: BindPaths) -> Self {
        Self { host, paths }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn paths(&self) -> &BindPaths {
        &self.paths
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Install `bind` and `bind-utils` unless the package is present,
    /// then enable and start the service.
    pub fn install(&self) -> Result<StepOutcome, DnsConfigError> {
        if service::is_installed(&self.host, PACKAGES[0])? {
            return Ok(StepOutcome::Skipped("BIND already installed.".into()));
        }

        service::install_packages(&self.host, &PACKAGES)?;
        service::enable_and_start(&self.host, &self.paths.service)?;
        Ok(StepOutcome::Success(format!(
            "Installed {} and started {}.",
            PACKAGES.join(", "),
            self.paths.service
        )))
    }

    /// Write `named.conf` with the given forwarders and restart named.
    ///
    /// The zone registration file is created empty if it is missing, since
    /// the new `named.conf` includes it.
    pub fn configure(&self, options: BindOptions) -> Result<(), DnsConfigError> {
        options.validate()?;

        let outcome = self.install()?;
        tracing::debug!(%outcome, "BIND package");

        let created_registry = self.ensure_registry()?;

        let contents = render::bind::named_conf(&options, &self.paths);
        let result = install_and_reload(
            &self.host,
            &self.paths.service,
            self.ownership(),
            |tx| {
                let staged = tx.stage(&self.paths.named_conf, &contents)?;
                tx.check(&Check::named_conf(staged))
            },
            |_| Ok(()),
        );

        if let Err(e) = result {
            if created_registry {
                self.discard_registry();
            }
            return Err(e);
        }

        tracing::info!(forwarders = options.forwarders.len(), "BIND configured");
        Ok(())
    }

    /// Create or fully rewrite a forward zone and register it.
    pub fn add_zone(&self, zone: &ZoneName, config: ZoneConfig) -> Result<(), DnsConfigError> {
        config.validate()?;

        let contents = match config.zone_type {
            ZoneType::Master => Some(render::bind::zone_file(
                zone,
                &config,
                config.serial.unwrap_or_else(default_serial),
            )),
            ZoneType::Slave { .. } => None,
        };

        self.install_zone(zone, &config.zone_type, contents)?;
        tracing::info!(zone = %zone, records = config.records.len(), "Zone installed");
        Ok(())
    }

    /// Create or rewrite the reverse zone for `network`. Returns the
    /// derived zone name, e.g. `1.168.192.in-addr.arpa` for `192.168.1.0/24`.
    pub fn add_ptr_zone(
        &self,
        network: &Cidr,
        config: PtrZoneConfig,
    ) -> Result<ZoneName, DnsConfigError> {
        config.validate(network)?;

        let zone = network.reverse_zone();
        let contents = render::bind::ptr_zone_file(
            network,
            &config,
            config.serial.unwrap_or_else(default_serial),
        );

        self.install_zone(&zone, &ZoneType::Master, Some(contents))?;
        tracing::info!(zone = %zone, records = config.records.len(), "Reverse zone installed");
        Ok(zone)
    }

    /// Remove a zone's file and registration.
    pub fn delete_zone(&self, zone: &ZoneName) -> Result<DeleteOutcome, DnsConfigError> {
        let mut registry = self.read_registry()?;
        let registered = registry.remove(zone);

        let zone_file = match &registered {
            Some(entry) => self.paths.resolve(&entry.file),
            None => self.paths.zone_file(zone),
        };
        let file_exists = self.host.exists(&zone_file)?;

        if registered.is_none() && !file_exists {
            tracing::info!(zone = %zone, "Zone not present, nothing to delete");
            return Ok(DeleteOutcome::NotPresent);
        }

        install_and_reload(
            &self.host,
            &self.paths.service,
            self.ownership(),
            |tx| {
                if registered.is_some() {
                    let staged = tx.stage(&self.paths.zone_registry, &registry.render())?;
                    tx.check(&Check::named_conf(staged))?;
                }
                if file_exists {
                    tx.remove(&zone_file);
                }
                Ok(())
            },
            |host| self.check_live_config(host),
        )?;

        tracing::info!(zone = %zone, "Zone deleted");
        Ok(DeleteOutcome::Removed)
    }

    /// Zones in the registration file, in name order.
    pub fn list_zones(&self) -> Result<Vec<RegisteredZone>, DnsConfigError> {
        Ok(self.read_registry()?.zones().cloned().collect())
    }

    /// The registration of one zone, if any.
    pub fn zone(&self, zone: &ZoneName) -> Result<Option<RegisteredZone>, DnsConfigError> {
        Ok(self.read_registry()?.get(zone).cloned())
    }

    fn install_zone(
        &self,
        zone: &ZoneName,
        zone_type: &ZoneType,
        contents: Option<String>,
    ) -> Result<(), DnsConfigError> {
        self.ensure_configured()?;

        let mut registry = self.read_registry()?;
        let file_name = match zone_type {
            ZoneType::Master => self.paths.zone_file_name(zone),
            ZoneType::Slave { .. } => self.paths.slave_file_name(zone),
        };
        let previous = registry.upsert(RegisteredZone::new(zone.clone(), zone_type, &file_name));

        // A master file left behind by an earlier registration of this zone.
        let stale = previous
            .map(|entry| self.paths.resolve(&entry.file))
            .filter(|old| *old != self.paths.resolve(&file_name) && contents.is_none());

        install_and_reload(
            &self.host,
            &self.paths.service,
            self.ownership(),
            |tx| {
                if let Some(contents) = &contents {
                    let staged = tx.stage(&self.paths.resolve(&file_name), contents)?;
                    tx.check(&Check::zone(zone, staged))?;
                }
                let staged = tx.stage(&self.paths.zone_registry, &registry.render())?;
                tx.check(&Check::named_conf(staged))?;
                if let Some(stale) = &stale {
                    tx.remove(stale);
                }
                Ok(())
            },
            |host| self.check_live_config(host),
        )
    }

    /// `add_zone` only writes the registration file, so named.conf must
    /// already include it.
    fn ensure_configured(&self) -> Result<(), DnsConfigError> {
        let directive = render::bind::include_directive(&self.paths);
        let configured = self
            .host
            .read_file(&self.paths.named_conf)?
            .is_some_and(|text| text.lines().any(|line| line.trim() == directive));

        if !configured {
            return Err(DnsConfigError::NotConfigured {
                named_conf: self.paths.named_conf.clone(),
                registry: self.paths.zone_registry.clone(),
            });
        }
        Ok(())
    }

    /// Create an empty registry if there is none. Returns whether it was
    /// created, so a failed `configure` can take it away again.
    fn ensure_registry(&self) -> Result<bool, DnsConfigError> {
        if self.host.exists(&self.paths.zone_registry)? {
            return Ok(false);
        }

        tracing::info!(path = %self.paths.zone_registry, "Creating zone registry");
        let mut tx = StagedInstall::new(&self.host);
        let result = tx
            .stage(&self.paths.zone_registry, &Registry::default().render())
            .and_then(|_| tx.commit(self.ownership()));
        if result.is_err() {
            tx.rollback();
        }
        result.map(|()| true)
    }

    fn discard_registry(&self) {
        let path = &self.paths.zone_registry;
        match self.host.remove_file(path) {
            Ok(()) => tracing::info!(path = %path, "Removed zone registry created by failed configure"),
            Err(e) => tracing::warn!(path = %path, error = %e, "Failed to remove zone registry"),
        }
    }

    fn read_registry(&self) -> Result<Registry, DnsConfigError> {
        let path = &self.paths.zone_registry;
        match self.host.read_file(path)? {
            Some(text) => Registry::parse(&text).map_err(|source| DnsConfigError::Registry {
                path: path.clone(),
                source,
            }),
            None => Ok(Registry::default()),
        }
    }

    /// Check the whole installed configuration, zones included.
    fn check_live_config(&self, host: &H) -> Result<(), DnsConfigError> {
        Check::named_conf(&self.paths.named_conf).run(host)?;
        Ok(())
    }

    fn ownership(&self) -> Ownership<'_> {
        Ownership {
            owner: &self.paths.owner,
            group: &self.paths.group,
            mode: &self.paths.mode,
        }
    }
}

/// SOA serial used when the zone config does not pin one: seconds since
/// the UNIX epoch, so every rewrite increases it.
fn default_serial() -> u32 {
    u32::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(u32::MAX)
}
