use thiserror::Error;

use crate::domain::OptionsError;
use crate::domain::ZoneConfigError;
use crate::domain::value_objects::{
    CidrError, HostnameError, PtrRecordError, RecordError, ZoneNameError,
};
use crate::infrastructure::remote::SessionError;
use crate::infrastructure::render::RegistryError;
use crate::infrastructure::service::ServiceError;
use crate::infrastructure::validator::ValidationError;

/// Everything a server controller operation can fail with.
///
/// Input errors are raised before the first remote command, so a failed
/// call of that kind leaves the host untouched.
#[derive(Error, Debug)]
pub enum DnsConfigError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Invalid zone name: {0}")]
    ZoneName(#[from] ZoneNameError),

    #[error("Invalid record: {0}")]
    Record(#[from] RecordError),

    #[error("Invalid hostname: {0}")]
    Hostname(#[from] HostnameError),

    #[error("Invalid network: {0}")]
    Cidr(#[from] CidrError),

    #[error("Invalid PTR record: {0}")]
    PtrRecord(#[from] PtrRecordError),

    #[error("Invalid zone configuration: {0}")]
    ZoneConfig(#[from] ZoneConfigError),

    #[error("Invalid server options: {0}")]
    Options(#[from] OptionsError),

    #[error("Invalid address '{0}'")]
    Address(String),

    #[error("Cannot parse zone registry {path}: {source}")]
    Registry {
        path: String,
        source: RegistryError,
    },

    #[error("{named_conf} does not include {registry}. Run `configure` first.")]
    NotConfigured {
        named_conf: String,
        registry: String,
    },
}
