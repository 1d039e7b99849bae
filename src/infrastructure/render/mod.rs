//! Text renderers for the files this tool installs.
//!
//! Every function here is pure: the same input produces byte-identical
//! output, so repeated runs are idempotent and `.bak` diffs stay meaningful.

pub mod bind;
pub mod dnsmasq;
pub mod registry;

pub use registry::{RegisteredZone, Registry, RegistryError};

pub(crate) const MANAGED_HEADER: &str = "Managed by dns-manager. Local edits are overwritten.";
