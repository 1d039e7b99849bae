mod options;
pub mod value_objects;
mod zone;

pub use options::{BindOptions, DnsmasqOptions, OptionsError};
pub use value_objects::{
    Cidr, Hostname, PtrRecord, Record, RecordData, RecordName, RecordType, ZoneName,
};
pub use zone::{PtrZoneConfig, ZoneConfig, ZoneConfigError, ZoneType};
