mod cidr;
mod hostname;
mod label;
mod ptr_record;
mod record;
mod zone_name;

pub use cidr::{Cidr, CidrError};
pub use hostname::{Hostname, HostnameError};
pub use label::LabelError;
pub use ptr_record::{PtrRecord, PtrRecordError};
pub use record::{Record, RecordData, RecordError, RecordName, RecordType};
pub use zone_name::{ZoneName, ZoneNameError};
