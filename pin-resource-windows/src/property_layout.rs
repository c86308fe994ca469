//! Where connector facts live in an endpoint's property store.
//!
//! Each connector category owns a property set. Inside it:
//!
//! ```text
//! pid 1  connector (pin) id          VT_UI4
//! pid 2  processing mode list        VT_BLOB, mode list payload
//! pid 3  per-mode format table       VT_BLOB, repeated:
//!        [0-15] mode GUID  [16-19] length  then a record list payload
//! ```
//!
//! Device-level flags live in their own property set.

use pin_resource_core::codec::property_blob;
use pin_resource_core::{ConnectorCategory, DeviceProperty, DirectoryError, ProcessingMode};

/// A property-store key: format id (GUID) and property id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAddress {
    pub fmtid: u128,
    pub pid: u32,
}

impl PropertyAddress {
    pub const fn new(fmtid: u128, pid: u32) -> Self {
        Self { fmtid, pid }
    }
}

const DEVICE_PROPERTIES: u128 = 0xa45c254e_df1c_4efd_8020_67d146a850e0;

pub const FRIENDLY_NAME: PropertyAddress = PropertyAddress::new(DEVICE_PROPERTIES, 14);
pub const SERVICE: PropertyAddress = PropertyAddress::new(DEVICE_PROPERTIES, 6);
pub const UPPER_FILTERS: PropertyAddress = PropertyAddress::new(DEVICE_PROPERTIES, 19);
pub const LOWER_FILTERS: PropertyAddress = PropertyAddress::new(DEVICE_PROPERTIES, 20);
pub const ENUMERATOR_NAME: PropertyAddress = PropertyAddress::new(DEVICE_PROPERTIES, 24);
pub const INSTANCE_ID: PropertyAddress = PropertyAddress::new(0x78c34fc8_104a_4aca_9ea4_524d52996e57, 256);
pub const ENGINE_DEVICE_FORMAT: PropertyAddress = PropertyAddress::new(0xf19f064d_082c_4e27_bc73_6882a1bb8e4c, 0);

const CONNECTOR_ID_PID: u32 = 1;
const MODES_PID: u32 = 2;
const FORMAT_TABLE_PID: u32 = 3;
const SIDEBAND_PID: u32 = 1;
const MVA_PID: u32 = 2;

/// Property sets holding cached connector facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPropertyLayout {
    pub host_process: u128,
    pub offload: u128,
    pub loopback: u128,
    pub keyword_detector: u128,
    pub device_flags: u128,
}

impl Default for CachedPropertyLayout {
    fn default() -> Self {
        Self {
            host_process: 0x3f1a5c10_6b2e_4c41_9d07_1e2f8a0b5c01,
            offload: 0x3f1a5c10_6b2e_4c41_9d07_1e2f8a0b5c02,
            loopback: 0x3f1a5c10_6b2e_4c41_9d07_1e2f8a0b5c03,
            keyword_detector: 0x3f1a5c10_6b2e_4c41_9d07_1e2f8a0b5c04,
            device_flags: 0x3f1a5c10_6b2e_4c41_9d07_1e2f8a0b5c10,
        }
    }
}

impl CachedPropertyLayout {
    fn set_for(&self, category: ConnectorCategory) -> u128 {
        match category {
            ConnectorCategory::HostProcess => self.host_process,
            ConnectorCategory::Offload => self.offload,
            ConnectorCategory::Loopback => self.loopback,
            ConnectorCategory::KeywordDetector => self.keyword_detector,
        }
    }

    pub fn connector_id(&self, category: ConnectorCategory) -> PropertyAddress {
        PropertyAddress::new(self.set_for(category), CONNECTOR_ID_PID)
    }

    pub fn modes(&self, category: ConnectorCategory) -> PropertyAddress {
        PropertyAddress::new(self.set_for(category), MODES_PID)
    }

    pub fn format_table(&self, category: ConnectorCategory) -> PropertyAddress {
        PropertyAddress::new(self.set_for(category), FORMAT_TABLE_PID)
    }

    /// Flag properties read from the endpoint store. Stack and enumerator
    /// facts come from the system device keys instead.
    pub fn flag(&self, property: DeviceProperty) -> Option<PropertyAddress> {
        match property {
            DeviceProperty::SidebandActivated => Some(PropertyAddress::new(self.device_flags, SIDEBAND_PID)),
            DeviceProperty::MvaSupported => Some(PropertyAddress::new(self.device_flags, MVA_PID)),
            DeviceProperty::EnumeratorName | DeviceProperty::DriverStack => None,
        }
    }
}

/// Pick the record list cached for `mode` out of a format table.
///
/// A mode absent from the table has no cached records.
pub fn select_mode_records(table: &[u8], mode: ProcessingMode) -> Result<Vec<u8>, DirectoryError> {
    let mut offset = 0;
    while offset < table.len() {
        let header = table
            .get(offset..offset + 20)
            .ok_or_else(|| malformed(format!("truncated entry header at offset {}", offset)))?;
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&header[..16]);
        let len = u32::from_le_bytes([header[16], header[17], header[18], header[19]]) as usize;
        let start = offset + 20;
        let body = table
            .get(start..start + len)
            .ok_or_else(|| malformed(format!("entry at offset {} overruns the table", offset)))?;
        if ProcessingMode::from_bytes_le(guid) == mode {
            return Ok(body.to_vec());
        }
        offset = start + len;
    }
    Ok(property_blob::encode_format_records(&[]))
}

/// Build a format table entry, the inverse of `select_mode_records`.
pub fn encode_mode_records(mode: ProcessingMode, records: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(20 + records.len());
    out.extend_from_slice(&mode.to_bytes_le());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(records);
    out
}

fn malformed(message: String) -> DirectoryError {
    DirectoryError::query_failed("read format table", message)
}
