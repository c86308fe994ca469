use serde::{Deserialize, Serialize};

use super::connector::{ClassifierFlags, ConnectorCategory, ConnectorId, DataFlow};
use super::format_record::{FormatRecord, Periodicity};
use super::processing_mode::ProcessingMode;
use super::wave_format::WaveFormat;

/// An active audio endpoint as listed by a `DeviceDirectory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointHandle {
    /// Endpoint id string, e.g. `{0.0.0.00000000}.{guid}`.
    pub id: String,
    pub friendly_name: String,
}

impl EndpointHandle {
    pub fn new(id: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            friendly_name: friendly_name.into(),
        }
    }
}

/// Everything resolved for one (endpoint, connector, mode) combination.
///
/// Owns its mode list, format records and preferred format outright; each
/// descriptor is built fresh for its mode and never shares buffers with
/// another descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorDescriptor {
    pub endpoint_id: String,
    pub endpoint_name: String,
    pub data_flow: DataFlow,
    pub category: ConnectorCategory,
    pub connector_id: ConnectorId,
    pub mode: ProcessingMode,
    pub modes: Vec<ProcessingMode>,
    pub format_records: Vec<FormatRecord>,
    pub preferred_format: WaveFormat,
    pub periodicity: Periodicity,
    pub flags: ClassifierFlags,
}

impl ConnectorDescriptor {
    /// Total number of modes the connector supports.
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Whether the preferred format is one of the connector's explicitly supported records.
    pub fn preferred_is_enumerated(&self) -> bool {
        self.format_records
            .iter()
            .any(|record| record.format == self.preferred_format)
    }
}
