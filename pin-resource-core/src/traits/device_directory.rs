use crate::models::connector::{ConnectorCategory, ConnectorId, DataFlow};
use crate::models::descriptor::EndpointHandle;
use crate::models::error::DirectoryError;
use crate::models::processing_mode::ProcessingMode;
use crate::models::wave_format::WaveFormat;

/// Values cached in an endpoint's property store at install / first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedPropertyKind {
    /// The audio engine device format (a wave format payload).
    DefaultFormat,
    /// Processing modes supported by the connector (mode list payload).
    ProcessingModes,
    /// Format records supported by the connector in one mode (record list payload).
    FormatRecords(ProcessingMode),
}

/// A property query answered live by the driver for one connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveRequest {
    /// Processing modes the connector supports (mode list payload).
    ProcessingModes,
    /// Whether the connector accepts `format` in `mode` (support answer payload).
    FormatSupported {
        mode: ProcessingMode,
        format: WaveFormat,
        data_flow: DataFlow,
    },
    /// The format the driver proposes for `mode` (wave format payload).
    ///
    /// A driver without a proposal answers `DirectoryError::NotSupported`
    /// or an empty payload.
    ProposedFormat { mode: ProcessingMode },
    /// Buffer periodicity the engine allows for `format` (periodicity payload).
    ///
    /// `category` and `data_flow` select the stream the engine is asked
    /// about: an offload stream, or the capture side of a loopback tap on a
    /// render endpoint. A directory that cannot open such a stream answers
    /// `DirectoryError::NotSupported`.
    Periodicity {
        mode: ProcessingMode,
        format: WaveFormat,
        category: ConnectorCategory,
        data_flow: DataFlow,
    },
}

/// Device-level facts used to classify a device's driver stack and transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceProperty {
    /// Bus enumerator of the adapter devnode (e.g. `HDAUDIO`, `BTHENUM`).
    EnumeratorName,
    /// Driver and filter modules stacked on the adapter devnode.
    DriverStack,
    /// Whether the endpoint is activated through a sideband interface.
    SidebandActivated,
    /// Whether the keyword detector supports multiple voice assistants.
    MvaSupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    String(String),
    StringList(Vec<String>),
    Bool(bool),
}

/// The platform's audio device substrate.
///
/// Every call blocks until the underlying device, topology, property
/// store or driver query completes.
pub trait DeviceDirectory {
    /// List active render and capture endpoints, in directory order.
    fn list_active_endpoints(&self) -> Result<Vec<EndpointHandle>, DirectoryError>;

    fn resolve_data_flow(&self, endpoint: &EndpointHandle) -> Result<DataFlow, DirectoryError>;

    /// Walk the endpoint's topology to the device adapter it is connected to
    /// and return that adapter's device instance id.
    fn resolve_connected_adapter_instance_id(&self, endpoint: &EndpointHandle) -> Result<String, DirectoryError>;

    /// Find the connector of `category` on the endpoint, if it has one.
    fn find_connector(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
    ) -> Result<Option<ConnectorId>, DirectoryError>;

    fn get_cached_property(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
        kind: CachedPropertyKind,
    ) -> Result<Vec<u8>, DirectoryError>;

    fn query_live_property(
        &self,
        endpoint: &EndpointHandle,
        connector: ConnectorId,
        request: &LiveRequest,
    ) -> Result<Vec<u8>, DirectoryError>;

    /// Read a classification fact; `None` when the device does not carry it.
    fn device_property(
        &self,
        endpoint: &EndpointHandle,
        property: DeviceProperty,
    ) -> Result<Option<PropertyValue>, DirectoryError>;
}
