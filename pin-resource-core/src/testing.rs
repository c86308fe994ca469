//! In-memory `DeviceDirectory` for unit tests.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::codec::property_blob;
use crate::models::connector::{ConnectorCategory, ConnectorId, DataFlow};
use crate::models::descriptor::EndpointHandle;
use crate::models::error::{CatalogError, DirectoryError};
use crate::models::format_record::{FormatRecord, Periodicity};
use crate::models::processing_mode::ProcessingMode;
use crate::models::resource::ResourceRecord;
use crate::models::wave_format::WaveFormat;
use crate::traits::device_directory::{
    CachedPropertyKind, DeviceDirectory, DeviceProperty, LiveRequest, PropertyValue,
};
use crate::traits::resource_sink::ResourceSink;

pub fn envelope(default_frames: u32) -> Periodicity {
    Periodicity {
        default_frames,
        fundamental_frames: 1,
        min_frames: 1,
        max_frames: default_frames * 2,
        max_frames_extended: default_frames * 4,
    }
}

pub struct FakeDevice {
    endpoint: EndpointHandle,
    data_flow: DataFlow,
    adapter_instance_id: Option<String>,
    connectors: HashMap<ConnectorCategory, ConnectorId>,
    default_format: Option<WaveFormat>,
    cached: HashMap<(ConnectorCategory, CachedPropertyKind), Vec<u8>>,
    live_modes: Option<Vec<ProcessingMode>>,
    proposals: HashMap<ProcessingMode, WaveFormat>,
    supported: Vec<WaveFormat>,
    periodicity: Vec<(WaveFormat, Periodicity)>,
    live_error: Option<DirectoryError>,
    properties: HashMap<DeviceProperty, PropertyValue>,
    property_errors: HashMap<DeviceProperty, DirectoryError>,
}

impl FakeDevice {
    fn new(endpoint: EndpointHandle, data_flow: DataFlow) -> Self {
        Self {
            endpoint,
            data_flow,
            adapter_instance_id: None,
            connectors: HashMap::new(),
            default_format: None,
            cached: HashMap::new(),
            live_modes: None,
            proposals: HashMap::new(),
            supported: Vec::new(),
            periodicity: Vec::new(),
            live_error: None,
            properties: HashMap::new(),
            property_errors: HashMap::new(),
        }
    }

    pub fn render(endpoint: EndpointHandle) -> Self {
        Self::new(endpoint, DataFlow::Render)
    }

    pub fn capture(endpoint: EndpointHandle) -> Self {
        Self::new(endpoint, DataFlow::Capture)
    }

    pub fn with_adapter_instance_id(mut self, id: &str) -> Self {
        self.adapter_instance_id = Some(id.to_string());
        self
    }

    pub fn with_connector(mut self, category: ConnectorCategory, id: u32) -> Self {
        self.connectors.insert(category, ConnectorId(id));
        self
    }

    pub fn with_default_format(mut self, format: WaveFormat) -> Self {
        self.default_format = Some(format);
        self
    }

    pub fn with_cached_modes(self, category: ConnectorCategory, modes: Vec<ProcessingMode>) -> Self {
        self.with_raw_cached(category, CachedPropertyKind::ProcessingModes, property_blob::encode_modes(&modes))
    }

    pub fn with_cached_records(
        self,
        category: ConnectorCategory,
        mode: ProcessingMode,
        records: Vec<FormatRecord>,
    ) -> Self {
        self.with_raw_cached(
            category,
            CachedPropertyKind::FormatRecords(mode),
            property_blob::encode_format_records(&records),
        )
    }

    pub fn with_raw_cached(mut self, category: ConnectorCategory, kind: CachedPropertyKind, bytes: Vec<u8>) -> Self {
        self.cached.insert((category, kind), bytes);
        self
    }

    pub fn with_live_modes(mut self, modes: Vec<ProcessingMode>) -> Self {
        self.live_modes = Some(modes);
        self
    }

    pub fn with_proposal(mut self, mode: ProcessingMode, format: WaveFormat) -> Self {
        self.proposals.insert(mode, format);
        self
    }

    pub fn with_supported(mut self, format: WaveFormat) -> Self {
        self.supported.push(format);
        self
    }

    pub fn with_periodicity(mut self, format: WaveFormat, periodicity: Periodicity) -> Self {
        self.periodicity.push((format, periodicity));
        self
    }

    pub fn failing_live(mut self, error: DirectoryError) -> Self {
        self.live_error = Some(error);
        self
    }

    pub fn with_property(mut self, property: DeviceProperty, value: PropertyValue) -> Self {
        self.properties.insert(property, value);
        self
    }

    pub fn failing_property(mut self, property: DeviceProperty, error: DirectoryError) -> Self {
        self.property_errors.insert(property, error);
        self
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    devices: Vec<FakeDevice>,
    live_requests: Mutex<Vec<LiveRequest>>,
    cached_reads: Mutex<Vec<(ConnectorCategory, CachedPropertyKind)>>,
    adapter_walks: Mutex<usize>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device: FakeDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Every live request issued so far, in order.
    pub fn live_requests(&self) -> Vec<LiveRequest> {
        self.live_requests.lock().clone()
    }

    pub fn cached_reads(&self) -> Vec<(ConnectorCategory, CachedPropertyKind)> {
        self.cached_reads.lock().clone()
    }

    pub fn adapter_walks(&self) -> usize {
        *self.adapter_walks.lock()
    }

    fn device(&self, endpoint: &EndpointHandle) -> Result<&FakeDevice, DirectoryError> {
        self.devices
            .iter()
            .find(|d| d.endpoint.id == endpoint.id)
            .ok_or_else(|| DirectoryError::DeviceNotAvailable(endpoint.id.clone()))
    }
}

impl DeviceDirectory for FakeDirectory {
    fn list_active_endpoints(&self) -> Result<Vec<EndpointHandle>, DirectoryError> {
        Ok(self.devices.iter().map(|d| d.endpoint.clone()).collect())
    }

    fn resolve_data_flow(&self, endpoint: &EndpointHandle) -> Result<DataFlow, DirectoryError> {
        Ok(self.device(endpoint)?.data_flow)
    }

    fn resolve_connected_adapter_instance_id(&self, endpoint: &EndpointHandle) -> Result<String, DirectoryError> {
        *self.adapter_walks.lock() += 1;
        self.device(endpoint)?
            .adapter_instance_id
            .clone()
            .ok_or_else(|| DirectoryError::query_failed("GetDeviceIdConnectedTo", "no adapter"))
    }

    fn find_connector(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
    ) -> Result<Option<ConnectorId>, DirectoryError> {
        Ok(self.device(endpoint)?.connectors.get(&category).copied())
    }

    fn get_cached_property(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
        kind: CachedPropertyKind,
    ) -> Result<Vec<u8>, DirectoryError> {
        self.cached_reads.lock().push((category, kind));
        let device = self.device(endpoint)?;
        if kind == CachedPropertyKind::DefaultFormat {
            if let Some(format) = &device.default_format {
                return Ok(property_blob::encode_wave_format(format));
            }
        }
        device
            .cached
            .get(&(category, kind))
            .cloned()
            .ok_or_else(|| DirectoryError::query_failed("GetValue", format!("{:?} not cached", kind)))
    }

    fn query_live_property(
        &self,
        endpoint: &EndpointHandle,
        _connector: ConnectorId,
        request: &LiveRequest,
    ) -> Result<Vec<u8>, DirectoryError> {
        self.live_requests.lock().push(request.clone());
        let device = self.device(endpoint)?;
        if let Some(error) = &device.live_error {
            return Err(error.clone());
        }
        match request {
            LiveRequest::ProcessingModes => device
                .live_modes
                .as_ref()
                .map(|modes| property_blob::encode_modes(modes))
                .ok_or_else(|| DirectoryError::NotSupported("processing modes".into())),
            LiveRequest::FormatSupported { format, .. } => {
                Ok(property_blob::encode_support(device.supported.contains(format)).to_vec())
            }
            LiveRequest::ProposedFormat { mode } => device
                .proposals
                .get(mode)
                .map(property_blob::encode_wave_format)
                .ok_or_else(|| DirectoryError::NotSupported("proposed format".into())),
            LiveRequest::Periodicity { format, .. } => device
                .periodicity
                .iter()
                .find(|(f, _)| f == format)
                .map(|(_, p)| property_blob::encode_periodicity(p).to_vec())
                .ok_or_else(|| DirectoryError::query_failed("GetSharedModeEnginePeriod", format!("no period for {}", format))),
        }
    }

    fn device_property(
        &self,
        endpoint: &EndpointHandle,
        property: DeviceProperty,
    ) -> Result<Option<PropertyValue>, DirectoryError> {
        let device = self.device(endpoint)?;
        if let Some(error) = device.property_errors.get(&property) {
            return Err(error.clone());
        }
        Ok(device.properties.get(&property).cloned())
    }
}

/// Sink that refuses every insert after `limit` records.
pub struct LimitedSink {
    pub records: Vec<ResourceRecord>,
    pub limit: usize,
}

impl ResourceSink for LimitedSink {
    fn add(&mut self, record: ResourceRecord) -> Result<(), CatalogError> {
        if self.records.len() >= self.limit {
            return Err(CatalogError::SinkRejected(record.name));
        }
        self.records.push(record);
        Ok(())
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}
