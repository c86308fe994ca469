//! `DeviceDirectory` over the MMDevice API, endpoint property stores and
//! kernel-streaming pin properties.
//!
//! Cached facts come from the endpoint property store (see
//! `property_layout`). Live facts are asked of the KS filter the endpoint's
//! topology connects to, except periodicity, which the audio engine answers
//! through `IAudioClient3`.

use std::ffi::c_void;

use windows::core::{Interface, HSTRING, PWSTR};
use windows::Win32::Media::Audio::*;
use windows::Win32::Media::KernelStreaming::{IKsControl, KSIDENTIFIER};
use windows::Win32::System::Com::*;
use windows::Win32::UI::Shell::PropertiesSystem::IPropertyStore;

use pin_resource_core::codec::property_blob;
use pin_resource_core::{
    CachedPropertyKind, ConnectorCategory, ConnectorId, DataFlow, DeviceDirectory, DeviceProperty, DirectoryError,
    EndpointHandle, LiveRequest, Periodicity, ProcessingMode, PropertyValue, WaveFormat,
};

use crate::engine_stream::{self, EngineStream};
use crate::ks_request;
use crate::property_layout::{self, CachedPropertyLayout};
use crate::property_store::PropertyReader;

/// Audio device directory backed by `IMMDeviceEnumerator`.
pub struct MmDeviceDirectory {
    enumerator: IMMDeviceEnumerator,
    layout: CachedPropertyLayout,
}

impl MmDeviceDirectory {
    /// Create a directory using the default cached property layout.
    ///
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> Result<Self, DirectoryError> {
        Self::with_layout(CachedPropertyLayout::default())
    }

    pub fn with_layout(layout: CachedPropertyLayout) -> Result<Self, DirectoryError> {
        // SAFETY: plain COM activation; the caller has initialized COM.
        let enumerator: IMMDeviceEnumerator = unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
            .map_err(failed("CoCreateInstance(MMDeviceEnumerator)"))?;
        Ok(Self { enumerator, layout })
    }

    fn device(&self, endpoint: &EndpointHandle) -> Result<IMMDevice, DirectoryError> {
        // SAFETY: the id string outlives the call.
        unsafe { self.enumerator.GetDevice(&HSTRING::from(endpoint.id.as_str())) }
            .map_err(|_| DirectoryError::DeviceNotAvailable(endpoint.id.clone()))
    }

    fn endpoint_store(&self, endpoint: &EndpointHandle) -> Result<IPropertyStore, DirectoryError> {
        let device = self.device(endpoint)?;
        // SAFETY: read-only store on a live device.
        unsafe { device.OpenPropertyStore(STGM_READ) }.map_err(failed("OpenPropertyStore"))
    }

    /// The KS filter device that the endpoint's first topology connector
    /// is wired to.
    fn adapter(&self, endpoint: &EndpointHandle) -> Result<IMMDevice, DirectoryError> {
        let device = self.device(endpoint)?;
        // SAFETY: interfaces are reference counted; the connected-to id is
        // copied before its buffer is freed.
        unsafe {
            let topology: IDeviceTopology = device
                .Activate(CLSCTX_ALL, None)
                .map_err(failed("Activate(IDeviceTopology)"))?;
            let connector = topology.GetConnector(0).map_err(failed("GetConnector"))?;
            let connected = connector
                .GetDeviceIdConnectedTo()
                .map_err(failed("GetDeviceIdConnectedTo"))?;
            let adapter_id = take_string(connected);
            self.enumerator
                .GetDevice(&HSTRING::from(adapter_id.as_str()))
                .map_err(failed("GetDevice(adapter)"))
        }
    }

    fn adapter_store(&self, endpoint: &EndpointHandle) -> Result<IPropertyStore, DirectoryError> {
        let adapter = self.adapter(endpoint)?;
        // SAFETY: read-only store on a live device.
        unsafe { adapter.OpenPropertyStore(STGM_READ) }.map_err(failed("OpenPropertyStore(adapter)"))
    }

    fn ks_control(&self, endpoint: &EndpointHandle) -> Result<IKsControl, DirectoryError> {
        let adapter = self.adapter(endpoint)?;
        // SAFETY: plain interface activation on a live device.
        unsafe { adapter.Activate(CLSCTX_ALL, None) }.map_err(failed("Activate(IKsControl)"))
    }

    fn friendly_name(device: &IMMDevice, fallback: &str) -> String {
        // SAFETY: read-only store on a live device.
        let name = unsafe { device.OpenPropertyStore(STGM_READ) }
            .ok()
            .and_then(|store| PropertyReader::new(&store).string(property_layout::FRIENDLY_NAME).ok().flatten());
        name.unwrap_or_else(|| fallback.to_string())
    }

    fn proposed_format(&self, endpoint: &EndpointHandle, connector: ConnectorId, mode: ProcessingMode) -> Result<Vec<u8>, DirectoryError> {
        let control = self.ks_control(endpoint)?;
        let request = ks_request::proposed_format_request(connector.part(), mode);
        let data_format = ks_get(&control, &request).map_err(failed("KSPROPERTY_PIN_PROPOSEDATAFORMAT2"))?;
        if data_format.is_empty() {
            return Ok(Vec::new());
        }
        ks_request::wave_format_payload(&data_format)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                DirectoryError::query_failed(
                    "KSPROPERTY_PIN_PROPOSEDATAFORMAT2",
                    format!("data format of {} bytes has no wave format", data_format.len()),
                )
            })
    }

    /// Mode is not part of the `PROPOSEDATAFORMAT` set request; the pin
    /// answers for the format alone.
    fn format_supported(&self, endpoint: &EndpointHandle, connector: ConnectorId, format: &WaveFormat) -> Result<Vec<u8>, DirectoryError> {
        let control = self.ks_control(endpoint)?;
        let request = ks_request::format_support_request(connector.part());
        let data = ks_request::data_format_waveformatex(format);
        match ks_set(&control, &request, &data) {
            Ok(()) => Ok(property_blob::encode_support(true).to_vec()),
            Err(e) if ks_request::is_unsupported_status(e.code().0) => {
                log::debug!("Pin {} rejected {}: {}", connector, format, e);
                Ok(property_blob::encode_support(false).to_vec())
            }
            Err(e) => Err(failed("KSPROPERTY_PIN_PROPOSEDATAFORMAT")(e)),
        }
    }

    fn engine_periodicity(
        &self,
        endpoint: &EndpointHandle,
        mode: ProcessingMode,
        format: &WaveFormat,
        category: ConnectorCategory,
        data_flow: DataFlow,
    ) -> Result<Vec<u8>, DirectoryError> {
        let stream = EngineStream::plan(self.resolve_data_flow(endpoint)?, category, mode, data_flow)?;
        let device = self.device(endpoint)?;
        let wave = property_blob::encode_wave_format(format);
        let mut periodicity = Periodicity::default();
        // SAFETY: WAVEFORMATEX is packed, so the encoded bytes are a valid
        // (unaligned) format for the duration of the call.
        unsafe {
            let client: IAudioClient3 = device
                .Activate(CLSCTX_ALL, None)
                .map_err(failed("Activate(IAudioClient3)"))?;
            if let EngineStream::Shared { offload, raw } = stream {
                if offload || raw {
                    let properties = AudioClientProperties {
                        cbSize: std::mem::size_of::<AudioClientProperties>() as u32,
                        bIsOffload: offload.into(),
                        eCategory: if offload { AudioCategory_Media } else { AudioCategory_Other },
                        Options: if raw { AUDCLNT_STREAMOPTIONS_RAW } else { AUDCLNT_STREAMOPTIONS_NONE },
                    };
                    client
                        .SetClientProperties(&properties)
                        .map_err(failed("SetClientProperties"))?;
                }
            }
            client
                .GetSharedModeEnginePeriod(
                    wave.as_ptr() as *const WAVEFORMATEX,
                    &mut periodicity.default_frames,
                    &mut periodicity.fundamental_frames,
                    &mut periodicity.min_frames,
                    &mut periodicity.max_frames,
                )
                .map_err(failed("GetSharedModeEnginePeriod"))?;
        }
        let periodicity = match stream {
            EngineStream::Loopback => engine_stream::fixed_envelope(periodicity.default_frames),
            EngineStream::Shared { .. } => Periodicity {
                max_frames_extended: periodicity.max_frames,
                ..periodicity
            },
        };
        Ok(property_blob::encode_periodicity(&periodicity).to_vec())
    }
}

impl DeviceDirectory for MmDeviceDirectory {
    fn list_active_endpoints(&self) -> Result<Vec<EndpointHandle>, DirectoryError> {
        // SAFETY: collection items are reference counted; ids are copied
        // before their buffers are freed.
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eAll, DEVICE_STATE_ACTIVE)
                .map_err(failed("EnumAudioEndpoints"))?;
            let count = collection.GetCount().map_err(failed("GetCount"))?;

            let mut endpoints = Vec::with_capacity(count as usize);
            for index in 0..count {
                let device = collection.Item(index).map_err(failed("Item"))?;
                let id = take_string(device.GetId().map_err(failed("GetId"))?);
                let name = Self::friendly_name(&device, &id);
                endpoints.push(EndpointHandle::new(id, name));
            }
            log::debug!("{} active audio endpoints", endpoints.len());
            Ok(endpoints)
        }
    }

    fn resolve_data_flow(&self, endpoint: &EndpointHandle) -> Result<DataFlow, DirectoryError> {
        let device = self.device(endpoint)?;
        // SAFETY: plain interface query on a live device.
        let flow = unsafe {
            device
                .cast::<IMMEndpoint>()
                .map_err(failed("QueryInterface(IMMEndpoint)"))?
                .GetDataFlow()
                .map_err(failed("GetDataFlow"))?
        };
        match flow {
            f if f == eRender => Ok(DataFlow::Render),
            f if f == eCapture => Ok(DataFlow::Capture),
            other => Err(DirectoryError::query_failed(
                "GetDataFlow",
                format!("endpoint {} reports data flow {}", endpoint.id, other.0),
            )),
        }
    }

    fn resolve_connected_adapter_instance_id(&self, endpoint: &EndpointHandle) -> Result<String, DirectoryError> {
        let store = self.adapter_store(endpoint)?;
        PropertyReader::new(&store)
            .string(property_layout::INSTANCE_ID)?
            .ok_or_else(|| DirectoryError::query_failed("PKEY_Device_InstanceId", format!("no instance id behind {}", endpoint.id)))
    }

    fn find_connector(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
    ) -> Result<Option<ConnectorId>, DirectoryError> {
        let store = self.endpoint_store(endpoint)?;
        let id = PropertyReader::new(&store).u32(self.layout.connector_id(category))?;
        Ok(id.map(ConnectorId))
    }

    fn get_cached_property(
        &self,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
        kind: CachedPropertyKind,
    ) -> Result<Vec<u8>, DirectoryError> {
        let store = self.endpoint_store(endpoint)?;
        let reader = PropertyReader::new(&store);
        let (address, name) = match kind {
            CachedPropertyKind::DefaultFormat => (property_layout::ENGINE_DEVICE_FORMAT, "PKEY_AudioEngine_DeviceFormat"),
            CachedPropertyKind::ProcessingModes => (self.layout.modes(category), "cached processing modes"),
            CachedPropertyKind::FormatRecords(_) => (self.layout.format_table(category), "cached format table"),
        };
        let bytes = reader
            .blob(address)?
            .ok_or_else(|| DirectoryError::NotSupported(format!("{} on {} ({})", name, endpoint.id, category)))?;
        match kind {
            CachedPropertyKind::FormatRecords(mode) => property_layout::select_mode_records(&bytes, mode),
            _ => Ok(bytes),
        }
    }

    fn query_live_property(
        &self,
        endpoint: &EndpointHandle,
        connector: ConnectorId,
        request: &LiveRequest,
    ) -> Result<Vec<u8>, DirectoryError> {
        log::debug!("Live query on {} pin {}: {:?}", endpoint.id, connector, request);
        match request {
            LiveRequest::ProcessingModes => {
                let control = self.ks_control(endpoint)?;
                ks_get(&control, &ks_request::processing_modes_request(connector.part()))
                    .map_err(failed("KSPROPERTY_AUDIOSIGNALPROCESSING_MODES"))
            }
            LiveRequest::ProposedFormat { mode } => self.proposed_format(endpoint, connector, *mode),
            LiveRequest::FormatSupported { format, .. } => self.format_supported(endpoint, connector, format),
            LiveRequest::Periodicity {
                mode,
                format,
                category,
                data_flow,
            } => self.engine_periodicity(endpoint, *mode, format, *category, *data_flow),
        }
    }

    fn device_property(
        &self,
        endpoint: &EndpointHandle,
        property: DeviceProperty,
    ) -> Result<Option<PropertyValue>, DirectoryError> {
        match property {
            DeviceProperty::EnumeratorName => {
                let store = self.endpoint_store(endpoint)?;
                Ok(PropertyReader::new(&store)
                    .string(property_layout::ENUMERATOR_NAME)?
                    .map(PropertyValue::String))
            }
            DeviceProperty::DriverStack => {
                let store = self.adapter_store(endpoint)?;
                let reader = PropertyReader::new(&store);
                let mut stack = Vec::new();
                let mut found = false;
                for address in [property_layout::UPPER_FILTERS, property_layout::SERVICE, property_layout::LOWER_FILTERS] {
                    if let Some(entries) = reader.string_list(address)? {
                        found = true;
                        stack.extend(entries);
                    }
                }
                Ok(found.then_some(PropertyValue::StringList(stack)))
            }
            DeviceProperty::SidebandActivated | DeviceProperty::MvaSupported => {
                let Some(address) = self.layout.flag(property) else {
                    return Ok(None);
                };
                let store = self.endpoint_store(endpoint)?;
                Ok(PropertyReader::new(&store).bool(address)?.map(PropertyValue::Bool))
            }
        }
    }
}

/// Initializes COM (MTA) for the current thread and uninitializes on drop.
pub struct ComApartment;

impl ComApartment {
    pub fn enter() -> Result<Self, DirectoryError> {
        // SAFETY: balanced by CoUninitialize in Drop.
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(|e| DirectoryError::query_failed("CoInitializeEx", e.to_string()))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}

fn failed(operation: &'static str) -> impl Fn(windows::core::Error) -> DirectoryError {
    move |e| {
        if ks_request::is_unsupported_status(e.code().0) {
            DirectoryError::NotSupported(format!("{}: {}", operation, e))
        } else {
            DirectoryError::query_failed(operation, e.to_string())
        }
    }
}

/// Copy a COM-allocated string and free it.
unsafe fn take_string(value: PWSTR) -> String {
    let text = value.to_string().unwrap_or_default();
    CoTaskMemFree(Some(value.0 as *const _));
    text
}

/// Copy into 8-byte aligned storage; `KSIDENTIFIER` carries an `i64` member.
fn aligned(bytes: &[u8]) -> Vec<u64> {
    let mut words = vec![0u64; bytes.len().div_ceil(8)];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks(8)) {
        let mut buf = [0u8; 8];
        buf[..chunk.len()].copy_from_slice(chunk);
        *word = u64::from_le_bytes(buf);
    }
    words
}

/// Get a variable-size property: ask for the size, then fetch.
fn ks_get(control: &IKsControl, request: &[u8]) -> windows::core::Result<Vec<u8>> {
    let descriptor = aligned(request);
    let property = descriptor.as_ptr() as *const KSIDENTIFIER;
    let mut needed = 0u32;
    // SAFETY: descriptor and output buffers are live and sized as declared.
    unsafe {
        match control.KsProperty(property, request.len() as u32, std::ptr::null_mut(), 0, &mut needed) {
            Ok(()) => {}
            Err(e) if ks_request::is_more_data_status(e.code().0) => {}
            Err(e) => return Err(e),
        }
        if needed == 0 {
            return Ok(Vec::new());
        }
        let mut data = vec![0u64; (needed as usize).div_ceil(8)];
        let mut returned = 0u32;
        control.KsProperty(property, request.len() as u32, data.as_mut_ptr() as *mut c_void, needed, &mut returned)?;
        Ok(data
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .take(returned as usize)
            .collect())
    }
}

fn ks_set(control: &IKsControl, request: &[u8], data: &[u8]) -> windows::core::Result<()> {
    let descriptor = aligned(request);
    let mut payload = aligned(data);
    let mut returned = 0u32;
    // SAFETY: descriptor and payload buffers are live and sized as declared.
    unsafe {
        control.KsProperty(
            descriptor.as_ptr() as *const KSIDENTIFIER,
            request.len() as u32,
            payload.as_mut_ptr() as *mut c_void,
            data.len() as u32,
            &mut returned,
        )
    }
}
