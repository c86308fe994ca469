use crate::codec::property_blob;
use crate::models::connector::{ConnectorCategory, ConnectorId, DataFlow};
use crate::models::descriptor::EndpointHandle;
use crate::models::error::CatalogError;
use crate::models::format_record::{self, FormatRecord, Periodicity};
use crate::models::processing_mode::ProcessingMode;
use crate::models::wave_format::WaveFormat;
use crate::traits::device_directory::{CachedPropertyKind, DeviceDirectory, LiveRequest};

use super::strategy::{FormatSource, ModeSource, PeriodicitySource};

/// A connector that exists on an endpoint, with the direction its queries use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorTarget<'e> {
    pub endpoint: &'e EndpointHandle,
    pub category: ConnectorCategory,
    pub id: ConnectorId,
    pub data_flow: DataFlow,
}

/// Resolves connector facts, picking the data source per category strategy.
pub struct ConnectorQuery<'a, D: DeviceDirectory + ?Sized> {
    directory: &'a D,
    offload_candidates: &'a [WaveFormat],
}

impl<'a, D: DeviceDirectory + ?Sized> ConnectorQuery<'a, D> {
    pub fn new(directory: &'a D, offload_candidates: &'a [WaveFormat]) -> Self {
        Self {
            directory,
            offload_candidates,
        }
    }

    /// Find the connector of `category`. `Ok(None)` when the endpoint has none.
    pub fn resolve_connector<'e>(
        &self,
        endpoint: &'e EndpointHandle,
        category: ConnectorCategory,
        data_flow: DataFlow,
    ) -> Result<Option<ConnectorTarget<'e>>, CatalogError> {
        let id = self
            .directory
            .find_connector(endpoint, category)
            .map_err(CatalogError::query("find connector"))?;
        Ok(id.map(|id| ConnectorTarget {
            endpoint,
            category,
            id,
            data_flow,
        }))
    }

    pub fn processing_modes(&self, target: &ConnectorTarget<'_>) -> Result<Vec<ProcessingMode>, CatalogError> {
        match target.category.strategy().modes {
            ModeSource::Cached => {
                let bytes = self
                    .directory
                    .get_cached_property(target.endpoint, target.category, CachedPropertyKind::ProcessingModes)
                    .map_err(CatalogError::query("read cached processing modes"))?;
                property_blob::decode_modes(&bytes)
            }
            ModeSource::Live => {
                let bytes = self.live(target, &LiveRequest::ProcessingModes, "query processing modes")?;
                property_blob::decode_modes(&bytes)
            }
            ModeSource::NullOnly => Ok(vec![ProcessingMode::NULL]),
        }
    }

    /// The audio engine device format cached for the connector's endpoint.
    pub fn default_format(&self, target: &ConnectorTarget<'_>) -> Result<WaveFormat, CatalogError> {
        let bytes = self
            .directory
            .get_cached_property(target.endpoint, target.category, CachedPropertyKind::DefaultFormat)
            .map_err(CatalogError::query("read cached default format"))?;
        property_blob::decode_wave_format(&bytes)
    }

    pub fn supported_format_records(
        &self,
        target: &ConnectorTarget<'_>,
        mode: ProcessingMode,
    ) -> Result<Vec<FormatRecord>, CatalogError> {
        match target.category.strategy().formats {
            FormatSource::Cached => {
                let bytes = self
                    .directory
                    .get_cached_property(target.endpoint, target.category, CachedPropertyKind::FormatRecords(mode))
                    .map_err(CatalogError::query("read cached format records"))?;
                property_blob::decode_format_records(&bytes)
            }
            FormatSource::CheckCandidates => self.check_candidates(target, mode),
            FormatSource::Empty => Ok(Vec::new()),
        }
    }

    /// The driver's proposed format for `mode`, falling back to the default format.
    pub fn preferred_format(&self, target: &ConnectorTarget<'_>, mode: ProcessingMode) -> Result<WaveFormat, CatalogError> {
        let default_format = self.default_format(target)?;

        let request = LiveRequest::ProposedFormat { mode };
        let proposed = match self.directory.query_live_property(target.endpoint, target.id, &request) {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(property_blob::decode_wave_format(&bytes)?),
            Err(e) if e.is_not_supported() => {
                log::debug!("No proposed format for {} mode {}: {}", target.category, mode, e);
                None
            }
            Err(e) => return Err(CatalogError::query("query proposed format")(e)),
        };

        Ok(match proposed {
            Some(format) => format,
            None => default_format,
        })
    }

    /// Periodicity envelope for the preferred format.
    ///
    /// Taken from the structurally equal record when there is one. Otherwise
    /// cached categories fail with `NotFound`, and the others ask the driver.
    pub fn preferred_periodicity(
        &self,
        target: &ConnectorTarget<'_>,
        mode: ProcessingMode,
        preferred: &WaveFormat,
        records: &[FormatRecord],
    ) -> Result<Periodicity, CatalogError> {
        if let Some(periodicity) = format_record::find_periodicity(records, preferred) {
            return Ok(periodicity);
        }

        match target.category.strategy().periodicity {
            PeriodicitySource::RecordsOnly => Err(CatalogError::NotFound(format!(
                "preferred format {} for {} connector #{} mode {} is not among its {} supported formats",
                preferred,
                target.category,
                target.id,
                mode,
                records.len()
            ))),
            PeriodicitySource::RecordsThenDiscover => self.discover_periodicity(target, mode, preferred),
        }
    }

    pub fn discover_periodicity(
        &self,
        target: &ConnectorTarget<'_>,
        mode: ProcessingMode,
        format: &WaveFormat,
    ) -> Result<Periodicity, CatalogError> {
        let request = LiveRequest::Periodicity {
            mode,
            format: format.clone(),
            category: target.category,
            data_flow: target.data_flow,
        };
        let bytes = self.live(target, &request, "discover periodicity")?;
        property_blob::decode_periodicity(&bytes)
    }

    fn check_candidates(&self, target: &ConnectorTarget<'_>, mode: ProcessingMode) -> Result<Vec<FormatRecord>, CatalogError> {
        let mut records = Vec::new();
        for candidate in self.offload_candidates {
            let request = LiveRequest::FormatSupported {
                mode,
                format: candidate.clone(),
                data_flow: target.data_flow,
            };
            let supported = match self.directory.query_live_property(target.endpoint, target.id, &request) {
                Ok(bytes) => property_blob::decode_support(&bytes)?,
                Err(e) if e.is_not_supported() => false,
                Err(e) => return Err(CatalogError::query("query format support")(e)),
            };
            if !supported {
                log::debug!("{} connector #{} rejects {} in mode {}", target.category, target.id, candidate, mode);
                continue;
            }
            let periodicity = self.discover_periodicity(target, mode, candidate)?;
            records.push(FormatRecord::new(candidate.clone(), periodicity));
        }
        Ok(records)
    }

    fn live(&self, target: &ConnectorTarget<'_>, request: &LiveRequest, operation: &'static str) -> Result<Vec<u8>, CatalogError> {
        self.directory
            .query_live_property(target.endpoint, target.id, request)
            .map_err(CatalogError::query(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::DirectoryError;
    use crate::models::wave_format::{SPEAKER_FRONT_LEFT, SPEAKER_FRONT_RIGHT, SUBTYPE_PCM};
    use crate::testing::{envelope, FakeDevice, FakeDirectory};

    fn endpoint() -> EndpointHandle {
        EndpointHandle::new("{0.0.0.00000000}.{spk}", "Speakers")
    }

    fn target<'e>(endpoint: &'e EndpointHandle, category: ConnectorCategory, data_flow: DataFlow) -> ConnectorTarget<'e> {
        ConnectorTarget {
            endpoint,
            category,
            id: ConnectorId(1),
            data_flow,
        }
    }

    #[test]
    fn missing_connector_is_none() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let found = query
            .resolve_connector(&ep, ConnectorCategory::Offload, DataFlow::Render)
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn host_modes_come_from_cache() {
        let device = FakeDevice::render(endpoint()).with_cached_modes(
            ConnectorCategory::HostProcess,
            vec![ProcessingMode::DEFAULT, ProcessingMode::RAW],
        );
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let modes = query
            .processing_modes(&target(&ep, ConnectorCategory::HostProcess, DataFlow::Render))
            .unwrap();
        assert_eq!(modes, vec![ProcessingMode::DEFAULT, ProcessingMode::RAW]);
        assert!(directory.live_requests().is_empty());
    }

    #[test]
    fn offload_modes_come_from_driver() {
        let device = FakeDevice::render(endpoint()).with_live_modes(vec![ProcessingMode::DEFAULT]);
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let modes = query
            .processing_modes(&target(&ep, ConnectorCategory::Offload, DataFlow::Render))
            .unwrap();
        assert_eq!(modes, vec![ProcessingMode::DEFAULT]);
        assert_eq!(directory.live_requests(), vec![LiveRequest::ProcessingModes]);
    }

    #[test]
    fn loopback_has_only_the_null_mode_and_no_records() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let t = target(&ep, ConnectorCategory::Loopback, DataFlow::Capture);
        assert_eq!(query.processing_modes(&t).unwrap(), vec![ProcessingMode::NULL]);
        assert!(query.supported_format_records(&t, ProcessingMode::NULL).unwrap().is_empty());
        assert!(directory.live_requests().is_empty());
    }

    #[test]
    fn proposal_overrides_default_format() {
        let proposed = WaveFormat::extensible(48000, 32, 24, 2, SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT, SUBTYPE_PCM);
        let device = FakeDevice::render(endpoint())
            .with_default_format(WaveFormat::pcm(48000, 16, 2))
            .with_proposal(ProcessingMode::RAW, proposed.clone());
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let t = target(&ep, ConnectorCategory::HostProcess, DataFlow::Render);
        assert_eq!(query.preferred_format(&t, ProcessingMode::RAW).unwrap(), proposed);
        assert_eq!(
            query.preferred_format(&t, ProcessingMode::DEFAULT).unwrap(),
            WaveFormat::pcm(48000, 16, 2)
        );
    }

    #[test]
    fn proposal_failure_other_than_not_supported_propagates() {
        let device = FakeDevice::render(endpoint())
            .with_default_format(WaveFormat::pcm(48000, 16, 2))
            .failing_live(DirectoryError::DeviceNotAvailable("removed".into()));
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let t = target(&ep, ConnectorCategory::HostProcess, DataFlow::Render);
        let err = query.preferred_format(&t, ProcessingMode::RAW).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::QueryFailed {
                cause: DirectoryError::DeviceNotAvailable(_),
                ..
            }
        ));
    }

    #[test]
    fn cached_miss_is_not_found() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let records = vec![FormatRecord::new(WaveFormat::pcm(44100, 16, 2), envelope(441))];
        for category in [ConnectorCategory::HostProcess, ConnectorCategory::KeywordDetector] {
            let t = target(&ep, category, DataFlow::Capture);
            let err = query
                .preferred_periodicity(&t, ProcessingMode::DEFAULT, &WaveFormat::pcm(48000, 16, 2), &records)
                .unwrap_err();
            assert!(matches!(err, CatalogError::NotFound(_)));
        }
        assert!(directory.live_requests().is_empty());
    }

    #[test]
    fn cached_hit_uses_record_periodicity() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let records = vec![
            FormatRecord::new(WaveFormat::pcm(44100, 16, 2), envelope(441)),
            FormatRecord::new(WaveFormat::pcm(48000, 16, 2), envelope(480)),
        ];
        let t = target(&ep, ConnectorCategory::HostProcess, DataFlow::Render);
        let p = query
            .preferred_periodicity(&t, ProcessingMode::DEFAULT, &WaveFormat::pcm(48000, 16, 2), &records)
            .unwrap();
        assert_eq!(p, envelope(480));
    }

    #[test]
    fn offload_miss_discovers_periodicity() {
        let preferred = WaveFormat::ieee_float(48000, 2);
        let device = FakeDevice::render(endpoint()).with_periodicity(preferred.clone(), envelope(512));
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let t = target(&ep, ConnectorCategory::Offload, DataFlow::Render);
        let p = query
            .preferred_periodicity(&t, ProcessingMode::DEFAULT, &preferred, &[])
            .unwrap();
        assert_eq!(p, envelope(512));
        assert_eq!(
            directory.live_requests(),
            vec![LiveRequest::Periodicity {
                mode: ProcessingMode::DEFAULT,
                format: preferred,
                category: ConnectorCategory::Offload,
                data_flow: DataFlow::Render,
            }]
        );
    }

    #[test]
    fn offload_keeps_supported_candidates() {
        let candidates = vec![
            WaveFormat::pcm(44100, 16, 2),
            WaveFormat::pcm(48000, 16, 2),
            WaveFormat::ieee_float(48000, 2),
        ];
        let device = FakeDevice::render(endpoint())
            .with_supported(candidates[1].clone())
            .with_supported(candidates[2].clone())
            .with_periodicity(candidates[1].clone(), envelope(480))
            .with_periodicity(candidates[2].clone(), envelope(960));
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &candidates);
        let ep = endpoint();
        let t = target(&ep, ConnectorCategory::Offload, DataFlow::Render);
        let records = query.supported_format_records(&t, ProcessingMode::DEFAULT).unwrap();
        assert_eq!(
            records,
            vec![
                FormatRecord::new(candidates[1].clone(), envelope(480)),
                FormatRecord::new(candidates[2].clone(), envelope(960)),
            ]
        );
    }

    #[test]
    fn malformed_cached_modes_are_unexpected() {
        let device = FakeDevice::render(endpoint()).with_raw_cached(
            ConnectorCategory::HostProcess,
            CachedPropertyKind::ProcessingModes,
            vec![1, 2, 3],
        );
        let directory = FakeDirectory::new().with_device(device);
        let query = ConnectorQuery::new(&directory, &[]);
        let ep = endpoint();
        let err = query
            .processing_modes(&target(&ep, ConnectorCategory::HostProcess, DataFlow::Render))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unexpected(_)));
    }
}
