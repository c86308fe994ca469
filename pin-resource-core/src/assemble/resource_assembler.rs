use crate::classify::connector_classifier::ConnectorClassifier;
use crate::models::connector::{ConnectorCategory, DataFlow};
use crate::models::descriptor::{ConnectorDescriptor, EndpointHandle};
use crate::models::error::CatalogError;
use crate::models::processing_mode::ProcessingMode;
use crate::models::resource::ResourceRecord;
use crate::models::wave_format::WaveFormat;
use crate::query::connector_query::{ConnectorQuery, ConnectorTarget};
use crate::traits::device_directory::DeviceDirectory;
use crate::traits::resource_sink::ResourceSink;

/// Builds one resource per processing mode of a single connector.
pub struct ResourceAssembler<'a, D: DeviceDirectory + ?Sized> {
    query: ConnectorQuery<'a, D>,
    classifier: ConnectorClassifier<'a, D>,
}

impl<'a, D: DeviceDirectory + ?Sized> ResourceAssembler<'a, D> {
    pub fn new(directory: &'a D, offload_candidates: &'a [WaveFormat]) -> Self {
        Self {
            query: ConnectorQuery::new(directory, offload_candidates),
            classifier: ConnectorClassifier::new(directory),
        }
    }

    /// Add resources for the `category` connector of `endpoint`.
    ///
    /// Returns the number of records added; zero when the endpoint has no
    /// such connector. The first failure stops the connector: records for
    /// earlier modes stay in the sink, later modes are not attempted.
    pub fn add_resources_for_connector<S: ResourceSink + ?Sized>(
        &self,
        sink: &mut S,
        endpoint: &EndpointHandle,
        category: ConnectorCategory,
        data_flow: DataFlow,
    ) -> Result<usize, CatalogError> {
        let Some(target) = self.query.resolve_connector(endpoint, category, data_flow)? else {
            log::debug!("{} has no {} connector", endpoint.friendly_name, category);
            return Ok(0);
        };

        log::info!("Adding test resources for {} pin [{}]", category, target.id);

        let modes = self.query.processing_modes(&target)?;
        if modes.is_empty() {
            log::warn!("{} pin [{}] reports no processing modes", category, target.id);
        }

        for &mode in &modes {
            let descriptor = self.describe_mode(&target, &modes, mode)?;
            create_resource(sink, descriptor)?;
        }

        Ok(modes.len())
    }

    /// Resolve every per-mode fact into a self-contained descriptor.
    pub fn describe_mode(
        &self,
        target: &ConnectorTarget<'_>,
        modes: &[ProcessingMode],
        mode: ProcessingMode,
    ) -> Result<ConnectorDescriptor, CatalogError> {
        let format_records = self.query.supported_format_records(target, mode)?;
        let preferred_format = self.query.preferred_format(target, mode)?;
        let periodicity = self
            .query
            .preferred_periodicity(target, mode, &preferred_format, &format_records)?;
        let flags = self.classifier.classify(target.endpoint, target.category)?;

        log::debug!(
            "{} pin [{}] mode {}: {} formats, preferred {} (default period {} frames)",
            target.category,
            target.id,
            mode,
            format_records.len(),
            preferred_format,
            periodicity.default_frames
        );

        Ok(ConnectorDescriptor {
            endpoint_id: target.endpoint.id.clone(),
            endpoint_name: target.endpoint.friendly_name.clone(),
            data_flow: target.data_flow,
            category: target.category,
            connector_id: target.id,
            mode,
            modes: modes.to_vec(),
            format_records,
            preferred_format,
            periodicity,
            flags,
        })
    }
}

/// Give the descriptor an identity and insert it into the sink.
pub fn create_resource<S: ResourceSink + ?Sized>(sink: &mut S, descriptor: ConnectorDescriptor) -> Result<(), CatalogError> {
    let record = ResourceRecord::new(descriptor);
    let name = record.name.clone();
    sink.add(record)?;
    log::info!("Test resource ({}) added", name);
    Ok(())
}
