use crate::assemble::resource_assembler::ResourceAssembler;
use crate::models::config::CatalogConfiguration;
use crate::models::connector::{ConnectorCategory, DataFlow};
use crate::models::descriptor::EndpointHandle;
use crate::models::error::CatalogError;
use crate::models::resource::ResourceRecord;
use crate::sink::resource_list::ResourceList;
use crate::traits::device_directory::DeviceDirectory;
use crate::traits::resource_sink::ResourceSink;

use super::device_filter::DeviceFilter;

/// Outcome of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub endpoints_seen: usize,
    pub endpoints_selected: usize,
    pub resources_added: usize,
    pub target_instance_id: Option<String>,
}

impl WalkSummary {
    /// A device was requested but no endpoint belongs to it.
    pub fn is_empty_selection(&self) -> bool {
        self.target_instance_id.is_some() && self.endpoints_selected == 0
    }
}

/// Direction used for a connector's queries.
///
/// Loopback taps the capture-side copy of a render stream, so it always
/// uses capture.
pub fn connector_data_flow(category: ConnectorCategory, endpoint_flow: DataFlow) -> DataFlow {
    match category {
        ConnectorCategory::Loopback => DataFlow::Capture,
        _ => endpoint_flow,
    }
}

/// Walks active endpoints and builds resources for every connector category.
pub struct DeviceWalker<'a, D: DeviceDirectory + ?Sized> {
    directory: &'a D,
    config: &'a CatalogConfiguration,
    filter: DeviceFilter,
}

impl<'a, D: DeviceDirectory + ?Sized> DeviceWalker<'a, D> {
    pub fn new(directory: &'a D, config: &'a CatalogConfiguration) -> Result<Self, CatalogError> {
        config.validate().map_err(CatalogError::ConfigurationFailed)?;
        let filter = match &config.target_instance_id {
            Some(id) => DeviceFilter::instance_id(id.clone()),
            None => DeviceFilter::all(),
        };
        Ok(Self {
            directory,
            config,
            filter,
        })
    }

    /// Build resources for every selected endpoint into `sink`.
    ///
    /// Stops at the first error; the sink then holds a partial catalog
    /// that callers should discard.
    pub fn walk<S: ResourceSink + ?Sized>(&self, sink: &mut S) -> Result<WalkSummary, CatalogError> {
        let endpoints = self
            .directory
            .list_active_endpoints()
            .map_err(CatalogError::query("list active endpoints"))?;

        if endpoints.is_empty() {
            log::error!("No device was found!");
            return Err(CatalogError::NoDevicesFound);
        }

        if let Some(target) = self.filter.target() {
            log::info!("Selected device ID: {}", target);
        }
        log::info!("Found {} viable endpoint(s)!", endpoints.len());

        let mut summary = WalkSummary {
            endpoints_seen: endpoints.len(),
            target_instance_id: self.filter.target().map(str::to_string),
            ..Default::default()
        };

        for endpoint in &endpoints {
            let data_flow = self
                .directory
                .resolve_data_flow(endpoint)
                .map_err(CatalogError::query("resolve data flow"))?;

            if !self.filter.matches(self.directory, endpoint)? {
                log::debug!("Skipping {} ({}): not on the selected device", endpoint.friendly_name, endpoint.id);
                continue;
            }
            summary.endpoints_selected += 1;

            log::info!("Device: {} ({})", endpoint.friendly_name, endpoint.id);
            summary.resources_added += self
                .add_resources_for_device(sink, endpoint, data_flow)
                .inspect_err(|e| log::error!("Building resources for {} failed: {}", endpoint.friendly_name, e))?;
        }

        if summary.is_empty_selection() {
            log::warn!(
                "No endpoint belongs to the selected device {}",
                summary.target_instance_id.as_deref().unwrap_or_default()
            );
        }
        log::info!("Enumerated {} resources", sink.count());

        Ok(summary)
    }

    /// Build resources for each configured connector category of one endpoint.
    pub fn add_resources_for_device<S: ResourceSink + ?Sized>(
        &self,
        sink: &mut S,
        endpoint: &EndpointHandle,
        data_flow: DataFlow,
    ) -> Result<usize, CatalogError> {
        let assembler = ResourceAssembler::new(self.directory, &self.config.offload_candidates);
        let mut added = 0;
        for category in self.config.walk_categories() {
            added += assembler.add_resources_for_connector(
                sink,
                endpoint,
                category,
                connector_data_flow(category, data_flow),
            )?;
        }
        Ok(added)
    }
}

/// Walk `directory` into a fresh resource list.
pub fn build_catalog<D: DeviceDirectory + ?Sized>(
    directory: &D,
    config: &CatalogConfiguration,
) -> Result<(Vec<ResourceRecord>, WalkSummary), CatalogError> {
    let walker = DeviceWalker::new(directory, config)?;
    let mut list = ResourceList::new();
    let summary = walker.walk(&mut list)?;
    Ok((list.into_records(), summary))
}
