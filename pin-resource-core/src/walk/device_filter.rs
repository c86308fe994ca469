use crate::models::descriptor::EndpointHandle;
use crate::models::error::CatalogError;
use crate::traits::device_directory::DeviceDirectory;

/// Decides whether an endpoint belongs to the selected device adapter.
///
/// Has no effect on the directory beyond the topology reads it performs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    target_instance_id: Option<String>,
}

impl DeviceFilter {
    /// Accept every endpoint.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn instance_id(id: impl Into<String>) -> Self {
        Self {
            target_instance_id: Some(id.into()),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target_instance_id.as_deref()
    }

    /// Without a target this accepts without touching the directory.
    pub fn matches<D: DeviceDirectory + ?Sized>(
        &self,
        directory: &D,
        endpoint: &EndpointHandle,
    ) -> Result<bool, CatalogError> {
        let Some(target) = &self.target_instance_id else {
            return Ok(true);
        };
        let adapter_id = directory
            .resolve_connected_adapter_instance_id(endpoint)
            .map_err(CatalogError::query("resolve connected adapter"))?;
        Ok(instance_ids_match(target, &adapter_id))
    }
}

/// Device instance ids compare case-insensitively.
pub fn instance_ids_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, FakeDirectory};

    const REALTEK: &str = r"HDAUDIO\FUNC_01&VEN_10EC&DEV_0295&SUBSYS_10280A20&REV_1000\4&1A2B3C4D&0&0001";

    fn endpoint() -> EndpointHandle {
        EndpointHandle::new("{0.0.0.00000000}.{spk}", "Speakers")
    }

    #[test]
    fn unfiltered_accepts_without_topology_walk() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        assert!(DeviceFilter::all().matches(&directory, &endpoint()).unwrap());
        assert_eq!(directory.adapter_walks(), 0);
    }

    #[test]
    fn matches_ignoring_case() {
        let directory =
            FakeDirectory::new().with_device(FakeDevice::render(endpoint()).with_adapter_instance_id(REALTEK));
        let filter = DeviceFilter::instance_id(REALTEK.to_lowercase());
        assert!(filter.matches(&directory, &endpoint()).unwrap());
        assert_eq!(directory.adapter_walks(), 1);
    }

    #[test]
    fn other_adapter_is_rejected() {
        let directory =
            FakeDirectory::new().with_device(FakeDevice::render(endpoint()).with_adapter_instance_id(REALTEK));
        let filter = DeviceFilter::instance_id(r"USB\VID_046D&PID_0A44\5&2F3E");
        assert!(!filter.matches(&directory, &endpoint()).unwrap());
    }

    #[test]
    fn topology_failure_propagates() {
        let directory = FakeDirectory::new().with_device(FakeDevice::render(endpoint()));
        let err = DeviceFilter::instance_id(REALTEK)
            .matches(&directory, &endpoint())
            .unwrap_err();
        assert!(matches!(err, CatalogError::QueryFailed { .. }));
    }
}
