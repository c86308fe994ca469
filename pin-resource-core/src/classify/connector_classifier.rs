//! Driver stack and transport classification of the device behind a connector.
//!
//! Each fact is read with its own query. A failed query fails the whole
//! classification; a missing property means the fact does not hold.

use crate::models::connector::{ClassifierFlags, ConnectorCategory};
use crate::models::descriptor::EndpointHandle;
use crate::models::error::CatalogError;
use crate::traits::device_directory::{DeviceDirectory, DeviceProperty, PropertyValue};

const PORT_CLS_MARKER: &str = "portcls";
const AV_STREAM_MARKER: &str = "avstream";
const BLUETOOTH_ENUMERATORS: [&str; 3] = ["BTHENUM", "BTHLEENUM", "BTHHFENUM"];

pub struct ConnectorClassifier<'a, D: DeviceDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: DeviceDirectory + ?Sized> ConnectorClassifier<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    pub fn classify(&self, endpoint: &EndpointHandle, category: ConnectorCategory) -> Result<ClassifierFlags, CatalogError> {
        Ok(ClassifierFlags {
            is_port_cls: self.is_port_cls(endpoint)?,
            is_av_stream: self.is_av_stream(endpoint)?,
            is_bluetooth: self.is_bluetooth(endpoint)?,
            is_sideband: self.is_sideband(endpoint)?,
            is_mva: self.is_mva(endpoint, category)?,
        })
    }

    pub fn is_port_cls(&self, endpoint: &EndpointHandle) -> Result<bool, CatalogError> {
        self.stack_contains(endpoint, PORT_CLS_MARKER)
    }

    pub fn is_av_stream(&self, endpoint: &EndpointHandle) -> Result<bool, CatalogError> {
        self.stack_contains(endpoint, AV_STREAM_MARKER)
    }

    pub fn is_bluetooth(&self, endpoint: &EndpointHandle) -> Result<bool, CatalogError> {
        let value = self.read(endpoint, DeviceProperty::EnumeratorName)?;
        match value {
            None => Ok(false),
            Some(PropertyValue::String(name)) => {
                let name = name.to_ascii_uppercase();
                Ok(BLUETOOTH_ENUMERATORS.iter().any(|e| name == *e))
            }
            Some(other) => Err(unexpected(DeviceProperty::EnumeratorName, &other)),
        }
    }

    pub fn is_sideband(&self, endpoint: &EndpointHandle) -> Result<bool, CatalogError> {
        self.read_bool(endpoint, DeviceProperty::SidebandActivated)
    }

    /// Only a keyword detector connector can be a multi-voice-assistant target.
    pub fn is_mva(&self, endpoint: &EndpointHandle, category: ConnectorCategory) -> Result<bool, CatalogError> {
        if category != ConnectorCategory::KeywordDetector {
            return Ok(false);
        }
        self.read_bool(endpoint, DeviceProperty::MvaSupported)
    }

    fn stack_contains(&self, endpoint: &EndpointHandle, marker: &str) -> Result<bool, CatalogError> {
        let value = self.read(endpoint, DeviceProperty::DriverStack)?;
        let entries = match value {
            None => return Ok(false),
            Some(PropertyValue::StringList(entries)) => entries,
            Some(PropertyValue::String(entry)) => vec![entry],
            Some(other) => return Err(unexpected(DeviceProperty::DriverStack, &other)),
        };
        Ok(entries
            .iter()
            .any(|entry| entry.to_ascii_lowercase().contains(marker)))
    }

    fn read_bool(&self, endpoint: &EndpointHandle, property: DeviceProperty) -> Result<bool, CatalogError> {
        match self.read(endpoint, property)? {
            None => Ok(false),
            Some(PropertyValue::Bool(value)) => Ok(value),
            Some(other) => Err(unexpected(property, &other)),
        }
    }

    fn read(&self, endpoint: &EndpointHandle, property: DeviceProperty) -> Result<Option<PropertyValue>, CatalogError> {
        self.directory
            .device_property(endpoint, property)
            .map_err(CatalogError::query("read device property"))
    }
}

fn unexpected(property: DeviceProperty, value: &PropertyValue) -> CatalogError {
    CatalogError::Unexpected(format!("{:?} has unexpected value {:?}", property, value))
}
