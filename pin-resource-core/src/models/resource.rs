use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::descriptor::ConnectorDescriptor;

/// A test resource: one addressable (endpoint, connector, mode) target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: Uuid,
    pub name: String,
    pub descriptor: ConnectorDescriptor,
}

impl ResourceRecord {
    /// Wrap a descriptor with a fresh identity and a display name.
    pub fn new(descriptor: ConnectorDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: resource_name(&descriptor),
            descriptor,
        }
    }
}

/// `"<endpoint> (<category>, <mode>) #<pin>"`
pub fn resource_name(descriptor: &ConnectorDescriptor) -> String {
    format!(
        "{} ({}, {}) #{}",
        descriptor.endpoint_name, descriptor.category, descriptor.mode, descriptor.connector_id
    )
}
