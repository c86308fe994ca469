use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::error::CatalogError;
use crate::models::resource::ResourceRecord;
use crate::traits::resource_sink::ResourceSink;

/// In-order list of built resources for a single-threaded walk.
#[derive(Debug, Default)]
pub struct ResourceList {
    records: Vec<ResourceRecord>,
    ids: HashSet<Uuid>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ResourceRecord> {
        self.records
    }
}

impl ResourceSink for ResourceList {
    fn add(&mut self, record: ResourceRecord) -> Result<(), CatalogError> {
        if !self.ids.insert(record.id) {
            return Err(CatalogError::SinkRejected(format!("duplicate resource id {}", record.id)));
        }
        self.records.push(record);
        Ok(())
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}

/// Resource list shared between walkers running on several threads.
///
/// Clones share the same underlying list; each insert takes the lock once.
#[derive(Debug, Clone, Default)]
pub struct SharedResourceList {
    inner: Arc<Mutex<ResourceList>>,
}

impl SharedResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records inserted so far.
    pub fn snapshot(&self) -> Vec<ResourceRecord> {
        self.inner.lock().records().to_vec()
    }
}

impl ResourceSink for SharedResourceList {
    fn add(&mut self, record: ResourceRecord) -> Result<(), CatalogError> {
        self.inner.lock().add(record)
    }

    fn count(&self) -> usize {
        self.inner.lock().count()
    }
}
