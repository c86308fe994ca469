use crate::models::error::CatalogError;
use crate::models::resource::ResourceRecord;

/// Append-only destination for built resources.
///
/// Inserts happen from a single writer in walk order.
pub trait ResourceSink {
    fn add(&mut self, record: ResourceRecord) -> Result<(), CatalogError>;

    fn count(&self) -> usize;
}
