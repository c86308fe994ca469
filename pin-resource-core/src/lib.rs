//! # pin-resource-core
//!
//! Platform-agnostic discovery of audio endpoint connectors ("pins") and
//! the test resources built from them.
//!
//! For every active endpoint, each connector category (host process,
//! offload, loopback, keyword detector) is resolved to its processing
//! modes, supported formats, preferred format and buffer periodicity.
//! One `ResourceRecord` is produced per (endpoint, connector, mode).
//! Platform backends implement `DeviceDirectory`.
//!
//! ## Architecture
//!
//! ```text
//! pin-resource-core (this crate)
//! ├── models/    ← WaveFormat, FormatRecord, ProcessingMode, descriptors, errors, config
//! ├── traits/    ← DeviceDirectory, ResourceSink
//! ├── codec/     ← property payload byte layouts
//! ├── query/     ← per-category strategy table, ConnectorQuery
//! ├── classify/  ← ConnectorClassifier
//! ├── assemble/  ← ResourceAssembler
//! ├── walk/      ← DeviceWalker, DeviceFilter
//! ├── sink/      ← ResourceList, SharedResourceList
//! └── storage/   ← catalog JSON export
//! ```

pub mod assemble;
pub mod classify;
pub mod codec;
pub mod models;
pub mod query;
pub mod sink;
pub mod storage;
pub mod traits;
pub mod walk;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use assemble::resource_assembler::ResourceAssembler;
pub use classify::connector_classifier::ConnectorClassifier;
pub use models::config::CatalogConfiguration;
pub use models::connector::{ClassifierFlags, ConnectorCategory, ConnectorId, DataFlow};
pub use models::descriptor::{ConnectorDescriptor, EndpointHandle};
pub use models::error::{CatalogError, DirectoryError};
pub use models::format_record::{FormatRecord, Periodicity};
pub use models::processing_mode::ProcessingMode;
pub use models::resource::ResourceRecord;
pub use models::wave_format::{SampleFormat, WaveFormat};
pub use query::connector_query::{ConnectorQuery, ConnectorTarget};
pub use sink::resource_list::{ResourceList, SharedResourceList};
pub use storage::catalog::CatalogSnapshot;
pub use traits::device_directory::{CachedPropertyKind, DeviceDirectory, DeviceProperty, LiveRequest, PropertyValue};
pub use traits::resource_sink::ResourceSink;
pub use walk::device_filter::DeviceFilter;
pub use walk::device_walker::{build_catalog, DeviceWalker, WalkSummary};
