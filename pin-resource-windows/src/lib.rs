//! # pin-resource-windows
//!
//! Windows backend for pin-resource-core.
//!
//! Provides:
//! - `MmDeviceDirectory`: `DeviceDirectory` over MMDevice endpoints, their
//!   property stores and the KS filter each endpoint is connected to
//! - `ComApartment`: per-thread COM initialization guard
//! - `engine_stream`: which engine stream answers a periodicity query
//! - `ks_request` / `property_layout`: byte layouts for KS property
//!   requests and cached endpoint properties (portable, tested on any host)
//!
//! ## Usage
//! ```ignore
//! use pin_resource_core::{build_catalog, CatalogConfiguration};
//! use pin_resource_windows::{ComApartment, MmDeviceDirectory};
//!
//! let _com = ComApartment::enter()?;
//! let directory = MmDeviceDirectory::new()?;
//! let (records, summary) = build_catalog(&directory, &CatalogConfiguration::default())?;
//! ```

pub mod engine_stream;
pub mod ks_request;
pub mod property_layout;

#[cfg(target_os = "windows")]
pub mod mm_directory;
#[cfg(target_os = "windows")]
pub mod property_store;

pub use property_layout::{CachedPropertyLayout, PropertyAddress};

#[cfg(target_os = "windows")]
pub use mm_directory::{ComApartment, MmDeviceDirectory};
