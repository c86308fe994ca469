use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::error::CatalogError;
use crate::models::resource::ResourceRecord;

/// A serialized resource catalog, as handed to downstream test runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub id: String,
    pub generated_at: String,
    pub target_instance_id: Option<String>,
    pub records: Vec<ResourceRecord>,
}

impl CatalogSnapshot {
    pub fn new(records: Vec<ResourceRecord>, target_instance_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            target_instance_id,
            records,
        }
    }
}

/// Write the snapshot as pretty JSON and return the SHA-256 hex digest of the file contents.
pub fn write_catalog(snapshot: &CatalogSnapshot, path: &Path) -> Result<String, CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CatalogError::StorageError(format!("failed to create directory: {}", e)))?;
    }
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| CatalogError::StorageError(format!("failed to serialize catalog: {}", e)))?;
    fs::write(path, json.as_bytes())
        .map_err(|e| CatalogError::StorageError(format!("failed to write catalog: {}", e)))?;
    Ok(checksum(json.as_bytes()))
}

pub fn read_catalog(path: &Path) -> Result<CatalogSnapshot, CatalogError> {
    let json = fs::read_to_string(path)
        .map_err(|e| CatalogError::StorageError(format!("failed to read catalog: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CatalogError::StorageError(format!("failed to parse catalog: {}", e)))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{:02x}", b)).collect()
}
