use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::connector::ConnectorCategory;
use super::error::CatalogError;
use super::wave_format::{WaveFormat, SPEAKER_FRONT_LEFT, SPEAKER_FRONT_RIGHT, SUBTYPE_PCM};

/// Configuration for a catalog build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfiguration {
    /// Restrict the walk to endpoints whose connected adapter has this
    /// device instance id (compared ASCII case-insensitively). None = all devices.
    pub target_instance_id: Option<String>,

    /// Formats checked against the driver for offload connectors.
    pub offload_candidates: Vec<WaveFormat>,

    /// Connector categories visited per endpoint. The walk always visits
    /// them in `ConnectorCategory::WALK_ORDER`, whatever order they are listed in.
    pub categories: Vec<ConnectorCategory>,
}

impl CatalogConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(id) = &self.target_instance_id {
            if id.trim().is_empty() {
                return Err("target instance id must not be empty".into());
            }
        }
        if self.categories.is_empty() {
            return Err("at least one connector category is required".into());
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return Err(format!("duplicate connector category: {}", category));
            }
        }
        if self.offload_candidates.is_empty() {
            return Err("offload candidate list must not be empty".into());
        }
        for format in &self.offload_candidates {
            format
                .validate()
                .map_err(|e| format!("malformed offload candidate {}: {}", format, e))?;
        }
        Ok(())
    }

    /// The configured categories in walk order.
    pub fn walk_categories(&self) -> impl Iterator<Item = ConnectorCategory> + '_ {
        ConnectorCategory::WALK_ORDER
            .into_iter()
            .filter(|category| self.categories.contains(category))
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CatalogError::ConfigurationFailed(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(CatalogError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)
            .map_err(|e| CatalogError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

impl Default for CatalogConfiguration {
    fn default() -> Self {
        Self {
            target_instance_id: None,
            offload_candidates: default_offload_candidates(),
            categories: ConnectorCategory::WALK_ORDER.to_vec(),
        }
    }
}

/// Stereo formats an offload engine is commonly asked to accept.
pub fn default_offload_candidates() -> Vec<WaveFormat> {
    let stereo = SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT;
    vec![
        WaveFormat::pcm(44100, 16, 2),
        WaveFormat::pcm(48000, 16, 2),
        WaveFormat::extensible(48000, 32, 24, 2, stereo, SUBTYPE_PCM),
        WaveFormat::ieee_float(48000, 2),
        WaveFormat::extensible(96000, 32, 24, 2, stereo, SUBTYPE_PCM),
    ]
}
