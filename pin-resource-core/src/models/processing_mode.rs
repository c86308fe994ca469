use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An audio signal-processing mode (`AUDIO_SIGNALPROCESSINGMODE` GUID).
///
/// The nil GUID is the null mode: no processing applies. Loopback
/// connectors always report exactly this mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingMode(pub Uuid);

impl ProcessingMode {
    pub const NULL: Self = Self(Uuid::nil());
    pub const DEFAULT: Self = Self(Uuid::from_u128(0xc18e2f7e_933d_4965_b7d1_1eef228d2af3));
    pub const RAW: Self = Self(Uuid::from_u128(0x9e90ea20_b493_4fd1_a1a8_7e1361a956cf));
    pub const COMMUNICATIONS: Self = Self(Uuid::from_u128(0x98951333_b9cd_48b1_a0a3_ff40682d73f7));
    pub const SPEECH: Self = Self(Uuid::from_u128(0xfc1cfc9b_b9d6_4cfa_b5e0_4bb2166878b2));
    pub const MEDIA: Self = Self(Uuid::from_u128(0x4780004e_7133_41d8_8c74_660dadd2c0ee));
    pub const MOVIE: Self = Self(Uuid::from_u128(0xb26feb0d_ec94_477c_9494_d1ab8e753f6e));
    pub const NOTIFICATION: Self = Self(Uuid::from_u128(0x9cf2a70b_f377_403b_bd6b_360863e0355c));

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Short name for well-known modes.
    pub fn name(&self) -> Option<&'static str> {
        WELL_KNOWN_MODES
            .iter()
            .find(|(mode, _)| mode == self)
            .map(|(_, name)| *name)
    }

    /// GUID in its in-memory (mixed-endian) byte order.
    pub fn to_bytes_le(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    pub fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes_le(bytes))
    }
}

const WELL_KNOWN_MODES: [(ProcessingMode, &str); 8] = [
    (ProcessingMode::NULL, "none"),
    (ProcessingMode::DEFAULT, "default"),
    (ProcessingMode::RAW, "raw"),
    (ProcessingMode::COMMUNICATIONS, "communications"),
    (ProcessingMode::SPEECH, "speech"),
    (ProcessingMode::MEDIA, "media"),
    (ProcessingMode::MOVIE, "movie"),
    (ProcessingMode::NOTIFICATION, "notification"),
];

impl From<Uuid> for ProcessingMode {
    fn from(guid: Uuid) -> Self {
        Self(guid)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{{{}}}", self.0.hyphenated()),
        }
    }
}
