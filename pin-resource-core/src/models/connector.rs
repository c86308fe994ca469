use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of logical connector ("pin") exposed by an audio endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorCategory {
    HostProcess,
    Offload,
    Loopback,
    KeywordDetector,
}

impl ConnectorCategory {
    /// Order in which a device's connectors are walked.
    pub const WALK_ORDER: [ConnectorCategory; 4] = [
        ConnectorCategory::HostProcess,
        ConnectorCategory::Offload,
        ConnectorCategory::Loopback,
        ConnectorCategory::KeywordDetector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostProcess => "host",
            Self::Offload => "offload",
            Self::Loopback => "loopback",
            Self::KeywordDetector => "keyword detector",
        }
    }
}

impl fmt::Display for ConnectorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an endpoint's audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFlow {
    Render,
    Capture,
}

impl fmt::Display for DataFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Capture => f.write_str("capture"),
        }
    }
}

/// Kernel-streaming pin id of a connector, possibly tagged with high-order part bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(pub u32);

impl ConnectorId {
    /// `PARTID_MASK`: low bits carrying the local part number.
    pub const PART_MASK: u32 = 0x0000_ffff;

    pub fn part(&self) -> u32 {
        self.0 & Self::PART_MASK
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.part())
    }
}

/// Driver stack and transport facts about the device behind a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClassifierFlags {
    pub is_port_cls: bool,
    pub is_av_stream: bool,
    pub is_bluetooth: bool,
    pub is_sideband: bool,
    pub is_mva: bool,
}
