use crate::models::connector::ConnectorCategory;

/// Where a connector's processing modes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSource {
    /// Read from the endpoint property store.
    Cached,
    /// Asked of the driver.
    Live,
    /// Exactly one mode, the null mode.
    NullOnly,
}

/// Where a connector's supported format records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSource {
    /// Read from the endpoint property store, periodicity included.
    Cached,
    /// Candidate formats checked one by one against the driver.
    CheckCandidates,
    /// No independent format catalog.
    Empty,
}

/// What happens when the preferred format has no matching record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicitySource {
    /// The cache must contain it; a miss is `NotFound`.
    RecordsOnly,
    /// Fall back to asking the driver for that format.
    RecordsThenDiscover,
}

/// Data-source choices for one connector category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorStrategy {
    pub modes: ModeSource,
    pub formats: FormatSource,
    pub periodicity: PeriodicitySource,
}

const HOST_PROCESS: ConnectorStrategy = ConnectorStrategy {
    modes: ModeSource::Cached,
    formats: FormatSource::Cached,
    periodicity: PeriodicitySource::RecordsOnly,
};

const OFFLOAD: ConnectorStrategy = ConnectorStrategy {
    modes: ModeSource::Live,
    formats: FormatSource::CheckCandidates,
    periodicity: PeriodicitySource::RecordsThenDiscover,
};

// Loopback mirrors the host pin's format and applies no processing of its own.
const LOOPBACK: ConnectorStrategy = ConnectorStrategy {
    modes: ModeSource::NullOnly,
    formats: FormatSource::Empty,
    periodicity: PeriodicitySource::RecordsThenDiscover,
};

const KEYWORD_DETECTOR: ConnectorStrategy = HOST_PROCESS;

impl ConnectorCategory {
    pub fn strategy(&self) -> &'static ConnectorStrategy {
        match self {
            Self::HostProcess => &HOST_PROCESS,
            Self::Offload => &OFFLOAD,
            Self::Loopback => &LOOPBACK,
            Self::KeywordDetector => &KEYWORD_DETECTOR,
        }
    }
}
