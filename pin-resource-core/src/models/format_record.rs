use serde::{Deserialize, Serialize};

use super::wave_format::WaveFormat;

/// Legal buffer periods for one format on one connector, all in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Periodicity {
    pub default_frames: u32,
    pub fundamental_frames: u32,
    pub min_frames: u32,
    pub max_frames: u32,
    pub max_frames_extended: u32,
}

impl Periodicity {
    /// Checks the envelope is ordered and aligned to its fundamental period.
    pub fn validate(&self) -> Result<(), String> {
        if self.fundamental_frames == 0 {
            return Err("fundamental period must be positive".into());
        }
        if self.min_frames > self.default_frames || self.default_frames > self.max_frames {
            return Err(format!(
                "default period {} outside [{}, {}]",
                self.default_frames, self.min_frames, self.max_frames
            ));
        }
        if self.max_frames_extended < self.max_frames {
            return Err(format!(
                "extended max {} below max {}",
                self.max_frames_extended, self.max_frames
            ));
        }
        if self.min_frames % self.fundamental_frames != 0 {
            return Err(format!(
                "min period {} is not a multiple of fundamental {}",
                self.min_frames, self.fundamental_frames
            ));
        }
        Ok(())
    }
}

/// A format a connector explicitly supports, with its periodicity envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRecord {
    pub format: WaveFormat,
    pub periodicity: Periodicity,
}

impl FormatRecord {
    pub fn new(format: WaveFormat, periodicity: Periodicity) -> Self {
        Self { format, periodicity }
    }
}

/// Look up the periodicity of the record whose format is structurally equal to `format`.
pub fn find_periodicity(records: &[FormatRecord], format: &WaveFormat) -> Option<Periodicity> {
    records
        .iter()
        .find(|record| record.format == *format)
        .map(|record| record.periodicity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(default_frames: u32) -> Periodicity {
        Periodicity {
            default_frames,
            fundamental_frames: 16,
            min_frames: 160,
            max_frames: 960,
            max_frames_extended: 1920,
        }
    }

    #[test]
    fn finds_matching_record() {
        let records = vec![
            FormatRecord::new(WaveFormat::pcm(44100, 16, 2), envelope(441)),
            FormatRecord::new(WaveFormat::pcm(48000, 16, 2), envelope(480)),
        ];
        let found = find_periodicity(&records, &WaveFormat::pcm(48000, 16, 2));
        assert_eq!(found, Some(envelope(480)));
    }

    #[test]
    fn miss_returns_none() {
        let records = vec![FormatRecord::new(WaveFormat::pcm(44100, 16, 2), envelope(441))];
        assert_eq!(find_periodicity(&records, &WaveFormat::ieee_float(48000, 2)), None);
        assert_eq!(find_periodicity(&[], &WaveFormat::ieee_float(48000, 2)), None);
    }

    #[test]
    fn validate_envelope() {
        assert!(envelope(480).validate().is_ok());
        assert!(envelope(2000).validate().is_err());

        let mut zero = envelope(480);
        zero.fundamental_frames = 0;
        assert!(zero.validate().is_err());

        let mut short_extended = envelope(480);
        short_extended.max_frames_extended = 100;
        assert!(short_extended.validate().is_err());
    }
}
