use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `WAVE_FORMAT_PCM`
pub const FORMAT_TAG_PCM: u16 = 0x0001;
/// `WAVE_FORMAT_IEEE_FLOAT`
pub const FORMAT_TAG_IEEE_FLOAT: u16 = 0x0003;
/// `WAVE_FORMAT_EXTENSIBLE`
pub const FORMAT_TAG_EXTENSIBLE: u16 = 0xFFFE;

/// `KSDATAFORMAT_SUBTYPE_PCM`
pub const SUBTYPE_PCM: Uuid = Uuid::from_u128(0x00000001_0000_0010_8000_00aa00389b71);
/// `KSDATAFORMAT_SUBTYPE_IEEE_FLOAT`
pub const SUBTYPE_IEEE_FLOAT: Uuid = Uuid::from_u128(0x00000003_0000_0010_8000_00aa00389b71);

pub const SPEAKER_FRONT_LEFT: u32 = 0x1;
pub const SPEAKER_FRONT_RIGHT: u32 = 0x2;
pub const SPEAKER_FRONT_CENTER: u32 = 0x4;

/// Size of the extensible payload: valid bits (2) + channel mask (4) + sub-format (16).
pub const EXTENSIBLE_PAYLOAD_SIZE: usize = 22;

/// Sample encoding of a wave format, resolved through the extensible sub-format if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Pcm,
    Float,
    Other,
}

/// A wave format as advertised by an audio connector.
///
/// Mirrors the `WAVEFORMATEX` header plus its `cbSize` trailing payload.
/// Values are immutable once built. Equality is exact field equality,
/// extension bytes included, so two formats that would merely be
/// "compatible" (e.g. PCM vs. extensible PCM of the same shape) compare
/// unequal. `Clone` is a deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveFormat {
    format_tag: u16,
    channels: u16,
    sample_rate: u32,
    avg_bytes_per_sec: u32,
    block_align: u16,
    bits_per_sample: u16,
    extension: Vec<u8>,
}

impl WaveFormat {
    /// Build a format from raw header fields, as decoded off the wire.
    pub fn from_parts(
        format_tag: u16,
        channels: u16,
        sample_rate: u32,
        avg_bytes_per_sec: u32,
        block_align: u16,
        bits_per_sample: u16,
        extension: Vec<u8>,
    ) -> Self {
        Self {
            format_tag,
            channels,
            sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            extension,
        }
    }

    /// Integer PCM with a plain `WAVEFORMATEX` header.
    pub fn pcm(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self::basic(FORMAT_TAG_PCM, sample_rate, bits_per_sample, channels)
    }

    /// 32-bit IEEE float with a plain `WAVEFORMATEX` header.
    pub fn ieee_float(sample_rate: u32, channels: u16) -> Self {
        Self::basic(FORMAT_TAG_IEEE_FLOAT, sample_rate, 32, channels)
    }

    /// `WAVEFORMATEXTENSIBLE` with an explicit container size, valid bits and speaker mask.
    pub fn extensible(
        sample_rate: u32,
        container_bits: u16,
        valid_bits: u16,
        channels: u16,
        channel_mask: u32,
        sub_format: Uuid,
    ) -> Self {
        let block_align = block_align_for(channels, container_bits);
        let mut extension = Vec::with_capacity(EXTENSIBLE_PAYLOAD_SIZE);
        extension.extend_from_slice(&valid_bits.to_le_bytes());
        extension.extend_from_slice(&channel_mask.to_le_bytes());
        extension.extend_from_slice(&sub_format.to_bytes_le());
        Self {
            format_tag: FORMAT_TAG_EXTENSIBLE,
            channels,
            sample_rate,
            avg_bytes_per_sec: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample: container_bits,
            extension,
        }
    }

    fn basic(format_tag: u16, sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        let block_align = block_align_for(channels, bits_per_sample);
        Self {
            format_tag,
            channels,
            sample_rate,
            avg_bytes_per_sec: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample,
            extension: Vec::new(),
        }
    }

    /// Checks the header is self-consistent and encodable.
    ///
    /// Constructors saturate derived fields on overflow; such formats fail here.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels == 0 || self.sample_rate == 0 || self.bits_per_sample == 0 {
            return Err("channels, sample rate and bits per sample must be positive".into());
        }
        if self.extension.len() > u16::MAX as usize {
            return Err(format!("extension of {} bytes exceeds cbSize", self.extension.len()));
        }
        let block_align = self.channels as u32 * self.bits_per_sample as u32 / 8;
        if block_align != self.block_align as u32 {
            return Err(format!("block align {} should be {}", self.block_align, block_align));
        }
        let avg_bytes_per_sec = self.sample_rate as u64 * block_align as u64;
        if avg_bytes_per_sec != self.avg_bytes_per_sec as u64 {
            return Err(format!(
                "byte rate {} should be {}",
                self.avg_bytes_per_sec, avg_bytes_per_sec
            ));
        }
        Ok(())
    }

    pub fn format_tag(&self) -> u16 {
        self.format_tag
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn avg_bytes_per_sec(&self) -> u32 {
        self.avg_bytes_per_sec
    }

    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    /// Container bit depth.
    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Raw `cbSize` payload following the header.
    pub fn extension(&self) -> &[u8] {
        &self.extension
    }

    pub fn is_extensible(&self) -> bool {
        self.format_tag == FORMAT_TAG_EXTENSIBLE && self.extension.len() >= EXTENSIBLE_PAYLOAD_SIZE
    }

    /// Valid bits per sample; equals the container depth for non-extensible formats.
    pub fn valid_bits_per_sample(&self) -> u16 {
        if self.is_extensible() {
            u16::from_le_bytes([self.extension[0], self.extension[1]])
        } else {
            self.bits_per_sample
        }
    }

    /// Speaker position mask, only carried by extensible formats.
    pub fn channel_mask(&self) -> Option<u32> {
        if !self.is_extensible() {
            return None;
        }
        let e = &self.extension;
        Some(u32::from_le_bytes([e[2], e[3], e[4], e[5]]))
    }

    pub fn sub_format(&self) -> Option<Uuid> {
        if !self.is_extensible() {
            return None;
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&self.extension[6..22]);
        Some(Uuid::from_bytes_le(guid))
    }

    pub fn sample_format(&self) -> SampleFormat {
        match (self.format_tag, self.sub_format()) {
            (FORMAT_TAG_PCM, _) => SampleFormat::Pcm,
            (FORMAT_TAG_IEEE_FLOAT, _) => SampleFormat::Float,
            (FORMAT_TAG_EXTENSIBLE, Some(sub)) if sub == SUBTYPE_PCM => SampleFormat::Pcm,
            (FORMAT_TAG_EXTENSIBLE, Some(sub)) if sub == SUBTYPE_IEEE_FLOAT => SampleFormat::Float,
            _ => SampleFormat::Other,
        }
    }
}

fn block_align_for(channels: u16, bits_per_sample: u16) -> u16 {
    let bytes = channels as u32 * bits_per_sample as u32 / 8;
    bytes.min(u16::MAX as u32) as u16
}

impl fmt::Display for WaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.sample_format() {
            SampleFormat::Pcm => "PCM",
            SampleFormat::Float => "float",
            SampleFormat::Other => "other",
        };
        write!(
            f,
            "{} Hz {}/{}-bit {}ch {}",
            self.sample_rate,
            self.valid_bits_per_sample(),
            self.bits_per_sample,
            self.channels,
            kind
        )?;
        if let Some(mask) = self.channel_mask() {
            write!(f, " mask 0x{:x}", mask)?;
        }
        Ok(())
    }
}
