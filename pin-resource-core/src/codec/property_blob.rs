//! Byte layouts of cached and live connector property payloads.
//!
//! All integers are little-endian. Layouts:
//!
//! ```text
//! wave format   [0-1] format tag  [2-3] channels  [4-7] sample rate
//!               [8-11] avg bytes/s  [12-13] block align  [14-15] bits
//!               [16-17] cbSize  [18..] cbSize extension bytes
//!
//! mode list     [0-3] total size  [4-7] count  then count x 16-byte GUID
//!
//! record list   [0-3] total size  [4-7] count  then per record:
//!               [0-3] record size  wave format  5 x u32 periodicity
//!
//! periodicity   default, fundamental, min, max, max extended (5 x u32)
//!
//! support       u32, non-zero when the format is supported
//! ```

use crate::models::error::CatalogError;
use crate::models::format_record::{FormatRecord, Periodicity};
use crate::models::processing_mode::ProcessingMode;
use crate::models::wave_format::WaveFormat;

/// Size of the fixed `WAVEFORMATEX` header, `cbSize` included.
pub const WAVE_FORMAT_HEADER_SIZE: usize = 18;
/// Size of a multiple-item header (total size + count).
pub const MULTIPLE_ITEM_HEADER_SIZE: usize = 8;
pub const PERIODICITY_SIZE: usize = 20;
const GUID_SIZE: usize = 16;
/// Record size prefix, bare wave format header and periodicity.
const MIN_RECORD_SIZE: usize = 4 + WAVE_FORMAT_HEADER_SIZE + PERIODICITY_SIZE;

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    what: &'static str,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], what: &'static str) -> Self {
        Self { bytes, offset: 0, what }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CatalogError> {
        let end = self.offset.checked_add(len).filter(|&end| end <= self.bytes.len());
        let Some(end) = end else {
            return Err(CatalogError::Unexpected(format!(
                "{}: need {} bytes at offset {}, have {}",
                self.what,
                len,
                self.offset,
                self.bytes.len()
            )));
        };
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, CatalogError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, CatalogError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn finish(&self) -> Result<(), CatalogError> {
        if self.offset != self.bytes.len() {
            return Err(CatalogError::Unexpected(format!(
                "{}: {} trailing bytes",
                self.what,
                self.bytes.len() - self.offset
            )));
        }
        Ok(())
    }

    fn wave_format(&mut self) -> Result<WaveFormat, CatalogError> {
        let format_tag = self.u16()?;
        let channels = self.u16()?;
        let sample_rate = self.u32()?;
        let avg_bytes_per_sec = self.u32()?;
        let block_align = self.u16()?;
        let bits_per_sample = self.u16()?;
        let cb_size = self.u16()? as usize;
        let extension = self.take(cb_size)?.to_vec();
        Ok(WaveFormat::from_parts(
            format_tag,
            channels,
            sample_rate,
            avg_bytes_per_sec,
            block_align,
            bits_per_sample,
            extension,
        ))
    }

    fn periodicity(&mut self) -> Result<Periodicity, CatalogError> {
        Ok(Periodicity {
            default_frames: self.u32()?,
            fundamental_frames: self.u32()?,
            min_frames: self.u32()?,
            max_frames: self.u32()?,
            max_frames_extended: self.u32()?,
        })
    }

    /// Read a multiple-item header and check its declared size against the buffer.
    fn multiple_item_header(&mut self) -> Result<u32, CatalogError> {
        let size = self.u32()? as usize;
        let count = self.u32()?;
        if size != self.bytes.len() {
            return Err(CatalogError::Unexpected(format!(
                "{}: declared size {} but payload is {} bytes",
                self.what,
                size,
                self.bytes.len()
            )));
        }
        Ok(count)
    }
}

pub fn decode_wave_format(bytes: &[u8]) -> Result<WaveFormat, CatalogError> {
    let mut reader = Reader::new(bytes, "wave format");
    let format = reader.wave_format()?;
    reader.finish()?;
    Ok(format)
}

pub fn encode_wave_format(format: &WaveFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(WAVE_FORMAT_HEADER_SIZE + format.extension().len());
    write_wave_format(&mut out, format);
    out
}

fn write_wave_format(out: &mut Vec<u8>, format: &WaveFormat) {
    out.extend_from_slice(&format.format_tag().to_le_bytes());
    out.extend_from_slice(&format.channels().to_le_bytes());
    out.extend_from_slice(&format.sample_rate().to_le_bytes());
    out.extend_from_slice(&format.avg_bytes_per_sec().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample().to_le_bytes());
    // Extensions are bounded by `WaveFormat::validate`.
    out.extend_from_slice(&(format.extension().len() as u16).to_le_bytes());
    out.extend_from_slice(format.extension());
}

pub fn decode_modes(bytes: &[u8]) -> Result<Vec<ProcessingMode>, CatalogError> {
    let mut reader = Reader::new(bytes, "processing modes");
    let count = reader.multiple_item_header()? as usize;
    if count.checked_mul(GUID_SIZE) != Some(reader.remaining()) {
        return Err(CatalogError::Unexpected(format!(
            "processing modes: {} modes do not fit {} bytes",
            count,
            reader.remaining()
        )));
    }
    let mut modes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut guid = [0u8; GUID_SIZE];
        guid.copy_from_slice(reader.take(GUID_SIZE)?);
        modes.push(ProcessingMode::from_bytes_le(guid));
    }
    reader.finish()?;
    Ok(modes)
}

pub fn encode_modes(modes: &[ProcessingMode]) -> Vec<u8> {
    let size = MULTIPLE_ITEM_HEADER_SIZE + modes.len() * GUID_SIZE;
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&(size as u32).to_le_bytes());
    out.extend_from_slice(&(modes.len() as u32).to_le_bytes());
    for mode in modes {
        out.extend_from_slice(&mode.to_bytes_le());
    }
    out
}

pub fn decode_format_records(bytes: &[u8]) -> Result<Vec<FormatRecord>, CatalogError> {
    let mut reader = Reader::new(bytes, "format records");
    let count = reader.multiple_item_header()?;
    let mut records = Vec::with_capacity((count as usize).min(reader.remaining() / MIN_RECORD_SIZE));
    for index in 0..count {
        let record_size = reader.u32()? as usize;
        let start = reader.offset;
        let format = reader.wave_format()?;
        let periodicity = reader.periodicity()?;
        let consumed = 4 + reader.offset - start;
        if consumed != record_size {
            return Err(CatalogError::Unexpected(format!(
                "format record {}: declared size {} but decoded {} bytes",
                index, record_size, consumed
            )));
        }
        records.push(FormatRecord::new(format, periodicity));
    }
    reader.finish()?;
    Ok(records)
}

pub fn encode_format_records(records: &[FormatRecord]) -> Vec<u8> {
    let mut body = Vec::new();
    for record in records {
        let format = encode_wave_format(&record.format);
        let record_size = 4 + format.len() + PERIODICITY_SIZE;
        body.extend_from_slice(&(record_size as u32).to_le_bytes());
        body.extend_from_slice(&format);
        body.extend_from_slice(&encode_periodicity(&record.periodicity));
    }
    let size = MULTIPLE_ITEM_HEADER_SIZE + body.len();
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&(size as u32).to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

pub fn decode_periodicity(bytes: &[u8]) -> Result<Periodicity, CatalogError> {
    let mut reader = Reader::new(bytes, "periodicity");
    let periodicity = reader.periodicity()?;
    reader.finish()?;
    periodicity
        .validate()
        .map_err(|e| CatalogError::Unexpected(format!("periodicity: {}", e)))?;
    Ok(periodicity)
}

pub fn encode_periodicity(periodicity: &Periodicity) -> [u8; PERIODICITY_SIZE] {
    let mut out = [0u8; PERIODICITY_SIZE];
    out[0..4].copy_from_slice(&periodicity.default_frames.to_le_bytes());
    out[4..8].copy_from_slice(&periodicity.fundamental_frames.to_le_bytes());
    out[8..12].copy_from_slice(&periodicity.min_frames.to_le_bytes());
    out[12..16].copy_from_slice(&periodicity.max_frames.to_le_bytes());
    out[16..20].copy_from_slice(&periodicity.max_frames_extended.to_le_bytes());
    out
}

pub fn decode_support(bytes: &[u8]) -> Result<bool, CatalogError> {
    let mut reader = Reader::new(bytes, "format support");
    let value = reader.u32()?;
    reader.finish()?;
    Ok(value != 0)
}

pub fn encode_support(supported: bool) -> [u8; 4] {
    (supported as u32).to_le_bytes()
}
