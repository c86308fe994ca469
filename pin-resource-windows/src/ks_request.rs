//! Kernel-streaming property request buffers.
//!
//! Builds the little-endian `KSP_PIN`, attribute list and `KSDATAFORMAT`
//! layouts passed to `IKsControl::KsProperty`. Kept free of Win32 types so
//! the layouts are testable on any host.
//!
//! ```text
//! KSP_PIN        [0-15] set GUID  [16-19] id  [20-23] flags  [24-27] pin id  [28-31] reserved
//! KSMULTIPLE_ITEM [0-3] total size  [4-7] count
//! KSATTRIBUTE    [0-3] size  [4-7] flags  [8-23] attribute GUID
//! KSDATAFORMAT   [0-3] format size  [4-7] flags  [8-11] sample size  [12-15] reserved
//!                [16-31] major  [32-47] sub  [48-63] specifier
//! ```

use pin_resource_core::codec::property_blob;
use pin_resource_core::{ProcessingMode, WaveFormat};

pub const KSPROPSETID_PIN: u128 = 0x8c134960_51ad_11cf_878a_94f801c10000;
pub const KSPROPSETID_AUDIO_SIGNAL_PROCESSING: u128 = 0x4f67b528_30c9_40de_b2fb_859ddd1f3470;
pub const KSATTRIBUTEID_AUDIO_SIGNAL_PROCESSING_MODE: u128 = 0xe1f89eb5_5f46_419b_967b_ff6770b98401;
pub const KSDATAFORMAT_TYPE_AUDIO: u128 = 0x73647561_0000_0010_8000_00aa00389b71;
pub const KSDATAFORMAT_SPECIFIER_WAVEFORMATEX: u128 = 0x05589f81_c356_11ce_bf01_00aa0055595a;
/// Base of `DEFINE_WAVEFORMATEX_GUID(tag)`; the tag occupies Data1.
const WAVEFORMATEX_GUID_BASE: u128 = 0x00000000_0000_0010_8000_00aa00389b71;

pub const KSPROPERTY_AUDIO_SIGNAL_PROCESSING_MODES: u32 = 0;
pub const KSPROPERTY_PIN_PROPOSEDATAFORMAT: u32 = 14;
pub const KSPROPERTY_PIN_PROPOSEDATAFORMAT2: u32 = 15;

pub const KSPROPERTY_TYPE_GET: u32 = 0x0000_0001;
pub const KSPROPERTY_TYPE_SET: u32 = 0x0000_0002;

/// `HRESULT_FROM_WIN32` codes a KS filter answers when it lacks a property
/// or rejects a proposed format.
const UNSUPPORTED_STATUSES: [u32; 6] = [
    0x8000_4001, // E_NOTIMPL
    0x8007_0001, // ERROR_INVALID_FUNCTION
    0x8007_0032, // ERROR_NOT_SUPPORTED
    0x8007_0490, // ERROR_NOT_FOUND
    0x8007_0491, // ERROR_NO_MATCH
    0x8007_0492, // ERROR_SET_NOT_FOUND
];
const MORE_DATA_STATUSES: [u32; 2] = [
    0x8007_00ea, // ERROR_MORE_DATA
    0x8007_007a, // ERROR_INSUFFICIENT_BUFFER
];

pub const KSP_PIN_SIZE: usize = 32;
pub const KSDATAFORMAT_SIZE: usize = 64;
const KSATTRIBUTE_MODE_SIZE: usize = 40;

/// GUID in its in-memory byte order: Data1-3 little-endian, Data4 as-is.
pub fn guid_bytes(value: u128) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..4].copy_from_slice(&((value >> 96) as u32).to_le_bytes());
    out[4..6].copy_from_slice(&((value >> 80) as u16).to_le_bytes());
    out[6..8].copy_from_slice(&((value >> 64) as u16).to_le_bytes());
    out[8..16].copy_from_slice(&(value as u64).to_be_bytes());
    out
}

/// A `KSP_PIN` property descriptor.
pub fn ksp_pin(set: u128, id: u32, flags: u32, pin_id: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(KSP_PIN_SIZE);
    out.extend_from_slice(&guid_bytes(set));
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&pin_id.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// Descriptor for `KSPROPERTY_AUDIOSIGNALPROCESSING_MODES` on a pin.
pub fn processing_modes_request(pin_id: u32) -> Vec<u8> {
    ksp_pin(
        KSPROPSETID_AUDIO_SIGNAL_PROCESSING,
        KSPROPERTY_AUDIO_SIGNAL_PROCESSING_MODES,
        KSPROPERTY_TYPE_GET,
        pin_id,
    )
}

/// Descriptor asking the driver which format it proposes for `mode`.
///
/// The null mode has no attribute to carry, so it uses the plain
/// `PROPOSEDATAFORMAT` get.
pub fn proposed_format_request(pin_id: u32, mode: ProcessingMode) -> Vec<u8> {
    if mode.is_null() {
        return ksp_pin(KSPROPSETID_PIN, KSPROPERTY_PIN_PROPOSEDATAFORMAT, KSPROPERTY_TYPE_GET, pin_id);
    }
    let mut out = ksp_pin(KSPROPSETID_PIN, KSPROPERTY_PIN_PROPOSEDATAFORMAT2, KSPROPERTY_TYPE_GET, pin_id);
    let list_size = 8 + KSATTRIBUTE_MODE_SIZE;
    out.extend_from_slice(&(list_size as u32).to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(KSATTRIBUTE_MODE_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&guid_bytes(KSATTRIBUTEID_AUDIO_SIGNAL_PROCESSING_MODE));
    out.extend_from_slice(&mode.to_bytes_le());
    out
}

/// Descriptor for the `PROPOSEDATAFORMAT` set used to test format support.
pub fn format_support_request(pin_id: u32) -> Vec<u8> {
    ksp_pin(KSPROPSETID_PIN, KSPROPERTY_PIN_PROPOSEDATAFORMAT, KSPROPERTY_TYPE_SET, pin_id)
}

/// `KSDATAFORMAT_WAVEFORMATEX`: a data format header followed by the wave format.
pub fn data_format_waveformatex(format: &WaveFormat) -> Vec<u8> {
    let wave = property_blob::encode_wave_format(format);
    let total = KSDATAFORMAT_SIZE + wave.len();
    let sub_format = match format.sub_format() {
        Some(sub) => sub.to_bytes_le(),
        None => guid_bytes(WAVEFORMATEX_GUID_BASE | ((format.format_tag() as u128) << 96)),
    };
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(format.block_align() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&guid_bytes(KSDATAFORMAT_TYPE_AUDIO));
    out.extend_from_slice(&sub_format);
    out.extend_from_slice(&guid_bytes(KSDATAFORMAT_SPECIFIER_WAVEFORMATEX));
    out.extend_from_slice(&wave);
    out
}

/// Strip the `KSDATAFORMAT` header off a driver-returned data format.
pub fn wave_format_payload(data_format: &[u8]) -> Option<&[u8]> {
    if data_format.len() < KSDATAFORMAT_SIZE {
        return None;
    }
    let declared = u32::from_le_bytes([data_format[0], data_format[1], data_format[2], data_format[3]]) as usize;
    let end = declared.min(data_format.len());
    data_format.get(KSDATAFORMAT_SIZE..end)
}

pub fn is_unsupported_status(hresult: i32) -> bool {
    UNSUPPORTED_STATUSES.contains(&(hresult as u32))
}

/// A size query answers with one of these when the output buffer is too small.
pub fn is_more_data_status(hresult: i32) -> bool {
    MORE_DATA_STATUSES.contains(&(hresult as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pin_resource_core::models::wave_format::SUBTYPE_PCM;

    #[test]
    fn guid_byte_order_matches_processing_mode() {
        let raw = 0x9e90ea20_b493_4fd1_a1a8_7e1361a956cf;
        assert_eq!(guid_bytes(raw), ProcessingMode::RAW.to_bytes_le());
    }

    #[test]
    fn ksp_pin_layout() {
        let bytes = processing_modes_request(7);
        assert_eq!(bytes.len(), KSP_PIN_SIZE);
        assert_eq!(&bytes[0..16], &guid_bytes(KSPROPSETID_AUDIO_SIGNAL_PROCESSING));
        assert_eq!(u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 0);
        assert_eq!(u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), KSPROPERTY_TYPE_GET);
        assert_eq!(u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]), 7);
    }

    #[test]
    fn proposed_format_carries_mode_attribute() {
        let bytes = proposed_format_request(2, ProcessingMode::RAW);
        assert_eq!(bytes.len(), KSP_PIN_SIZE + 8 + 40);
        assert_eq!(
            u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            KSPROPERTY_PIN_PROPOSEDATAFORMAT2
        );
        assert_eq!(&bytes[bytes.len() - 16..], &ProcessingMode::RAW.to_bytes_le());
    }

    #[test]
    fn null_mode_proposal_has_no_attributes() {
        let bytes = proposed_format_request(2, ProcessingMode::NULL);
        assert_eq!(bytes.len(), KSP_PIN_SIZE);
        assert_eq!(
            u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
            KSPROPERTY_PIN_PROPOSEDATAFORMAT
        );
    }

    #[test]
    fn data_format_wraps_wave_format() {
        let format = WaveFormat::pcm(48000, 16, 2);
        let bytes = data_format_waveformatex(&format);
        assert_eq!(bytes.len(), KSDATAFORMAT_SIZE + 18);
        // DEFINE_WAVEFORMATEX_GUID(WAVE_FORMAT_PCM) == KSDATAFORMAT_SUBTYPE_PCM
        assert_eq!(&bytes[32..48], &SUBTYPE_PCM.to_bytes_le());
        assert_eq!(wave_format_payload(&bytes), Some(&bytes[KSDATAFORMAT_SIZE..]));
        let decoded = property_blob::decode_wave_format(wave_format_payload(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, format);
    }

    #[test]
    fn short_data_format_has_no_payload() {
        assert_eq!(wave_format_payload(&[0u8; 10]), None);
    }

    #[test]
    fn status_classification() {
        assert!(is_unsupported_status(0x8007_0490_u32 as i32));
        assert!(is_unsupported_status(0x8007_0492_u32 as i32));
        assert!(!is_unsupported_status(0x8000_4005_u32 as i32)); // E_FAIL
        assert!(is_more_data_status(0x8007_00ea_u32 as i32));
        assert!(!is_more_data_status(0));
    }
}
