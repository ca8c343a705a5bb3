//! Base64 <-> byte conversion for audio payloads.
//!
//! The provider ships raw PCM as standard, padded base64. Decoding is strict:
//! non-canonical padding or trailing bits are rejected so that every accepted
//! payload re-encodes to the exact same text.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::AudioError;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_allow_trailing_bits(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Decode a base64 payload into raw bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, AudioError> {
    PAYLOAD_ENGINE
        .decode(text)
        .map_err(|e| AudioError::MalformedPayload(format!("invalid base64: {}", e)))
}

/// Encode raw bytes as padded standard base64.
pub fn encode(bytes: &[u8]) -> String {
    PAYLOAD_ENGINE.encode(bytes)
}
