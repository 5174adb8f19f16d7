//! URL-safe base64 for token segments.
//!
//! Encoding never emits `=` padding. Header and claims decoding tolerates
//! it; the signature segment must be exactly the canonical unpadded form.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const SIGNATURE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Encode raw bytes as an unpadded base64url segment.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    SEGMENT_ENGINE.encode(input)
}

/// Decode a base64url segment, with or without padding.
pub fn decode(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    SEGMENT_ENGINE.decode(segment)
}

/// Decode a signature segment. Padding and non-zero trailing bits are
/// rejected, so each digest has exactly one accepted spelling.
pub fn decode_canonical(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    SIGNATURE_ENGINE.decode(segment)
}
