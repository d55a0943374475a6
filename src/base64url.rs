// src/base64url.rs

//! The URL-safe base64 alphabet used by every JWT segment and JWK parameter.
//!
//! Encoding never emits padding. Decoding accepts input with or without
//! trailing `=` since some authorities pad their JWK parameters.

use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::{DecodePaddingMode, Engine};
use base64::DecodeError;

const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes as unpadded base64url.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    BASE64URL.encode(data)
}

/// Decodes base64url, with or without padding.
pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, DecodeError> {
    BASE64URL.decode(data)
}
