use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Transport encoding shared by every Sidetree record.
///
/// Base64url without padding (RFC 4648 §5). Decoding is strict: padding,
/// characters outside the URL-safe alphabet, impossible lengths, and
/// non-canonical trailing bits are all rejected, so every byte string has
/// exactly one accepted encoding.
pub struct Encoder;

impl Encoder {
    /// Encode bytes as unpadded base64url.
    pub fn encode(data: impl AsRef<[u8]>) -> String {
        URL_SAFE_NO_PAD.encode(data)
    }

    /// Decode an unpadded base64url string.
    pub fn decode(encoded: &str) -> Result<Vec<u8>, EncodingError> {
        URL_SAFE_NO_PAD.decode(encoded).map_err(|e| match e {
            base64::DecodeError::InvalidByte(offset, byte) => {
                EncodingError::InvalidCharacter { offset, byte }
            }
            base64::DecodeError::InvalidLength => EncodingError::InvalidLength(encoded.len()),
            base64::DecodeError::InvalidLastSymbol(offset, byte) => {
                EncodingError::NonCanonical { offset, byte }
            }
            base64::DecodeError::InvalidPadding => EncodingError::Padding,
        })
    }

    /// Decode to a UTF-8 string.
    pub fn decode_to_string(encoded: &str) -> Result<String, EncodingError> {
        let bytes = Self::decode(encoded)?;
        String::from_utf8(bytes).map_err(|_| EncodingError::NotUtf8)
    }
}

/// Errors from decoding transport-encoded strings.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("invalid character {byte:#04x} at offset {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },
    #[error("invalid encoded length {0}")]
    InvalidLength(usize),
    #[error("non-canonical final symbol {byte:#04x} at offset {offset}")]
    NonCanonical { offset: usize, byte: u8 },
    #[error("padding is not allowed")]
    Padding,
    #[error("decoded bytes are not valid UTF-8")]
    NotUtf8,
}
