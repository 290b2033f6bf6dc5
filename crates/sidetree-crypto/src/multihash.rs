use std::fmt;

use sha2::{Digest, Sha256, Sha512};

use crate::encoder::{Encoder, EncodingError};

/// Hash algorithms known to the multihash codec.
///
/// Knowing an algorithm is not the same as accepting it: which codes are
/// acceptable from untrusted input is decided by the protocol parameters'
/// allow-list, and deprecated algorithms are never accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1. Recognized so it can be rejected by name.
    Sha1,
    /// SHA2-256, the protocol's default.
    Sha2_256,
    /// SHA2-512.
    Sha2_512,
}

impl HashAlgorithm {
    /// Look up an algorithm by its multihash code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x11 => Some(Self::Sha1),
            0x12 => Some(Self::Sha2_256),
            0x13 => Some(Self::Sha2_512),
            _ => None,
        }
    }

    /// The multihash code of this algorithm.
    pub const fn code(&self) -> u64 {
        match self {
            Self::Sha1 => 0x11,
            Self::Sha2_256 => 0x12,
            Self::Sha2_512 => 0x13,
        }
    }

    /// Digest length in bytes.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha2_256 => 32,
            Self::Sha2_512 => 64,
        }
    }

    /// Deprecated algorithms are known but never supported.
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::Sha1)
    }

    fn digest(&self, data: &[u8]) -> Result<Vec<u8>, MultihashError> {
        match self {
            Self::Sha1 => Err(MultihashError::Deprecated(self.code())),
            Self::Sha2_256 => Ok(Sha256::digest(data).to_vec()),
            Self::Sha2_512 => Ok(Sha512::digest(data).to_vec()),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha2_256 => write!(f, "sha2-256"),
            Self::Sha2_512 => write!(f, "sha2-512"),
        }
    }
}

/// A self-describing content hash: `varint(code) ‖ varint(len) ‖ digest`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Multihash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Multihash {
    /// Hash `data` with the given algorithm.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Result<Self, MultihashError> {
        Ok(Self {
            algorithm,
            digest: algorithm.digest(data)?,
        })
    }

    /// Hash `data` with SHA2-256.
    pub fn sha256(data: &[u8]) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha2_256,
            digest: Sha256::digest(data).to_vec(),
        }
    }

    /// Parse the binary multihash form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MultihashError> {
        let (code, rest) = read_varint(bytes)?;
        let (len, digest) = read_varint(rest)?;
        let algorithm = HashAlgorithm::from_code(code).ok_or(MultihashError::UnknownCode(code))?;
        if len != digest.len() as u64 {
            return Err(MultihashError::LengthMismatch {
                declared: len,
                actual: digest.len(),
            });
        }
        if digest.len() != algorithm.digest_len() {
            return Err(MultihashError::WrongDigestSize {
                algorithm,
                actual: digest.len(),
            });
        }
        Ok(Self {
            algorithm,
            digest: digest.to_vec(),
        })
    }

    /// Parse the transport-encoded string form.
    pub fn decode(encoded: &str) -> Result<Self, MultihashError> {
        Self::from_bytes(&Encoder::decode(encoded)?)
    }

    /// The binary multihash form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.digest.len());
        write_varint(self.algorithm.code(), &mut out);
        write_varint(self.digest.len() as u64, &mut out);
        out.extend_from_slice(&self.digest);
        out
    }

    /// The transport-encoded string form.
    pub fn encode(&self) -> String {
        Encoder::encode(self.to_bytes())
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash({}:{})", self.algorithm, hex::encode(&self.digest[..4.min(self.digest.len())]))
    }
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Content hashing and the hash allow-list check.
///
/// Every component hashes through here so that the encoding rules and the
/// set of acceptable algorithms live in one place.
pub struct MultihashValidator;

impl MultihashValidator {
    /// SHA2-256 multihash of `data`, transport-encoded.
    pub fn hash(data: &[u8]) -> String {
        Multihash::sha256(data).encode()
    }

    /// Multihash of `data` using the algorithm with multihash `code`.
    pub fn hash_with(code: u64, data: &[u8]) -> Result<String, MultihashError> {
        let algorithm = HashAlgorithm::from_code(code).ok_or(MultihashError::UnknownCode(code))?;
        Ok(Multihash::compute(algorithm, data)?.encode())
    }

    /// Returns `true` only if `candidate` is a well-formed encoded multihash
    /// whose algorithm is on `allowed_codes` and not deprecated.
    ///
    /// Malformed input is reported as unsupported, never as an error.
    pub fn is_supported_hash(candidate: &str, allowed_codes: &[u64]) -> bool {
        match Multihash::decode(candidate) {
            Ok(mh) => {
                !mh.algorithm.is_deprecated() && allowed_codes.contains(&mh.algorithm.code())
            }
            Err(_) => false,
        }
    }

    /// Returns `true` if `content` hashes to `expected` under the algorithm
    /// that `expected` names.
    pub fn verify_content(content: &[u8], expected: &str) -> bool {
        let Ok(expected) = Multihash::decode(expected) else {
            return false;
        };
        match Multihash::compute(expected.algorithm, content) {
            Ok(actual) => actual == expected,
            Err(_) => false,
        }
    }
}

/// Errors from parsing or computing multihashes.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MultihashError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("truncated varint")]
    TruncatedVarint,
    #[error("varint is not minimally encoded or overflows 64 bits")]
    InvalidVarint,
    #[error("unknown multihash code {0:#x}")]
    UnknownCode(u64),
    #[error("deprecated multihash code {0:#x}")]
    Deprecated(u64),
    #[error("declared digest length {declared} but {actual} bytes follow")]
    LengthMismatch { declared: u64, actual: usize },
    #[error("{algorithm} digest must be {} bytes, got {actual}", .algorithm.digest_len())]
    WrongDigestSize { algorithm: HashAlgorithm, actual: usize },
}

/// bitmask for 7 least significant bits
const LSB_7: u8 = 0x7f;
/// bitmask for most significant bit
const MSB: u8 = 0x80;
/// multiformats caps unsigned varints at 9 bytes
const MAX_VARINT_LEN: usize = 9;

fn read_varint(bytes: &[u8]) -> Result<(u64, &[u8]), MultihashError> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        value |= u64::from(byte & LSB_7) << (7 * i);
        if byte & MSB == 0 {
            // A trailing zero group means a shorter encoding existed.
            if byte == 0 && i > 0 {
                return Err(MultihashError::InvalidVarint);
            }
            return Ok((value, &bytes[i + 1..]));
        }
    }
    if bytes.len() >= MAX_VARINT_LEN {
        Err(MultihashError::InvalidVarint)
    } else {
        Err(MultihashError::TruncatedVarint)
    }
}

fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value as u8) & LSB_7;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | MSB);
    }
}
