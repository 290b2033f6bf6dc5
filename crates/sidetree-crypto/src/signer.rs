use std::fmt;
use std::str::FromStr;

use crate::encoder::{Encoder, EncodingError};

/// Signature algorithms accepted in operation headers (`header.alg`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// ECDSA over secp256k1 with SHA-256 (RFC 6979 deterministic nonces).
    Es256k,
    /// Ed25519.
    EdDsa,
}

impl SignatureAlgorithm {
    /// The `alg` identifier used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Es256k => "ES256K",
            Self::EdDsa => "EdDSA",
        }
    }

    /// The DID document public-key `type` for keys of this algorithm.
    pub const fn key_type(&self) -> &'static str {
        match self {
            Self::Es256k => "Secp256k1VerificationKey2018",
            Self::EdDsa => "Ed25519VerificationKey2018",
        }
    }

    /// Look up an algorithm by DID document public-key `type`.
    pub fn from_key_type(key_type: &str) -> Option<Self> {
        match key_type {
            "Secp256k1VerificationKey2018" => Some(Self::Es256k),
            "Ed25519VerificationKey2018" => Some(Self::EdDsa),
            _ => None,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ES256K" => Ok(Self::Es256k),
            "EdDSA" => Ok(Self::EdDsa),
            other => Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Private signing key.
#[derive(Clone)]
pub enum PrivateKey {
    Es256k(k256::ecdsa::SigningKey),
    EdDsa(ed25519_dalek::SigningKey),
}

/// Public verifying key.
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    Es256k(k256::ecdsa::VerifyingKey),
    EdDsa(ed25519_dalek::VerifyingKey),
}

/// Raw signature bytes: 64-byte compact `r ‖ s` for ES256K, 64 bytes for Ed25519.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl PrivateKey {
    /// Generate a new random key for `algorithm`.
    pub fn generate(algorithm: SignatureAlgorithm) -> Self {
        let mut csprng = rand::thread_rng();
        match algorithm {
            SignatureAlgorithm::Es256k => Self::Es256k(k256::ecdsa::SigningKey::random(&mut csprng)),
            SignatureAlgorithm::EdDsa => Self::EdDsa(ed25519_dalek::SigningKey::generate(&mut csprng)),
        }
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, SignatureError> {
        match algorithm {
            SignatureAlgorithm::Es256k => k256::ecdsa::SigningKey::from_slice(bytes)
                .map(Self::Es256k)
                .map_err(|_| SignatureError::InvalidKey),
            SignatureAlgorithm::EdDsa => {
                let secret: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::InvalidKey)?;
                Ok(Self::EdDsa(ed25519_dalek::SigningKey::from_bytes(&secret)))
            }
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Es256k(_) => SignatureAlgorithm::Es256k,
            Self::EdDsa(_) => SignatureAlgorithm::EdDsa,
        }
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Es256k(sk) => PublicKey::Es256k(sk.verifying_key().clone()),
            Self::EdDsa(sk) => PublicKey::EdDsa(sk.verifying_key()),
        }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            Self::Es256k(sk) => {
                use k256::ecdsa::signature::Signer;
                let sig: k256::ecdsa::Signature = sk.sign(message);
                Signature(sig.to_bytes().to_vec())
            }
            Self::EdDsa(sk) => {
                use ed25519_dalek::Signer;
                Signature(sk.sign(message).to_bytes().to_vec())
            }
        }
    }
}

impl PublicKey {
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Es256k(_) => SignatureAlgorithm::Es256k,
            Self::EdDsa(_) => SignatureAlgorithm::EdDsa,
        }
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        match self {
            Self::Es256k(vk) => {
                use k256::ecdsa::signature::Verifier;
                let sig = k256::ecdsa::Signature::from_slice(&signature.0)
                    .map_err(|_| SignatureError::MalformedSignature)?;
                vk.verify(message, &sig)
                    .map_err(|_| SignatureError::InvalidSignature)
            }
            Self::EdDsa(vk) => {
                use ed25519_dalek::Verifier;
                let sig = ed25519_dalek::Signature::from_slice(&signature.0)
                    .map_err(|_| SignatureError::MalformedSignature)?;
                vk.verify(message, &sig)
                    .map_err(|_| SignatureError::InvalidSignature)
            }
        }
    }

    /// Raw public key bytes: 33-byte compressed SEC1 for ES256K, 32 bytes for Ed25519.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Es256k(vk) => vk.to_encoded_point(true).as_bytes().to_vec(),
            Self::EdDsa(vk) => vk.to_bytes().to_vec(),
        }
    }

    /// Create from raw public key bytes. SEC1 keys may be compressed or not.
    pub fn from_bytes(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, SignatureError> {
        match algorithm {
            SignatureAlgorithm::Es256k => k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
                .map(Self::Es256k)
                .map_err(|_| SignatureError::InvalidKey),
            SignatureAlgorithm::EdDsa => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| SignatureError::InvalidKey)?;
                ed25519_dalek::VerifyingKey::from_bytes(&raw)
                    .map(Self::EdDsa)
                    .map_err(|_| SignatureError::InvalidKey)
            }
        }
    }

    /// Hex form, as used by `publicKeyHex` in DID documents.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(algorithm: SignatureAlgorithm, encoded: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(encoded).map_err(|_| SignatureError::InvalidKey)?;
        Self::from_bytes(algorithm, &bytes)
    }
}

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Transport-encoded form.
    pub fn encode(&self) -> String {
        Encoder::encode(&self.0)
    }

    pub fn decode(encoded: &str) -> Result<Self, EncodingError> {
        Encoder::decode(encoded).map(Self)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({}, <redacted>)", self.algorithm())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm(), self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8.min(self.0.len())]))
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed signature bytes")]
    MalformedSignature,
    #[error("invalid key")]
    InvalidKey,
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGORITHMS: [SignatureAlgorithm; 2] = [SignatureAlgorithm::Es256k, SignatureAlgorithm::EdDsa];

    #[test]
    fn sign_and_verify() {
        for alg in ALGORITHMS {
            let sk = PrivateKey::generate(alg);
            let pk = sk.public_key();
            let sig = sk.sign(b"hello world");
            assert!(pk.verify(b"hello world", &sig).is_ok(), "{alg}");
        }
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        for alg in ALGORITHMS {
            let sk = PrivateKey::generate(alg);
            let sig = sk.sign(b"correct message");
            assert_eq!(
                sk.public_key().verify(b"wrong message", &sig),
                Err(SignatureError::InvalidSignature)
            );
        }
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        for alg in ALGORITHMS {
            let sk1 = PrivateKey::generate(alg);
            let sk2 = PrivateKey::generate(alg);
            let sig = sk1.sign(b"message");
            assert!(sk2.public_key().verify(b"message", &sig).is_err());
        }
    }

    #[test]
    fn es256k_is_deterministic() {
        let sk = PrivateKey::generate(SignatureAlgorithm::Es256k);
        assert_eq!(sk.sign(b"payload"), sk.sign(b"payload"));
    }

    #[test]
    fn malformed_signature_rejected() {
        for alg in ALGORITHMS {
            let sk = PrivateKey::generate(alg);
            let sig = Signature::from_bytes(vec![1, 2, 3]);
            assert_eq!(
                sk.public_key().verify(b"m", &sig),
                Err(SignatureError::MalformedSignature)
            );
        }
    }

    #[test]
    fn public_key_hex_roundtrip() {
        for alg in ALGORITHMS {
            let pk = PrivateKey::generate(alg).public_key();
            let parsed = PublicKey::from_hex(alg, &pk.to_hex()).unwrap();
            assert_eq!(parsed, pk);
        }
        let es = PrivateKey::generate(SignatureAlgorithm::Es256k).public_key();
        assert_eq!(es.to_bytes().len(), 33);
    }

    #[test]
    fn invalid_public_key_rejected() {
        assert_eq!(
            PublicKey::from_hex(SignatureAlgorithm::Es256k, "0011"),
            Err(SignatureError::InvalidKey)
        );
        assert_eq!(
            PublicKey::from_hex(SignatureAlgorithm::EdDsa, "zz"),
            Err(SignatureError::InvalidKey)
        );
    }

    #[test]
    fn private_key_from_bytes() {
        let secret = [7u8; 32];
        for alg in ALGORITHMS {
            let a = PrivateKey::from_bytes(alg, &secret).unwrap();
            let b = PrivateKey::from_bytes(alg, &secret).unwrap();
            assert_eq!(a.public_key(), b.public_key());
        }
        assert!(PrivateKey::from_bytes(SignatureAlgorithm::EdDsa, &[1u8; 31]).is_err());
    }

    #[test]
    fn algorithm_identifiers() {
        assert_eq!("ES256K".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::Es256k);
        assert_eq!("EdDSA".parse::<SignatureAlgorithm>().unwrap(), SignatureAlgorithm::EdDsa);
        assert!("RS256".parse::<SignatureAlgorithm>().is_err());
        for alg in ALGORITHMS {
            assert_eq!(SignatureAlgorithm::from_key_type(alg.key_type()), Some(alg));
        }
    }

    #[test]
    fn signature_encoding_roundtrip() {
        let sig = PrivateKey::generate(SignatureAlgorithm::EdDsa).sign(b"x");
        assert_eq!(Signature::decode(&sig.encode()).unwrap(), sig);
    }

    #[test]
    fn debug_redacts_private_key() {
        let sk = PrivateKey::generate(SignatureAlgorithm::Es256k);
        let debug = format!("{sk:?}");
        assert!(debug.contains("redacted"));
    }
}
