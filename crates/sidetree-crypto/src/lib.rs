//! Cryptographic primitives for Sidetree anchoring.
//!
//! Provides the base64url transport encoding, multihash computation and
//! allow-list validation, binary Merkle trees with inclusion proofs, and
//! ES256K / Ed25519 signing and verification.
//!
//! All crypto operations wrap established libraries.

pub mod encoder;
pub mod merkle;
pub mod multihash;
pub mod signer;

pub use encoder::{Encoder, EncodingError};
pub use merkle::{MerkleProof, MerkleTree, Side};
pub use multihash::{HashAlgorithm, Multihash, MultihashError, MultihashValidator};
pub use signer::{PrivateKey, PublicKey, Signature, SignatureAlgorithm, SignatureError};
