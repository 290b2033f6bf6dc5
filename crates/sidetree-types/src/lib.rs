//! Foundation types for the Sidetree anchoring protocol.
//!
//! This crate provides the value types shared by every other Sidetree crate.
//! It has no cryptography and performs no I/O.
//!
//! # Key Types
//!
//! - [`DidUniqueSuffix`]: Protocol-local identifier of a DID, bounded in length
//! - [`OperationKind`]: Create / Update / Delete tag carried in operation headers
//! - [`ProtocolParameters`]: Network limits and hash allow-list for one epoch
//! - [`ProtocolVersions`]: Time-indexed set of parameter epochs

pub mod error;
pub mod kind;
pub mod params;
pub mod suffix;

pub use error::TypeError;
pub use kind::OperationKind;
pub use params::{ProtocolParameters, ProtocolVersions, SHA2_256_MULTIHASH_CODE};
pub use suffix::{DidUniqueSuffix, MAX_DID_UNIQUE_SUFFIX_LENGTH};
