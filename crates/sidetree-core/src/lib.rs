//! Core data model of the Sidetree anchoring layer.
//!
//! This crate provides:
//! - `AnchorFile`: strict, ordered validation of the on-ledger anchor record
//! - `Operation`: signed create / update / delete requests with a strict parser
//! - `BatchFile` / `BatchAssembler`: batch serialization and commitments
//! - `MerkleBinder`: recomputing a batch's hash and Merkle root from raw bytes
//!
//! Everything here is synchronous and pure. Fetching and anchoring live in
//! `sidetree-observer`.

pub mod anchor_file;
pub mod batch;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod generator;
mod json;
pub mod operation;
pub mod payload;

pub use anchor_file::AnchorFile;
pub use batch::{AssembledBatch, BatchAssembler, BatchFile, MerkleBinder};
pub use error::{AnchorFileError, BatchError, OperationError, ValidationError};
#[cfg(any(test, feature = "test-support"))]
pub use generator::OperationGenerator;
pub use operation::{KeyReference, Operation, OperationHeader};
pub use payload::{CreatePayload, DeletePayload, OperationPayload, UpdatePayload};
