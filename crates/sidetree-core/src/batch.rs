use serde_json::{json, Value};
use sidetree_crypto::{Encoder, HashAlgorithm, MerkleTree, Multihash, MultihashValidator};
use sidetree_types::{DidUniqueSuffix, ProtocolParameters};
use tracing::debug;

use crate::anchor_file::AnchorFile;
use crate::error::BatchError;
use crate::json;
use crate::operation::Operation;

const OPERATIONS: &str = "operations";

/// A batch file: the ordered operation records referenced by one anchor file.
///
/// Serialized as `{"operations": [base64url(record bytes), ...]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFile {
    operations: Vec<Operation>,
}

impl BatchFile {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let encoded: Vec<String> = self.operations.iter().map(|op| Encoder::encode(op.as_bytes())).collect();
        json!({ OPERATIONS: encoded }).to_string().into_bytes()
    }

    /// Parse and validate a batch file, including every operation in it.
    pub fn parse(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, BatchError> {
        let records = operation_records(bytes, params.max_operations_per_batch)
            .inspect_err(|e| debug!(code = e.code(), "batch file rejected"))?;
        let operations = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Operation::parse(record, params).map_err(|source| BatchError::OperationInvalid { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { operations })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Suffixes in operation order.
    pub fn did_unique_suffixes(&self) -> Vec<DidUniqueSuffix> {
        self.operations.iter().map(|op| op.did_unique_suffix().clone()).collect()
    }

    /// SHA2-256 Merkle tree over the operation record bytes. `None` for an
    /// empty batch.
    pub fn merkle_tree(&self) -> Option<MerkleTree> {
        self.merkle_tree_with(HashAlgorithm::Sha2_256)
    }

    /// Merkle tree over the operation record bytes, hashed with `algorithm`.
    pub fn merkle_tree_with(&self, algorithm: HashAlgorithm) -> Option<MerkleTree> {
        let records: Vec<&[u8]> = self.operations.iter().map(Operation::as_bytes).collect();
        MerkleTree::from_data_with(algorithm, &records)
    }

    /// Check that operation *i* acts on the anchor file's suffix *i*.
    pub fn bind_to(&self, anchor: &AnchorFile) -> Result<(), BatchError> {
        let expected = anchor.did_unique_suffixes();
        if expected.len() != self.operations.len() {
            return Err(BatchError::OperationCountMismatch {
                expected: expected.len(),
                actual: self.operations.len(),
            });
        }
        match self
            .operations
            .iter()
            .zip(expected)
            .position(|(op, suffix)| op.did_unique_suffix() != suffix)
        {
            Some(index) => Err(BatchError::DidUniqueSuffixMismatch { index }),
            None => Ok(()),
        }
    }
}

/// Structural extraction of the decoded operation records in a batch file.
fn operation_records(bytes: &[u8], max_operations: usize) -> Result<Vec<Vec<u8>>, BatchError> {
    let object = json::parse_object(bytes, BatchError::NotWellFormed)?;
    json::reject_unknown(&object, &[OPERATIONS], BatchError::UnknownProperty)?;
    let entries = json::required_array(&object, OPERATIONS, BatchError::OperationsMissing, BatchError::OperationsNotArray)?;
    if entries.len() > max_operations {
        return Err(BatchError::ExceededMaxOperationCount {
            count: entries.len(),
            max: max_operations,
        });
    }
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let Value::String(encoded) = entry else {
                return Err(BatchError::OperationNotString { index });
            };
            Encoder::decode(encoded).map_err(|_| BatchError::OperationNotEncoded { index })
        })
        .collect()
}

/// The output of [`BatchAssembler::assemble`]: everything needed to store a
/// batch and anchor it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledBatch {
    pub batch_bytes: Vec<u8>,
    pub batch_file_hash: String,
    pub merkle_root: String,
    pub did_unique_suffixes: Vec<DidUniqueSuffix>,
}

impl AssembledBatch {
    /// The anchor file describing this batch.
    pub fn anchor_file(&self) -> AnchorFile {
        AnchorFile::new(
            self.batch_file_hash.clone(),
            self.merkle_root.clone(),
            self.did_unique_suffixes.clone(),
        )
    }
}

/// Serializes operations into a batch file and computes its commitments.
pub struct BatchAssembler;

impl BatchAssembler {
    /// Assemble with SHA2-256 commitments.
    pub fn assemble(operations: &[Operation], max_operations_per_batch: usize) -> Result<AssembledBatch, BatchError> {
        Self::assemble_hashed(operations, max_operations_per_batch, HashAlgorithm::Sha2_256)
    }

    /// Assemble under `params`: its batch limit, and its writer hash
    /// algorithm for both the batch file hash and the Merkle tree.
    pub fn assemble_with(operations: &[Operation], params: &ProtocolParameters) -> Result<AssembledBatch, BatchError> {
        let code = params.hash_algorithm_in_multihash_code;
        let algorithm = HashAlgorithm::from_code(code)
            .filter(|algorithm| !algorithm.is_deprecated())
            .ok_or(BatchError::HashAlgorithmUnsupported(code))?;
        Self::assemble_hashed(operations, params.max_operations_per_batch, algorithm)
    }

    fn assemble_hashed(
        operations: &[Operation],
        max_operations_per_batch: usize,
        algorithm: HashAlgorithm,
    ) -> Result<AssembledBatch, BatchError> {
        if operations.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        if operations.len() > max_operations_per_batch {
            return Err(BatchError::ExceededMaxOperationCount {
                count: operations.len(),
                max: max_operations_per_batch,
            });
        }

        let batch = BatchFile::new(operations.to_vec());
        let unsupported = || BatchError::HashAlgorithmUnsupported(algorithm.code());
        let tree = batch.merkle_tree_with(algorithm).ok_or_else(unsupported)?;
        let batch_bytes = batch.to_bytes();
        let batch_file_hash = Multihash::compute(algorithm, &batch_bytes).map_err(|_| unsupported())?;
        let assembled = AssembledBatch {
            batch_file_hash: batch_file_hash.encode(),
            merkle_root: tree.root().encode(),
            did_unique_suffixes: batch.did_unique_suffixes(),
            batch_bytes,
        };
        debug!(
            operations = operations.len(),
            batch_file_hash = %assembled.batch_file_hash,
            merkle_root = %assembled.merkle_root,
            "batch assembled"
        );
        Ok(assembled)
    }
}

/// Recomputes batch commitments from raw bytes.
pub struct MerkleBinder;

impl MerkleBinder {
    /// Encoded SHA2-256 Merkle root over the operation records in `batch_bytes`.
    pub fn merkle_root(batch_bytes: &[u8]) -> Option<String> {
        Self::merkle_root_with(batch_bytes, HashAlgorithm::Sha2_256)
    }

    pub fn merkle_root_with(batch_bytes: &[u8], algorithm: HashAlgorithm) -> Option<String> {
        let records = operation_records(batch_bytes, usize::MAX).ok()?;
        MerkleTree::from_data_with(algorithm, &records).map(|tree| tree.root().encode())
    }

    /// True only if `batch_bytes` hash to `claimed_hash` and their operation
    /// records produce `claimed_root`.
    ///
    /// Each claim is recomputed with the algorithm it names.
    pub fn verify(batch_bytes: &[u8], claimed_hash: &str, claimed_root: &str) -> bool {
        if !MultihashValidator::verify_content(batch_bytes, claimed_hash) {
            return false;
        }
        let Ok(root) = Multihash::decode(claimed_root) else {
            return false;
        };
        Self::merkle_root_with(batch_bytes, root.algorithm()).is_some_and(|computed| computed == claimed_root)
    }

    pub fn verify_anchor(batch_bytes: &[u8], anchor: &AnchorFile) -> bool {
        Self::verify(batch_bytes, anchor.batch_file_hash(), anchor.merkle_root())
    }
}
