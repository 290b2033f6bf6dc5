use std::sync::Arc;

use sidetree_core::{AnchorFile, BatchAssembler, BatchError, Operation, OperationError};
use sidetree_types::{DidUniqueSuffix, ProtocolVersions};
use tracing::{info, warn};

use crate::error::{ClientError, WriteError};
use crate::traits::{CasClient, ConfirmationHandle, LedgerClient};

/// Everything produced by one successful [`BatchWriter::write`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReceipt {
    pub anchor_file_hash: String,
    pub batch_file_hash: String,
    pub merkle_root: String,
    pub did_unique_suffixes: Vec<DidUniqueSuffix>,
    pub confirmation: ConfirmationHandle,
}

/// Publishes batches of operations: batch file and anchor file to CAS, then
/// the anchor file hash to the ledger.
pub struct BatchWriter {
    cas: Arc<dyn CasClient>,
    ledger: Arc<dyn LedgerClient>,
    versions: ProtocolVersions,
}

impl BatchWriter {
    pub fn new(cas: Arc<dyn CasClient>, ledger: Arc<dyn LedgerClient>, versions: ProtocolVersions) -> Self {
        Self { cas, ledger, versions }
    }

    /// Write `operations` as one batch, in the given order.
    ///
    /// Protocol parameters are those in force at the ledger's latest time.
    /// The anchor file is validated with the same rules readers apply before
    /// anything is written.
    pub async fn write(&self, operations: &[Operation]) -> Result<WriteReceipt, WriteError> {
        let now = self.ledger.latest_time().await?;
        let params = self.versions.for_time(now.time);

        if let Some((index, op)) = operations
            .iter()
            .enumerate()
            .find(|(_, op)| op.as_bytes().len() > params.max_operation_byte_size)
        {
            return Err(BatchError::OperationInvalid {
                index,
                source: OperationError::ExceedsMaxSize {
                    size: op.as_bytes().len(),
                    max: params.max_operation_byte_size,
                },
            }
            .into());
        }

        let code = params.hash_algorithm_in_multihash_code;
        let batch = BatchAssembler::assemble_with(operations, params)?;
        let anchor_file = batch.anchor_file();
        let anchor_bytes = anchor_file.to_bytes();
        AnchorFile::parse_and_validate_with(&anchor_bytes, params)?;
        let expected_anchor_hash = anchor_file
            .hash_with(code)
            .map_err(|_| BatchError::HashAlgorithmUnsupported(code))?;

        let stored_batch_hash = self.cas.write(&batch.batch_bytes).await?;
        check_stored(&batch.batch_file_hash, stored_batch_hash)?;
        let anchor_file_hash = check_stored(&expected_anchor_hash, self.cas.write(&anchor_bytes).await?)?;
        let confirmation = self
            .ledger
            .write_anchor(&anchor_file_hash)
            .await
            .inspect_err(|e| warn!(code = e.code(), anchor_file_hash = %anchor_file_hash, "anchor write failed"))?;

        info!(
            operations = operations.len(),
            anchor_file_hash = %anchor_file_hash,
            transaction_number = confirmation.transaction_number,
            "batch anchored"
        );
        Ok(WriteReceipt {
            anchor_file_hash,
            batch_file_hash: batch.batch_file_hash,
            merkle_root: batch.merkle_root,
            did_unique_suffixes: batch.did_unique_suffixes,
            confirmation,
        })
    }
}

/// Readers fetch content by the hash they compute, so an address the CAS
/// chose differently makes the content unreachable.
fn check_stored(expected: &str, stored: String) -> Result<String, ClientError> {
    if stored == expected {
        Ok(stored)
    } else {
        warn!(expected, stored = %stored, "CAS stored content under a different hash");
        Err(ClientError::CasHashMismatch {
            expected: expected.to_string(),
            actual: stored,
        })
    }
}
