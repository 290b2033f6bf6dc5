use std::sync::Arc;

use sidetree_core::{AnchorFile, BatchFile, KeyReference, MerkleBinder, Operation};
use sidetree_crypto::{MultihashValidator, PublicKey};
use sidetree_types::{DidUniqueSuffix, OperationKind, ProtocolVersions};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ProcessError};
use crate::traits::{AnchorTransaction, CasClient, KeyResolver, LedgerClient};

/// Why an operation in an otherwise valid batch was not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// No public key found for the operation's `kid`.
    KeyUnresolved { kid: String },
    /// The signature does not verify under the resolved key.
    InvalidSignature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedOperation {
    pub index: usize,
    pub did_unique_suffix: DidUniqueSuffix,
    pub reason: RejectionReason,
}

/// The result of processing one anchor transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedBatch {
    pub transaction: AnchorTransaction,
    pub anchor_file: AnchorFile,
    /// Accepted operations, in batch order.
    pub accepted: Vec<Operation>,
    pub rejected: Vec<RejectedOperation>,
}

impl ProcessedBatch {
    /// `(suffix, operation)` for each accepted operation, in batch order.
    pub fn accepted_by_suffix(&self) -> impl Iterator<Item = (&DidUniqueSuffix, &Operation)> {
        self.accepted.iter().map(|op| (op.did_unique_suffix(), op))
    }
}

/// Outcome of one transaction seen by [`AnchorProcessor::observe`].
#[derive(Debug)]
pub struct Observed {
    pub transaction: AnchorTransaction,
    pub outcome: Result<ProcessedBatch, ProcessError>,
}

/// Reads anchored batches back from CAS and validates them end to end.
pub struct AnchorProcessor {
    cas: Arc<dyn CasClient>,
    keys: Arc<dyn KeyResolver>,
    versions: ProtocolVersions,
}

impl AnchorProcessor {
    pub fn new(cas: Arc<dyn CasClient>, keys: Arc<dyn KeyResolver>, versions: ProtocolVersions) -> Self {
        Self { cas, keys, versions }
    }

    /// Fetch, validate, and verify the batch anchored by `transaction`.
    ///
    /// Structural and integrity failures reject the whole batch. Operations
    /// with an unresolvable key or a bad signature are listed in
    /// [`ProcessedBatch::rejected`] and the rest are still accepted.
    pub async fn process(&self, transaction: &AnchorTransaction) -> Result<ProcessedBatch, ProcessError> {
        self.process_inner(transaction)
            .await
            .inspect_err(|e| warn!(code = e.code(), transaction_number = transaction.transaction_number, "anchor rejected"))
    }

    async fn process_inner(&self, transaction: &AnchorTransaction) -> Result<ProcessedBatch, ProcessError> {
        let params = self.versions.for_time(transaction.transaction_time);

        let anchor_bytes = self.cas.read(&transaction.anchor_file_hash).await?;
        if !MultihashValidator::verify_content(&anchor_bytes, &transaction.anchor_file_hash) {
            return Err(ProcessError::ContentHashMismatch {
                expected: transaction.anchor_file_hash.clone(),
            });
        }
        let anchor_file = AnchorFile::parse_and_validate_with(&anchor_bytes, params)?;

        let batch_bytes = self.cas.read(anchor_file.batch_file_hash()).await?;
        if !MerkleBinder::verify_anchor(&batch_bytes, &anchor_file) {
            return Err(ProcessError::BatchIntegrity {
                batch_file_hash: anchor_file.batch_file_hash().to_string(),
            });
        }
        let batch = BatchFile::parse(&batch_bytes, params)?;
        batch.bind_to(&anchor_file)?;

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (index, op) in batch.into_operations().into_iter().enumerate() {
            match self.check_signature(&op).await {
                Ok(()) => accepted.push(op),
                Err(reason) => {
                    debug!(index, did_unique_suffix = %op.did_unique_suffix(), ?reason, "operation rejected");
                    rejected.push(RejectedOperation {
                        index,
                        did_unique_suffix: op.did_unique_suffix().clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            transaction_number = transaction.transaction_number,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "batch processed"
        );
        Ok(ProcessedBatch {
            transaction: transaction.clone(),
            anchor_file,
            accepted,
            rejected,
        })
    }

    async fn check_signature(&self, op: &Operation) -> Result<(), RejectionReason> {
        let key = self.resolve_key(op).await.ok_or_else(|| RejectionReason::KeyUnresolved {
            kid: op.header().kid.clone(),
        })?;
        if op.verify(&key) {
            Ok(())
        } else {
            Err(RejectionReason::InvalidSignature)
        }
    }

    async fn resolve_key(&self, op: &Operation) -> Option<PublicKey> {
        match (op.kind(), op.key_reference()) {
            (_, KeyReference::Inline(key)) => Some(key),
            // A create operation's key only ever comes from its own payload.
            (OperationKind::Create, KeyReference::Named(_)) => None,
            (_, KeyReference::Named(kid)) => self.keys.resolve(&kid, op.did_unique_suffix()).await,
        }
    }

    /// Process every transaction the ledger reports after `since`, paging
    /// until the ledger has no more.
    ///
    /// Only ledger failures abort. Each transaction's own failure is returned
    /// in its [`Observed::outcome`]. A page that does not move the cursor ends
    /// the walk even if the ledger claims more transactions.
    pub async fn observe(
        &self,
        ledger: &dyn LedgerClient,
        since: Option<&AnchorTransaction>,
    ) -> Result<Vec<Observed>, ClientError> {
        let mut cursor = since.map(|tx| (tx.transaction_number, tx.transaction_time_hash.clone()));
        let mut observed = Vec::new();
        loop {
            let last_seen = cursor.as_ref().map(|c| c.0);
            let page = ledger
                .read(cursor.as_ref().map(|c| c.0), cursor.as_ref().map(|c| c.1.as_str()))
                .await
                .inspect_err(|e| warn!(code = e.code(), "ledger read failed"))?;
            for transaction in page.transactions {
                let outcome = self.process(&transaction).await;
                cursor = Some((transaction.transaction_number, transaction.transaction_time_hash.clone()));
                observed.push(Observed { transaction, outcome });
            }
            if !page.more_transactions {
                return Ok(observed);
            }
            if cursor.as_ref().map(|c| c.0) == last_seen {
                warn!(since = ?last_seen, "ledger reported more transactions but returned none past the cursor");
                return Ok(observed);
            }
        }
    }
}
