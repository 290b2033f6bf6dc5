use async_trait::async_trait;
use sidetree_crypto::PublicKey;
use sidetree_types::DidUniqueSuffix;

use crate::error::ClientResult;

/// A point in ledger time: block height and its hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerTime {
    pub time: u64,
    pub hash: String,
}

/// One anchor file hash recorded on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorTransaction {
    pub transaction_number: u64,
    pub transaction_time: u64,
    pub transaction_time_hash: String,
    pub anchor_file_hash: String,
}

/// A page of anchor transactions in transaction-number order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadResult {
    pub more_transactions: bool,
    pub transactions: Vec<AnchorTransaction>,
}

/// Returned by [`LedgerClient::write_anchor`] once the ledger accepts a write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmationHandle {
    pub transaction_number: u64,
    pub transaction_time: u64,
}

/// Content-addressable storage keyed by encoded multihash.
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Fetch content by hash. `CasNotFound` if absent.
    async fn read(&self, hash: &str) -> ClientResult<Vec<u8>>;

    /// Store content and return its hash. Idempotent.
    async fn write(&self, content: &[u8]) -> ClientResult<String>;
}

/// The ledger that orders anchor file hashes.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn latest_time(&self) -> ClientResult<LedgerTime>;

    /// Read transactions after `since`. `since` and `time_hash` are given
    /// together or not at all; giving only one is
    /// `BlockchainReadInvalidArguments`.
    async fn read(&self, since: Option<u64>, time_hash: Option<&str>) -> ClientResult<ReadResult>;

    async fn write_anchor(&self, anchor_file_hash: &str) -> ClientResult<ConfirmationHandle>;
}

/// Resolves named signing keys against current DID state.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str, did_unique_suffix: &DidUniqueSuffix) -> Option<PublicKey>;
}
