use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use sidetree_crypto::{HashAlgorithm, Multihash, MultihashValidator, PublicKey};
use sidetree_types::DidUniqueSuffix;

use crate::error::{ClientError, ClientResult};
use crate::traits::{AnchorTransaction, CasClient, ConfirmationHandle, KeyResolver, LedgerClient, LedgerTime, ReadResult};

/// In-memory, HashMap-based CAS.
///
/// Intended for tests and embedding. Content is keyed by its multihash
/// (SHA2-256 unless configured otherwise) and cloned on read and write.
pub struct InMemoryCas {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    algorithm: HashAlgorithm,
    online: AtomicBool,
}

impl InMemoryCas {
    pub fn new() -> Self {
        Self::with_hash_algorithm(HashAlgorithm::Sha2_256)
    }

    /// A CAS that addresses content by its `algorithm` multihash.
    pub fn with_hash_algorithm(algorithm: HashAlgorithm) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            algorithm,
            online: AtomicBool::new(true),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Store `content` under an arbitrary key, bypassing content addressing.
    pub fn insert_raw(&self, hash: impl Into<String>, content: Vec<u8>) {
        self.objects.write().expect("lock poisoned").insert(hash.into(), content);
    }

    /// While offline every call fails with `CasUnavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> ClientResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::CasUnavailable("offline".into()))
        }
    }
}

impl Default for InMemoryCas {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CasClient for InMemoryCas {
    async fn read(&self, hash: &str) -> ClientResult<Vec<u8>> {
        self.check_online()?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(hash).cloned().ok_or_else(|| ClientError::CasNotFound(hash.to_string()))
    }

    async fn write(&self, content: &[u8]) -> ClientResult<String> {
        self.check_online()?;
        let hash = Multihash::compute(self.algorithm, content)
            .map_err(|e| ClientError::CasUnavailable(e.to_string()))?
            .encode();
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(hash.clone()).or_insert_with(|| content.to_vec());
        Ok(hash)
    }
}

struct LedgerState {
    time: u64,
    transactions: Vec<AnchorTransaction>,
}

/// In-memory ledger.
///
/// Every anchor write becomes a transaction at the current time; time only
/// moves with [`InMemoryLedger::advance_time`]. Reads are paged.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    page_size: usize,
    online: AtomicBool,
}

impl InMemoryLedger {
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_page_size(Self::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                time: 0,
                transactions: Vec::new(),
            }),
            page_size: page_size.max(1),
            online: AtomicBool::new(true),
        }
    }

    pub fn advance_time(&self, blocks: u64) {
        self.state.write().expect("lock poisoned").time += blocks;
    }

    pub fn transactions(&self) -> Vec<AnchorTransaction> {
        self.state.read().expect("lock poisoned").transactions.clone()
    }

    /// While offline every call fails with the matching `*ResponseNotOk`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Hash identifying ledger time `time`.
    pub fn time_hash(time: u64) -> String {
        MultihashValidator::hash(&time.to_be_bytes())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn latest_time(&self) -> ClientResult<LedgerTime> {
        if !self.is_online() {
            return Err(ClientError::BlockchainGetLatestTimeResponseNotOk("offline".into()));
        }
        let time = self.state.read().expect("lock poisoned").time;
        Ok(LedgerTime {
            time,
            hash: Self::time_hash(time),
        })
    }

    async fn read(&self, since: Option<u64>, time_hash: Option<&str>) -> ClientResult<ReadResult> {
        if since.is_some() != time_hash.is_some() {
            return Err(ClientError::BlockchainReadInvalidArguments);
        }
        if !self.is_online() {
            return Err(ClientError::BlockchainReadResponseNotOk("offline".into()));
        }
        let state = self.state.read().expect("lock poisoned");
        let mut pending = state
            .transactions
            .iter()
            .filter(|tx| since.map_or(true, |since| tx.transaction_number > since));
        let transactions: Vec<AnchorTransaction> = pending.by_ref().take(self.page_size).cloned().collect();
        Ok(ReadResult {
            more_transactions: pending.next().is_some(),
            transactions,
        })
    }

    async fn write_anchor(&self, anchor_file_hash: &str) -> ClientResult<ConfirmationHandle> {
        if !self.is_online() {
            return Err(ClientError::BlockchainWriteResponseNotOk("offline".into()));
        }
        let mut state = self.state.write().expect("lock poisoned");
        let transaction = AnchorTransaction {
            transaction_number: state.transactions.len() as u64 + 1,
            transaction_time: state.time,
            transaction_time_hash: Self::time_hash(state.time),
            anchor_file_hash: anchor_file_hash.to_string(),
        };
        let handle = ConfirmationHandle {
            transaction_number: transaction.transaction_number,
            transaction_time: transaction.transaction_time,
        };
        state.transactions.push(transaction);
        Ok(handle)
    }
}

/// In-memory key registry for update and delete signers.
pub struct InMemoryKeyResolver {
    keys: RwLock<HashMap<(DidUniqueSuffix, String), PublicKey>>,
}

impl InMemoryKeyResolver {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, did_unique_suffix: DidUniqueSuffix, kid: impl Into<String>, key: PublicKey) {
        self.keys
            .write()
            .expect("lock poisoned")
            .insert((did_unique_suffix, kid.into()), key);
    }
}

impl Default for InMemoryKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyResolver for InMemoryKeyResolver {
    async fn resolve(&self, kid: &str, did_unique_suffix: &DidUniqueSuffix) -> Option<PublicKey> {
        let keys = self.keys.read().expect("lock poisoned");
        keys.get(&(did_unique_suffix.clone(), kid.to_string())).cloned()
    }
}
