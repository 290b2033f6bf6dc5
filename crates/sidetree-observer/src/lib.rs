//! Write and read paths for Sidetree batches.
//!
//! The writer assembles operations into a batch, stores the batch file and
//! its anchor file in content-addressable storage, and anchors the anchor
//! file's hash on a ledger. The processor walks ledger transactions back,
//! fetches both files, and validates them end to end.
//!
//! # Collaborators
//!
//! All external systems sit behind async traits:
//!
//! - [`CasClient`]: content-addressable storage keyed by multihash
//! - [`LedgerClient`]: ordered anchor transactions and ledger time
//! - [`KeyResolver`]: signing keys for update and delete operations
//!
//! [`InMemoryCas`], [`InMemoryLedger`] and [`InMemoryKeyResolver`] back
//! tests and embedding.

pub mod error;
pub mod memory;
pub mod processor;
pub mod traits;
pub mod writer;

pub use error::{ClientError, ClientResult, ProcessError, WriteError};
pub use memory::{InMemoryCas, InMemoryKeyResolver, InMemoryLedger};
pub use processor::{AnchorProcessor, Observed, ProcessedBatch, RejectedOperation, RejectionReason};
pub use traits::{AnchorTransaction, CasClient, ConfirmationHandle, KeyResolver, LedgerClient, LedgerTime, ReadResult};
pub use writer::{BatchWriter, WriteReceipt};
