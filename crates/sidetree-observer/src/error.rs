use sidetree_core::{AnchorFileError, BatchError, ValidationError};

/// Errors from the CAS and ledger collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("ledger latest-time request failed: {0}")]
    BlockchainGetLatestTimeResponseNotOk(String),

    #[error("ledger read needs both `since` and `time_hash`, or neither")]
    BlockchainReadInvalidArguments,

    #[error("ledger read request failed: {0}")]
    BlockchainReadResponseNotOk(String),

    #[error("ledger write request failed: {0}")]
    BlockchainWriteResponseNotOk(String),

    #[error("content not found in CAS: {0}")]
    CasNotFound(String),

    #[error("CAS unavailable: {0}")]
    CasUnavailable(String),

    /// The CAS stored content under an address other than its content hash.
    #[error("CAS stored content as {actual}, expected {expected}")]
    CasHashMismatch { expected: String, actual: String },
}

impl ClientError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlockchainGetLatestTimeResponseNotOk(_) => "blockchain_get_latest_time_response_not_ok",
            Self::BlockchainReadInvalidArguments => "blockchain_read_invalid_arguments",
            Self::BlockchainReadResponseNotOk(_) => "blockchain_read_response_not_ok",
            Self::BlockchainWriteResponseNotOk(_) => "blockchain_write_response_not_ok",
            Self::CasNotFound(_) => "cas_not_found",
            Self::CasUnavailable(_) => "cas_unavailable",
            Self::CasHashMismatch { .. } => "cas_hash_mismatch",
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Failure to process one anchor transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("collaborator failed: {0}")]
    Client(#[from] ClientError),

    /// The CAS returned content that does not hash to the requested address.
    #[error("content for {expected} does not match its hash")]
    ContentHashMismatch { expected: String },

    /// Batch bytes do not reproduce the anchored hash and Merkle root.
    #[error("batch {batch_file_hash} does not match the anchored commitments")]
    BatchIntegrity { batch_file_hash: String },
}

impl ProcessError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Client(e) => e.code(),
            Self::ContentHashMismatch { .. } => "content_hash_mismatch",
            Self::BatchIntegrity { .. } => "batch_integrity_mismatch",
        }
    }
}

impl From<AnchorFileError> for ProcessError {
    fn from(e: AnchorFileError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<BatchError> for ProcessError {
    fn from(e: BatchError) -> Self {
        Self::Validation(e.into())
    }
}

/// Failure to write a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("collaborator failed: {0}")]
    Client(#[from] ClientError),
}

impl WriteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Client(e) => e.code(),
        }
    }
}

impl From<AnchorFileError> for WriteError {
    fn from(e: AnchorFileError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<BatchError> for WriteError {
    fn from(e: BatchError) -> Self {
        Self::Validation(e.into())
    }
}
