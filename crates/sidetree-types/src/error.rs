use thiserror::Error;

/// Errors produced by type construction and parameter loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("DID unique suffix is empty")]
    EmptySuffix,

    #[error("DID unique suffix too long: max {max}, got {actual}")]
    SuffixTooLong { max: usize, actual: usize },

    #[error("unknown operation kind: {0}")]
    UnknownOperationKind(String),

    #[error("invalid protocol parameters: {0}")]
    InvalidParameters(String),

    #[error("configuration parse error: {0}")]
    Config(String),
}
