/// Errors from validating an anchor file.
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnchorFileError {
    #[error("anchor file is not a well-formed JSON object: {0}")]
    NotWellFormed(String),

    #[error("anchor file has unknown property `{0}`")]
    UnknownProperty(String),

    #[error("anchor file is missing `batchFileHash`")]
    BatchFileHashMissing,

    #[error("anchor file `batchFileHash` is not a string")]
    BatchFileHashNotString,

    #[error("anchor file `batchFileHash` is not a supported multihash")]
    BatchFileHashUnsupported,

    #[error("anchor file is missing `merkleRoot`")]
    MerkleRootMissing,

    #[error("anchor file `merkleRoot` is not a string")]
    MerkleRootNotString,

    #[error("anchor file `merkleRoot` is not a supported multihash")]
    MerkleRootUnsupported,

    #[error("anchor file is missing `didUniqueSuffixes`")]
    DidUniqueSuffixesMissing,

    #[error("anchor file `didUniqueSuffixes` is not an array")]
    DidUniqueSuffixesNotArray,

    #[error("anchor file `didUniqueSuffixes` is empty")]
    DidUniqueSuffixesEmpty,

    #[error("anchor file references {count} operations, max is {max}")]
    ExceededMaxOperationCount { count: usize, max: usize },

    #[error("DID unique suffix at index {index} is not a string")]
    DidUniqueSuffixEntryNotString { index: usize },

    #[error("DID unique suffix at index {index} is empty")]
    DidUniqueSuffixEmpty { index: usize },

    #[error("DID unique suffix at index {index} is {length} characters long")]
    DidUniqueSuffixTooLong { index: usize, length: usize },

    #[error("DID unique suffix `{suffix}` appears more than once")]
    DidUniqueSuffixesHasDuplicates { suffix: String },
}

impl AnchorFileError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotWellFormed(_) => "anchor_file_not_json",
            Self::UnknownProperty(_) => "anchor_file_has_unknown_property",
            Self::BatchFileHashMissing => "anchor_file_batch_file_hash_missing",
            Self::BatchFileHashNotString => "anchor_file_batch_file_hash_not_string",
            Self::BatchFileHashUnsupported => "anchor_file_batch_file_hash_unsupported",
            Self::MerkleRootMissing => "anchor_file_merkle_root_missing",
            Self::MerkleRootNotString => "anchor_file_merkle_root_not_string",
            Self::MerkleRootUnsupported => "anchor_file_merkle_root_unsupported",
            Self::DidUniqueSuffixesMissing => "anchor_file_did_unique_suffixes_missing",
            Self::DidUniqueSuffixesNotArray => "anchor_file_did_unique_suffixes_not_array",
            Self::DidUniqueSuffixesEmpty => "anchor_file_did_unique_suffixes_empty",
            Self::ExceededMaxOperationCount { .. } => "anchor_file_exceeded_max_operation_count",
            Self::DidUniqueSuffixEntryNotString { .. } => {
                "anchor_file_did_unique_suffix_entry_not_string"
            }
            Self::DidUniqueSuffixEmpty { .. } => "anchor_file_did_unique_suffix_empty",
            Self::DidUniqueSuffixTooLong { .. } => "anchor_file_did_unique_suffix_too_long",
            Self::DidUniqueSuffixesHasDuplicates { .. } => {
                "anchor_file_did_unique_suffixes_has_duplicates"
            }
        }
    }
}

/// Errors from parsing or constructing a single operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("operation is {size} bytes, max is {max}")]
    ExceedsMaxSize { size: usize, max: usize },

    #[error("operation is not a well-formed JSON object: {0}")]
    NotWellFormed(String),

    #[error("operation has unknown property `{0}`")]
    UnknownProperty(String),

    #[error("operation is missing `header`")]
    HeaderMissing,

    #[error("operation `header` is not an object")]
    HeaderNotObject,

    #[error("operation header has unknown property `{0}`")]
    HeaderUnknownProperty(String),

    #[error("operation header is missing `operation`")]
    KindMissing,

    #[error("operation header `operation` is not a string")]
    KindNotString,

    #[error("unknown operation kind `{0}`")]
    KindUnknown(String),

    #[error("operation header is missing `kid`")]
    KidMissing,

    #[error("operation header `kid` is not a string")]
    KidNotString,

    #[error("operation header is missing `alg`")]
    AlgMissing,

    #[error("operation header `alg` is not a string")]
    AlgNotString,

    #[error("unsupported signature algorithm `{0}`")]
    AlgUnsupported(String),

    #[error("operation is missing `payload`")]
    PayloadMissing,

    #[error("operation `payload` is not a string")]
    PayloadNotString,

    #[error("operation `payload` is not base64url encoded")]
    PayloadNotEncoded,

    #[error("operation is missing `signature`")]
    SignatureMissing,

    #[error("operation `signature` is not a string")]
    SignatureNotString,

    #[error("operation `signature` is not base64url encoded")]
    SignatureNotEncoded,

    #[error("decoded payload is not a well-formed JSON object: {0}")]
    PayloadNotWellFormed(String),

    #[error("create payload has no `publicKey` entries")]
    CreatePayloadPublicKeysMissing,

    #[error("payload is missing `didUniqueSuffix`")]
    PayloadDidUniqueSuffixMissing,

    #[error("payload `didUniqueSuffix` is invalid: {0}")]
    PayloadDidUniqueSuffixInvalid(String),
}

impl OperationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ExceedsMaxSize { .. } => "operation_exceeds_max_size",
            Self::NotWellFormed(_) => "operation_not_json",
            Self::UnknownProperty(_) => "operation_has_unknown_property",
            Self::HeaderMissing => "operation_header_missing",
            Self::HeaderNotObject => "operation_header_not_object",
            Self::HeaderUnknownProperty(_) => "operation_header_has_unknown_property",
            Self::KindMissing => "operation_kind_missing",
            Self::KindNotString => "operation_kind_not_string",
            Self::KindUnknown(_) => "operation_kind_unknown",
            Self::KidMissing => "operation_kid_missing",
            Self::KidNotString => "operation_kid_not_string",
            Self::AlgMissing => "operation_alg_missing",
            Self::AlgNotString => "operation_alg_not_string",
            Self::AlgUnsupported(_) => "operation_alg_unsupported",
            Self::PayloadMissing => "operation_payload_missing",
            Self::PayloadNotString => "operation_payload_not_string",
            Self::PayloadNotEncoded => "operation_payload_not_encoded",
            Self::SignatureMissing => "operation_signature_missing",
            Self::SignatureNotString => "operation_signature_not_string",
            Self::SignatureNotEncoded => "operation_signature_not_encoded",
            Self::PayloadNotWellFormed(_) => "operation_payload_not_json",
            Self::CreatePayloadPublicKeysMissing => "operation_create_payload_public_keys_missing",
            Self::PayloadDidUniqueSuffixMissing => "operation_payload_did_unique_suffix_missing",
            Self::PayloadDidUniqueSuffixInvalid(_) => "operation_payload_did_unique_suffix_invalid",
        }
    }
}

/// Errors from assembling, parsing, or binding a batch file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("cannot assemble an empty batch")]
    EmptyBatch,

    #[error("batch has {count} operations, max is {max}")]
    ExceededMaxOperationCount { count: usize, max: usize },

    #[error("cannot hash a batch with multihash code {0:#x}")]
    HashAlgorithmUnsupported(u64),

    #[error("batch file is not a well-formed JSON object: {0}")]
    NotWellFormed(String),

    #[error("batch file has unknown property `{0}`")]
    UnknownProperty(String),

    #[error("batch file is missing `operations`")]
    OperationsMissing,

    #[error("batch file `operations` is not an array")]
    OperationsNotArray,

    #[error("batch operation at index {index} is not a string")]
    OperationNotString { index: usize },

    #[error("batch operation at index {index} is not base64url encoded")]
    OperationNotEncoded { index: usize },

    #[error("batch operation at index {index} is invalid: {source}")]
    OperationInvalid { index: usize, source: OperationError },

    #[error("anchor file lists {expected} DID unique suffixes but batch has {actual} operations")]
    OperationCountMismatch { expected: usize, actual: usize },

    #[error("operation at index {index} does not match the anchored DID unique suffix")]
    DidUniqueSuffixMismatch { index: usize },
}

impl BatchError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "batch_empty",
            Self::ExceededMaxOperationCount { .. } => "batch_exceeded_max_operation_count",
            Self::HashAlgorithmUnsupported(_) => "batch_hash_algorithm_unsupported",
            Self::NotWellFormed(_) => "batch_file_not_json",
            Self::UnknownProperty(_) => "batch_file_has_unknown_property",
            Self::OperationsMissing => "batch_file_operations_missing",
            Self::OperationsNotArray => "batch_file_operations_not_array",
            Self::OperationNotString { .. } => "batch_file_operation_not_string",
            Self::OperationNotEncoded { .. } => "batch_file_operation_not_encoded",
            Self::OperationInvalid { .. } => "batch_file_operation_invalid",
            Self::OperationCountMismatch { .. } => "batch_file_operation_count_mismatch",
            Self::DidUniqueSuffixMismatch { .. } => "batch_file_did_unique_suffix_mismatch",
        }
    }
}

/// Any validation failure on untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    AnchorFile(#[from] AnchorFileError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AnchorFile(e) => e.code(),
            Self::Operation(e) => e.code(),
            Self::Batch(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_snake_case() {
        let samples: Vec<ValidationError> = vec![
            AnchorFileError::NotWellFormed("x".into()).into(),
            AnchorFileError::DidUniqueSuffixesHasDuplicates { suffix: "a".into() }.into(),
            OperationError::AlgUnsupported("RS256".into()).into(),
            BatchError::EmptyBatch.into(),
        ];
        for e in samples {
            let code = e.code();
            assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{code}");
        }
    }

    #[test]
    fn wrapped_code_delegates() {
        let e = ValidationError::from(AnchorFileError::MerkleRootNotString);
        assert_eq!(e.code(), "anchor_file_merkle_root_not_string");
        assert_eq!(e.to_string(), "anchor file `merkleRoot` is not a string");
    }

    #[test]
    fn batch_operation_error_has_source() {
        use std::error::Error as _;
        let e = BatchError::OperationInvalid {
            index: 3,
            source: OperationError::PayloadMissing,
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("index 3"));
    }
}
