use std::collections::HashSet;

use serde_json::{json, Value};
use sidetree_crypto::{MultihashError, MultihashValidator};
use sidetree_types::{DidUniqueSuffix, ProtocolParameters, MAX_DID_UNIQUE_SUFFIX_LENGTH};
use tracing::debug;

use crate::error::AnchorFileError;
use crate::json;

const BATCH_FILE_HASH: &str = "batchFileHash";
const DID_UNIQUE_SUFFIXES: &str = "didUniqueSuffixes";
const MERKLE_ROOT: &str = "merkleRoot";

/// The record anchored on the ledger.
///
/// An anchor file references one batch file by content hash, commits to the
/// batch's operations through a Merkle root, and lists the DID unique suffix
/// of each operation in batch order. Values are immutable: a changed anchor
/// file is a different file with a different hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorFile {
    batch_file_hash: String,
    merkle_root: String,
    did_unique_suffixes: Vec<DidUniqueSuffix>,
}

impl AnchorFile {
    /// Writer-side constructor for a freshly assembled batch.
    pub fn new(
        batch_file_hash: impl Into<String>,
        merkle_root: impl Into<String>,
        did_unique_suffixes: Vec<DidUniqueSuffix>,
    ) -> Self {
        Self {
            batch_file_hash: batch_file_hash.into(),
            merkle_root: merkle_root.into(),
            did_unique_suffixes,
        }
    }

    /// Parse and validate untrusted anchor file bytes with the default hash
    /// allow-list (SHA2-256) and the given batch-size limit.
    pub fn parse_and_validate(bytes: &[u8], max_operations_per_batch: usize) -> Result<Self, AnchorFileError> {
        let params = ProtocolParameters::with_max_operations_per_batch(max_operations_per_batch);
        Self::parse_and_validate_with(bytes, &params)
    }

    /// Parse and validate untrusted anchor file bytes under `params`.
    ///
    /// Checks run in a fixed order and stop at the first failure, so the same
    /// input always yields the same error.
    pub fn parse_and_validate_with(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, AnchorFileError> {
        Self::validate(bytes, params).inspect_err(|e| debug!(code = e.code(), "anchor file rejected"))
    }

    fn validate(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, AnchorFileError> {
        let allowed = params.hash_algorithms_in_multihash_code.as_slice();

        let object = json::parse_object(bytes, AnchorFileError::NotWellFormed)?;
        json::reject_unknown(
            &object,
            &[BATCH_FILE_HASH, DID_UNIQUE_SUFFIXES, MERKLE_ROOT],
            AnchorFileError::UnknownProperty,
        )?;

        let batch_file_hash = json::required_str(
            &object,
            BATCH_FILE_HASH,
            AnchorFileError::BatchFileHashMissing,
            AnchorFileError::BatchFileHashNotString,
        )?;
        if !MultihashValidator::is_supported_hash(batch_file_hash, allowed) {
            return Err(AnchorFileError::BatchFileHashUnsupported);
        }

        let merkle_root = json::required_str(
            &object,
            MERKLE_ROOT,
            AnchorFileError::MerkleRootMissing,
            AnchorFileError::MerkleRootNotString,
        )?;
        if !MultihashValidator::is_supported_hash(merkle_root, allowed) {
            return Err(AnchorFileError::MerkleRootUnsupported);
        }

        let entries = json::required_array(
            &object,
            DID_UNIQUE_SUFFIXES,
            AnchorFileError::DidUniqueSuffixesMissing,
            AnchorFileError::DidUniqueSuffixesNotArray,
        )?;
        if entries.is_empty() {
            return Err(AnchorFileError::DidUniqueSuffixesEmpty);
        }
        if entries.len() > params.max_operations_per_batch {
            return Err(AnchorFileError::ExceededMaxOperationCount {
                count: entries.len(),
                max: params.max_operations_per_batch,
            });
        }

        let mut strings = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                Value::String(s) => strings.push(s.as_str()),
                _ => return Err(AnchorFileError::DidUniqueSuffixEntryNotString { index }),
            }
        }

        let mut suffixes = Vec::with_capacity(strings.len());
        for (index, s) in strings.iter().enumerate() {
            if s.is_empty() {
                return Err(AnchorFileError::DidUniqueSuffixEmpty { index });
            }
            let length = s.encode_utf16().count();
            if length > MAX_DID_UNIQUE_SUFFIX_LENGTH {
                return Err(AnchorFileError::DidUniqueSuffixTooLong { index, length });
            }
            let suffix = DidUniqueSuffix::new(*s)
                .map_err(|_| AnchorFileError::DidUniqueSuffixTooLong { index, length })?;
            suffixes.push(suffix);
        }

        let mut seen = HashSet::with_capacity(suffixes.len());
        for suffix in &suffixes {
            if !seen.insert(suffix.as_str()) {
                return Err(AnchorFileError::DidUniqueSuffixesHasDuplicates {
                    suffix: suffix.to_string(),
                });
            }
        }

        Ok(Self {
            batch_file_hash: batch_file_hash.to_string(),
            merkle_root: merkle_root.to_string(),
            did_unique_suffixes: suffixes,
        })
    }

    pub fn batch_file_hash(&self) -> &str {
        &self.batch_file_hash
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    /// DID unique suffixes in batch order.
    pub fn did_unique_suffixes(&self) -> &[DidUniqueSuffix] {
        &self.did_unique_suffixes
    }

    /// Compact JSON with keys in sorted order, so one logical value always
    /// serializes to the same bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let suffixes: Vec<&str> = self.did_unique_suffixes.iter().map(DidUniqueSuffix::as_str).collect();
        json!({
            BATCH_FILE_HASH: self.batch_file_hash,
            DID_UNIQUE_SUFFIXES: suffixes,
            MERKLE_ROOT: self.merkle_root,
        })
        .to_string()
        .into_bytes()
    }

    /// SHA2-256 content hash of [`Self::to_bytes`].
    pub fn hash(&self) -> String {
        MultihashValidator::hash(&self.to_bytes())
    }

    /// Content hash of [`Self::to_bytes`] under multihash `code`; with the
    /// writer's code this is what gets anchored.
    pub fn hash_with(&self, code: u64) -> Result<String, MultihashError> {
        MultihashValidator::hash_with(code, &self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HASH: &str = "EiB4ypIXxG9aFhXv2YC8I2tQvLEBbQAsNzHmph17vMfVYA";
    const SUFFIX_A: &str = "EiA-GtHEOH9IcEEoBQ9p1KCMIjTmTO8x2qXJPb20ry6C0A";
    const SUFFIX_B: &str = "EiA4zvhtvzTdeLAg8_Pvdtk5xJreNuIpvSpCCbtiTVc8Ow";

    fn valid() -> Value {
        json!({
            "batchFileHash": HASH,
            "merkleRoot": HASH,
            "didUniqueSuffixes": [SUFFIX_A, SUFFIX_B],
        })
    }

    fn parse(value: &Value, max: usize) -> Result<AnchorFile, AnchorFileError> {
        AnchorFile::parse_and_validate(value.to_string().as_bytes(), max)
    }

    fn with(field: &str, replacement: Value) -> Value {
        let mut value = valid();
        value[field] = replacement;
        value
    }

    fn without(field: &str) -> Value {
        let mut value = valid();
        value.as_object_mut().unwrap().remove(field);
        value
    }

    #[test]
    fn parses_valid_anchor_file_in_order() {
        let anchor = parse(&valid(), 2).unwrap();
        assert_eq!(anchor.batch_file_hash(), HASH);
        assert_eq!(anchor.merkle_root(), HASH);
        let suffixes: Vec<&str> = anchor.did_unique_suffixes().iter().map(|s| s.as_str()).collect();
        assert_eq!(suffixes, vec![SUFFIX_A, SUFFIX_B]);
    }

    #[test]
    fn not_json() {
        assert!(matches!(
            AnchorFile::parse_and_validate(b"NotJsonString", 1),
            Err(AnchorFileError::NotWellFormed(_))
        ));
    }

    #[test]
    fn json_but_not_object() {
        assert!(matches!(
            AnchorFile::parse_and_validate(b"[1,2,3]", 1),
            Err(AnchorFileError::NotWellFormed(_))
        ));
    }

    #[test]
    fn unknown_property() {
        let value = with("unknownProperty", json!("Unknown property"));
        assert_eq!(
            parse(&value, 1),
            Err(AnchorFileError::UnknownProperty("unknownProperty".into()))
        );
    }

    #[test]
    fn missing_batch_file_hash() {
        assert_eq!(parse(&without("batchFileHash"), 1), Err(AnchorFileError::BatchFileHashMissing));
    }

    #[test]
    fn missing_did_unique_suffixes() {
        assert_eq!(
            parse(&without("didUniqueSuffixes"), 1),
            Err(AnchorFileError::DidUniqueSuffixesMissing)
        );
    }

    #[test]
    fn missing_merkle_root() {
        assert_eq!(parse(&without("merkleRoot"), 1), Err(AnchorFileError::MerkleRootMissing));
    }

    #[test]
    fn batch_file_hash_not_string() {
        assert_eq!(
            parse(&with("batchFileHash", json!(12345)), 1),
            Err(AnchorFileError::BatchFileHashNotString)
        );
    }

    #[test]
    fn batch_file_hash_unsupported() {
        assert_eq!(
            parse(&with("batchFileHash", json!("InvalidHash")), 1),
            Err(AnchorFileError::BatchFileHashUnsupported)
        );
    }

    #[test]
    fn merkle_root_not_string() {
        assert_eq!(
            parse(&with("merkleRoot", json!(12345)), 2),
            Err(AnchorFileError::MerkleRootNotString)
        );
    }

    #[test]
    fn merkle_root_unsupported() {
        assert_eq!(
            parse(&with("merkleRoot", json!("InvalidHash")), 2),
            Err(AnchorFileError::MerkleRootUnsupported)
        );
    }

    #[test]
    fn did_unique_suffixes_not_array() {
        assert_eq!(
            parse(&with("didUniqueSuffixes", json!("IncorrectType")), 1),
            Err(AnchorFileError::DidUniqueSuffixesNotArray)
        );
    }

    #[test]
    fn did_unique_suffixes_empty() {
        assert_eq!(
            parse(&with("didUniqueSuffixes", json!([])), 1),
            Err(AnchorFileError::DidUniqueSuffixesEmpty)
        );
    }

    #[test]
    fn exceeded_max_operation_count() {
        assert_eq!(
            parse(&valid(), 1),
            Err(AnchorFileError::ExceededMaxOperationCount { count: 2, max: 1 })
        );
    }

    #[test]
    fn duplicates() {
        let value = with("didUniqueSuffixes", json!([SUFFIX_A, SUFFIX_A]));
        assert_eq!(
            parse(&value, 2),
            Err(AnchorFileError::DidUniqueSuffixesHasDuplicates { suffix: SUFFIX_A.into() })
        );
    }

    #[test]
    fn entry_not_string() {
        let value = with("didUniqueSuffixes", json!([SUFFIX_A, 12345]));
        assert_eq!(
            parse(&value, 2),
            Err(AnchorFileError::DidUniqueSuffixEntryNotString { index: 1 })
        );
    }

    #[test]
    fn entry_too_long() {
        let long = "SuperLongDidUniqueSuffixSuperLongDidUniqueSuffixSuperLongDidUniqueSuffix";
        let value = with("didUniqueSuffixes", json!([long]));
        assert_eq!(
            parse(&value, 1),
            Err(AnchorFileError::DidUniqueSuffixTooLong { index: 0, length: long.len() })
        );
    }

    #[test]
    fn entry_empty() {
        let value = with("didUniqueSuffixes", json!([SUFFIX_A, ""]));
        assert_eq!(parse(&value, 2), Err(AnchorFileError::DidUniqueSuffixEmpty { index: 1 }));
    }

    #[test]
    fn non_string_entry_reported_before_long_entry() {
        let long = "x".repeat(MAX_DID_UNIQUE_SUFFIX_LENGTH + 1);
        let value = with("didUniqueSuffixes", json!([long, 7]));
        assert_eq!(
            parse(&value, 2),
            Err(AnchorFileError::DidUniqueSuffixEntryNotString { index: 1 })
        );
    }

    #[test]
    fn unknown_property_checked_before_missing_fields() {
        let value = json!({ "extra": true });
        assert_eq!(parse(&value, 1), Err(AnchorFileError::UnknownProperty("extra".into())));
    }

    #[test]
    fn duplicate_detection_is_case_sensitive() {
        let value = with("didUniqueSuffixes", json!(["EiAabc", "EiAABC"]));
        assert!(parse(&value, 2).is_ok());
    }

    #[test]
    fn hash_allow_list_comes_from_parameters() {
        let sha512 = MultihashValidator::hash_with(0x13, b"batch").unwrap();
        let value = with("batchFileHash", json!(sha512));
        assert_eq!(parse(&value, 2), Err(AnchorFileError::BatchFileHashUnsupported));

        let params = ProtocolParameters {
            max_operations_per_batch: 2,
            hash_algorithms_in_multihash_code: vec![0x12, 0x13],
            ..Default::default()
        };
        assert!(AnchorFile::parse_and_validate_with(value.to_string().as_bytes(), &params).is_ok());
    }

    #[test]
    fn entry_length_counts_utf16_code_units() {
        let fits = "\u{1F600}".repeat(MAX_DID_UNIQUE_SUFFIX_LENGTH / 2);
        assert!(parse(&with("didUniqueSuffixes", json!([fits])), 1).is_ok());

        let over = "\u{1F600}".repeat(MAX_DID_UNIQUE_SUFFIX_LENGTH / 2 + 1);
        assert_eq!(over.chars().count(), 24);
        assert_eq!(
            parse(&with("didUniqueSuffixes", json!([over])), 1),
            Err(AnchorFileError::DidUniqueSuffixTooLong { index: 0, length: 48 })
        );

        let bmp = "\u{20AC}".repeat(MAX_DID_UNIQUE_SUFFIX_LENGTH);
        assert!(parse(&with("didUniqueSuffixes", json!([bmp])), 1).is_ok());
    }

    #[test]
    fn hash_with_follows_multihash_code() {
        let anchor = parse(&valid(), 2).unwrap();
        assert_eq!(anchor.hash_with(0x12).unwrap(), anchor.hash());
        let sha512 = anchor.hash_with(0x13).unwrap();
        assert!(MultihashValidator::verify_content(&anchor.to_bytes(), &sha512));
        assert_ne!(sha512, anchor.hash());
        assert_eq!(anchor.hash_with(0x11), Err(MultihashError::Deprecated(0x11)));
    }

    #[test]
    fn serialization_is_byte_stable() {
        let anchor = parse(&valid(), 2).unwrap();
        let bytes = anchor.to_bytes();
        let reparsed = AnchorFile::parse_and_validate(&bytes, 2).unwrap();
        assert_eq!(reparsed, anchor);
        assert_eq!(reparsed.to_bytes(), bytes);
        assert_eq!(reparsed.hash(), anchor.hash());
        assert!(std::str::from_utf8(&bytes).unwrap().starts_with("{\"batchFileHash\":"));
    }

    fn suffix_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,46}"
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = AnchorFile::parse_and_validate(&bytes, 10);
        }

        #[test]
        fn non_json_text_is_not_well_formed(s in "[A-Za-z ]{1,40}") {
            prop_assume!(serde_json::from_str::<Value>(&s).is_err());
            prop_assert!(matches!(
                AnchorFile::parse_and_validate(s.as_bytes(), 10),
                Err(AnchorFileError::NotWellFormed(_))
            ));
        }

        #[test]
        fn any_extra_property_is_unknown(key in "[a-zA-Z]{1,16}", extra in any::<i64>()) {
            prop_assume!(![BATCH_FILE_HASH, DID_UNIQUE_SUFFIXES, MERKLE_ROOT].contains(&key.as_str()));
            let value = with(&key, json!(extra));
            prop_assert_eq!(parse(&value, 2), Err(AnchorFileError::UnknownProperty(key)));
        }

        #[test]
        fn duplicate_anywhere_is_detected(
            suffixes in proptest::collection::hash_set(suffix_strategy(), 1..20),
            pick in any::<prop::sample::Index>(),
            insert_at in any::<prop::sample::Index>(),
        ) {
            let mut list: Vec<String> = suffixes.into_iter().collect();
            let dup = list[pick.index(list.len())].clone();
            let at = insert_at.index(list.len() + 1);
            list.insert(at, dup.clone());
            let value = with("didUniqueSuffixes", json!(list));
            prop_assert_eq!(
                parse(&value, list.len()),
                Err(AnchorFileError::DidUniqueSuffixesHasDuplicates { suffix: dup })
            );
        }

        #[test]
        fn max_count_boundary(
            suffixes in proptest::collection::hash_set(suffix_strategy(), 1..30),
        ) {
            let list: Vec<String> = suffixes.into_iter().collect();
            let value = with("didUniqueSuffixes", json!(list));
            prop_assert!(parse(&value, list.len()).is_ok());
            if list.len() > 1 {
                prop_assert_eq!(
                    parse(&value, list.len() - 1),
                    Err(AnchorFileError::ExceededMaxOperationCount {
                        count: list.len(),
                        max: list.len() - 1,
                    })
                );
            }
        }
    }
}
