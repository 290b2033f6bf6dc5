use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Multihash code of SHA2-256.
pub const SHA2_256_MULTIHASH_CODE: u64 = 0x12;

/// Protocol parameters in force for one network epoch.
///
/// Limits such as the batch size are network parameters rather than
/// constants, so validation code always receives them from the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParameters {
    /// Ledger time at which this epoch starts (inclusive).
    pub start_time: u64,
    /// Maximum number of operations in one batch / anchor file.
    pub max_operations_per_batch: usize,
    /// Maximum size of a single encoded operation record, in bytes.
    pub max_operation_byte_size: usize,
    /// Multihash code used when the writer computes new hashes.
    pub hash_algorithm_in_multihash_code: u64,
    /// Multihash codes accepted from untrusted input.
    pub hash_algorithms_in_multihash_code: Vec<u64>,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            start_time: 0,
            max_operations_per_batch: 10_000,
            max_operation_byte_size: 2_000,
            hash_algorithm_in_multihash_code: SHA2_256_MULTIHASH_CODE,
            hash_algorithms_in_multihash_code: vec![SHA2_256_MULTIHASH_CODE],
        }
    }
}

impl ProtocolParameters {
    /// Default parameters with a different batch-size limit.
    pub fn with_max_operations_per_batch(max_operations_per_batch: usize) -> Self {
        Self {
            max_operations_per_batch,
            ..Default::default()
        }
    }

    /// Returns `true` if `code` is on this epoch's hash allow-list.
    pub fn is_hash_algorithm_allowed(&self, code: u64) -> bool {
        self.hash_algorithms_in_multihash_code.contains(&code)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.max_operations_per_batch == 0 {
            return Err(TypeError::InvalidParameters(
                "max_operations_per_batch must be positive".into(),
            ));
        }
        if self.max_operation_byte_size == 0 {
            return Err(TypeError::InvalidParameters(
                "max_operation_byte_size must be positive".into(),
            ));
        }
        if self.hash_algorithms_in_multihash_code.is_empty() {
            return Err(TypeError::InvalidParameters(
                "hash algorithm allow-list is empty".into(),
            ));
        }
        if !self.is_hash_algorithm_allowed(self.hash_algorithm_in_multihash_code) {
            return Err(TypeError::InvalidParameters(format!(
                "writer hash algorithm {:#x} is not on the allow-list",
                self.hash_algorithm_in_multihash_code
            )));
        }
        Ok(())
    }
}

/// Time-indexed set of protocol parameter epochs.
///
/// Loaded from TOML:
///
/// ```toml
/// [[versions]]
/// start_time = 0
/// max_operations_per_batch = 10000
///
/// [[versions]]
/// start_time = 500000
/// max_operations_per_batch = 20000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VersionsFile")]
pub struct ProtocolVersions {
    versions: Vec<ProtocolParameters>,
}

#[derive(Deserialize)]
struct VersionsFile {
    versions: Vec<ProtocolParameters>,
}

impl TryFrom<VersionsFile> for ProtocolVersions {
    type Error = TypeError;

    fn try_from(file: VersionsFile) -> Result<Self, Self::Error> {
        Self::new(file.versions)
    }
}

impl Default for ProtocolVersions {
    fn default() -> Self {
        Self::single(ProtocolParameters::default())
    }
}

impl ProtocolVersions {
    /// A single epoch that applies from genesis onward.
    pub fn single(params: ProtocolParameters) -> Self {
        Self {
            versions: vec![ProtocolParameters {
                start_time: 0,
                ..params
            }],
        }
    }

    /// Build from explicit epochs, validating ordering and limits.
    pub fn new(versions: Vec<ProtocolParameters>) -> Result<Self, TypeError> {
        let versions = Self { versions };
        versions.validate()?;
        Ok(versions)
    }

    /// Parse and validate a TOML document with `[[versions]]` tables.
    pub fn from_toml_str(source: &str) -> Result<Self, TypeError> {
        let file: VersionsFile =
            toml::from_str(source).map_err(|e| TypeError::Config(e.to_string()))?;
        Self::new(file.versions)
    }

    /// The parameters in force at ledger time `time`.
    ///
    /// Times before the first epoch fall back to the first epoch.
    pub fn for_time(&self, time: u64) -> &ProtocolParameters {
        let idx = self
            .versions
            .iter()
            .rposition(|v| v.start_time <= time)
            .unwrap_or(0);
        // Construction guarantees at least one epoch.
        &self.versions[idx]
    }

    /// All epochs, ordered by start time.
    pub fn versions(&self) -> &[ProtocolParameters] {
        &self.versions
    }

    fn validate(&self) -> Result<(), TypeError> {
        if self.versions.is_empty() {
            return Err(TypeError::InvalidParameters("no protocol versions".into()));
        }
        for pair in self.versions.windows(2) {
            if pair[1].start_time <= pair[0].start_time {
                return Err(TypeError::InvalidParameters(format!(
                    "start times must be strictly increasing: {} then {}",
                    pair[0].start_time, pair[1].start_time
                )));
            }
        }
        self.versions.iter().try_for_each(ProtocolParameters::validate)
    }
}
