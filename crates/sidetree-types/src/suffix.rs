use std::fmt;

use crate::error::TypeError;

/// Maximum length of a DID unique suffix, in UTF-16 code units.
///
/// A suffix is the base64url encoding of a SHA2-256 multihash
/// (2 header bytes + 32 digest bytes), which is 46 characters long.
pub const MAX_DID_UNIQUE_SUFFIX_LENGTH: usize = 46;

/// Protocol-local identifier of a DID.
///
/// Derived from the hash of a Create operation's encoded payload. Two
/// suffixes are equal only if their strings are byte-for-byte identical;
/// no case folding or normalization is applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DidUniqueSuffix(String);

impl DidUniqueSuffix {
    /// Create a suffix, enforcing the non-empty and length bounds.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::EmptySuffix);
        }
        let len = value.encode_utf16().count();
        if len > MAX_DID_UNIQUE_SUFFIX_LENGTH {
            return Err(TypeError::SuffixTooLong {
                max: MAX_DID_UNIQUE_SUFFIX_LENGTH,
                actual: len,
            });
        }
        Ok(Self(value))
    }

    /// The suffix string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the suffix and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for DidUniqueSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DidUniqueSuffix({})", self.0)
    }
}

impl fmt::Display for DidUniqueSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DidUniqueSuffix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DidUniqueSuffix {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DidUniqueSuffix {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DidUniqueSuffix> for String {
    fn from(suffix: DidUniqueSuffix) -> Self {
        suffix.0
    }
}
