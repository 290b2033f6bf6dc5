use serde_json::Value;
use sidetree_crypto::{PublicKey, SignatureAlgorithm};
use sidetree_types::{DidUniqueSuffix, OperationKind};

use crate::error::OperationError;
use crate::json::{self, Object};

pub(crate) const DID_UNIQUE_SUFFIX: &str = "didUniqueSuffix";
pub(crate) const PUBLIC_KEY: &str = "publicKey";

/// Decoded, kind-specific operation payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationPayload {
    Create(CreatePayload),
    Update(UpdatePayload),
    Delete(DeletePayload),
}

impl OperationPayload {
    /// Decode the payload JSON for an operation of `kind`.
    pub(crate) fn decode(kind: OperationKind, bytes: &[u8]) -> Result<Self, OperationError> {
        let object = json::parse_object(bytes, OperationError::PayloadNotWellFormed)?;
        match kind {
            OperationKind::Create => CreatePayload::from_object(object).map(Self::Create),
            OperationKind::Update => UpdatePayload::from_object(object).map(Self::Update),
            OperationKind::Delete => {
                let did_unique_suffix = target_suffix(&object)?;
                Ok(Self::Delete(DeletePayload { did_unique_suffix }))
            }
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::Create,
            Self::Update(_) => OperationKind::Update,
            Self::Delete(_) => OperationKind::Delete,
        }
    }
}

/// A create payload: the DID document template.
///
/// Only the `publicKey` list is interpreted here; everything else in the
/// template is carried through untouched for the state layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePayload {
    document: Object,
}

impl CreatePayload {
    fn from_object(document: Object) -> Result<Self, OperationError> {
        match document.get(PUBLIC_KEY) {
            Some(Value::Array(keys)) if !keys.is_empty() => Ok(Self { document }),
            _ => Err(OperationError::CreatePayloadPublicKeysMissing),
        }
    }

    /// The full document template.
    pub fn document(&self) -> &Object {
        &self.document
    }

    /// Resolve the public key with id `kid` declared inline in the template.
    ///
    /// Entries look like `{"id": "#key1", "type": "Secp256k1VerificationKey2018",
    /// "publicKeyHex": "02..."}`. Returns `None` if no entry matches or the
    /// entry cannot be decoded.
    pub fn public_key(&self, kid: &str) -> Option<PublicKey> {
        let keys = self.document.get(PUBLIC_KEY)?.as_array()?;
        let entry = keys
            .iter()
            .filter_map(Value::as_object)
            .find(|k| k.get("id").and_then(Value::as_str) == Some(kid))?;
        let algorithm = SignatureAlgorithm::from_key_type(entry.get("type")?.as_str()?)?;
        let encoded = entry.get("publicKeyHex")?.as_str()?;
        PublicKey::from_hex(algorithm, encoded).ok()
    }
}

/// An update payload: the target DID plus an opaque update description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatePayload {
    did_unique_suffix: DidUniqueSuffix,
    body: Object,
}

impl UpdatePayload {
    fn from_object(body: Object) -> Result<Self, OperationError> {
        let did_unique_suffix = target_suffix(&body)?;
        Ok(Self {
            did_unique_suffix,
            body,
        })
    }

    pub fn did_unique_suffix(&self) -> &DidUniqueSuffix {
        &self.did_unique_suffix
    }

    /// The full payload object, including `didUniqueSuffix`.
    pub fn body(&self) -> &Object {
        &self.body
    }
}

/// A delete payload: just the target DID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletePayload {
    did_unique_suffix: DidUniqueSuffix,
}

impl DeletePayload {
    pub fn did_unique_suffix(&self) -> &DidUniqueSuffix {
        &self.did_unique_suffix
    }
}

fn target_suffix(object: &Object) -> Result<DidUniqueSuffix, OperationError> {
    let raw = json::required_str(
        object,
        DID_UNIQUE_SUFFIX,
        OperationError::PayloadDidUniqueSuffixMissing,
        OperationError::PayloadDidUniqueSuffixInvalid("not a string".into()),
    )?;
    DidUniqueSuffix::new(raw).map_err(|e| OperationError::PayloadDidUniqueSuffixInvalid(e.to_string()))
}
