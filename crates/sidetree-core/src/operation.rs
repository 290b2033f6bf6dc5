use serde_json::{json, Value};
use sidetree_crypto::{Encoder, MultihashValidator, PrivateKey, PublicKey, Signature, SignatureAlgorithm};
use sidetree_types::{DidUniqueSuffix, OperationKind, ProtocolParameters};
use tracing::debug;

use crate::error::OperationError;
use crate::json;
use crate::payload::{OperationPayload, DID_UNIQUE_SUFFIX};

const HEADER: &str = "header";
const PAYLOAD: &str = "payload";
const SIGNATURE: &str = "signature";
const HEADER_OPERATION: &str = "operation";
const HEADER_KID: &str = "kid";
const HEADER_ALG: &str = "alg";

/// Operation header: kind, signing key id, and signature algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationHeader {
    pub kind: OperationKind,
    pub kid: String,
    pub alg: SignatureAlgorithm,
}

/// How an operation's signing key is identified before resolution.
///
/// Only resolved [`PublicKey`]s are accepted by [`Operation::verify`];
/// turning a `Named` reference into key material is the caller's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyReference {
    /// A key id that must be looked up in the DID's current state.
    Named(String),
    /// Key material carried by the operation itself (create operations).
    Inline(PublicKey),
}

/// A single signed create, update, or delete request.
///
/// Immutable once constructed. `bytes` are the exact record bytes this
/// operation was parsed from (or serialized to), and are what the batch's
/// Merkle tree commits to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    header: OperationHeader,
    payload: String,
    signature: String,
    decoded: OperationPayload,
    did_unique_suffix: DidUniqueSuffix,
    bytes: Vec<u8>,
}

impl Operation {
    /// Sign an encoded payload. The signature covers the encoded string's
    /// bytes, not the structured payload, so coverage is unambiguous.
    pub fn sign(encoded_payload: &str, key: &PrivateKey) -> String {
        key.sign(encoded_payload.as_bytes()).encode()
    }

    /// Check this operation's signature against `key`.
    ///
    /// Returns `false` when the key's algorithm differs from `header.alg`,
    /// when the signature cannot be decoded, or when it does not verify.
    pub fn verify(&self, key: &PublicKey) -> bool {
        if key.algorithm() != self.header.alg {
            return false;
        }
        let Ok(signature) = Signature::decode(&self.signature) else {
            return false;
        };
        key.verify(self.payload.as_bytes(), &signature).is_ok()
    }

    /// Build and sign a create operation from a DID document template.
    pub fn create(document: &Value, kid: &str, key: &PrivateKey) -> Result<Self, OperationError> {
        if !document.is_object() {
            return Err(OperationError::PayloadNotWellFormed("document must be an object".into()));
        }
        Self::build(OperationKind::Create, document, kid, key)
    }

    /// Build and sign an update operation. `body` is the update description;
    /// its `didUniqueSuffix` field is set to `target`.
    pub fn update(target: &DidUniqueSuffix, body: &Value, kid: &str, key: &PrivateKey) -> Result<Self, OperationError> {
        let Value::Object(fields) = body else {
            return Err(OperationError::PayloadNotWellFormed("update body must be an object".into()));
        };
        let mut fields = fields.clone();
        fields.insert(DID_UNIQUE_SUFFIX.into(), Value::String(target.to_string()));
        Self::build(OperationKind::Update, &Value::Object(fields), kid, key)
    }

    /// Build and sign a delete operation.
    pub fn delete(target: &DidUniqueSuffix, kid: &str, key: &PrivateKey) -> Result<Self, OperationError> {
        Self::build(OperationKind::Delete, &json!({ DID_UNIQUE_SUFFIX: target.as_str() }), kid, key)
    }

    fn build(kind: OperationKind, payload: &Value, kid: &str, key: &PrivateKey) -> Result<Self, OperationError> {
        let encoded = Encoder::encode(payload.to_string());
        let signature = Self::sign(&encoded, key);
        let header = OperationHeader {
            kind,
            kid: kid.to_string(),
            alg: key.algorithm(),
        };
        let bytes = record_bytes(&header, &encoded, &signature);
        Self::assemble(header, encoded, signature, bytes)
    }

    fn assemble(header: OperationHeader, payload: String, signature: String, bytes: Vec<u8>) -> Result<Self, OperationError> {
        let decoded_bytes = Encoder::decode(&payload).map_err(|_| OperationError::PayloadNotEncoded)?;
        let decoded = OperationPayload::decode(header.kind, &decoded_bytes)?;
        let did_unique_suffix = match &decoded {
            OperationPayload::Create(_) => create_suffix(&payload)?,
            OperationPayload::Update(update) => update.did_unique_suffix().clone(),
            OperationPayload::Delete(delete) => delete.did_unique_suffix().clone(),
        };
        Ok(Self {
            header,
            payload,
            signature,
            decoded,
            did_unique_suffix,
            bytes,
        })
    }

    /// Parse and validate untrusted operation record bytes.
    ///
    /// This checks structure and encoding only. Signature verification needs
    /// a resolved key and is done separately with [`Self::verify`].
    pub fn parse(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, OperationError> {
        Self::parse_record(bytes, params).inspect_err(|e| debug!(code = e.code(), "operation rejected"))
    }

    fn parse_record(bytes: &[u8], params: &ProtocolParameters) -> Result<Self, OperationError> {
        if bytes.len() > params.max_operation_byte_size {
            return Err(OperationError::ExceedsMaxSize {
                size: bytes.len(),
                max: params.max_operation_byte_size,
            });
        }

        let object = json::parse_object(bytes, OperationError::NotWellFormed)?;
        json::reject_unknown(&object, &[HEADER, PAYLOAD, SIGNATURE], OperationError::UnknownProperty)?;

        let header = json::required_object(&object, HEADER, OperationError::HeaderMissing, OperationError::HeaderNotObject)?;
        json::reject_unknown(
            header,
            &[HEADER_OPERATION, HEADER_KID, HEADER_ALG],
            OperationError::HeaderUnknownProperty,
        )?;
        let kind = json::required_str(header, HEADER_OPERATION, OperationError::KindMissing, OperationError::KindNotString)?;
        let kind: OperationKind = kind
            .parse()
            .map_err(|_| OperationError::KindUnknown(kind.to_string()))?;
        let kid = json::required_str(header, HEADER_KID, OperationError::KidMissing, OperationError::KidNotString)?;
        let alg = json::required_str(header, HEADER_ALG, OperationError::AlgMissing, OperationError::AlgNotString)?;
        let alg: SignatureAlgorithm = alg
            .parse()
            .map_err(|_| OperationError::AlgUnsupported(alg.to_string()))?;

        let payload = json::required_str(&object, PAYLOAD, OperationError::PayloadMissing, OperationError::PayloadNotString)?;
        if Encoder::decode(payload).is_err() {
            return Err(OperationError::PayloadNotEncoded);
        }
        let signature = json::required_str(
            &object,
            SIGNATURE,
            OperationError::SignatureMissing,
            OperationError::SignatureNotString,
        )?;
        if Encoder::decode(signature).is_err() {
            return Err(OperationError::SignatureNotEncoded);
        }

        let header = OperationHeader {
            kind,
            kid: kid.to_string(),
            alg,
        };
        Self::assemble(header, payload.to_string(), signature.to_string(), bytes.to_vec())
    }

    pub fn header(&self) -> &OperationHeader {
        &self.header
    }

    pub fn kind(&self) -> OperationKind {
        self.header.kind
    }

    /// The transport-encoded payload string.
    pub fn encoded_payload(&self) -> &str {
        &self.payload
    }

    /// The transport-encoded signature string.
    pub fn encoded_signature(&self) -> &str {
        &self.signature
    }

    pub fn payload(&self) -> &OperationPayload {
        &self.decoded
    }

    /// The DID this operation acts on. For a create operation this is the
    /// hash of its encoded payload.
    pub fn did_unique_suffix(&self) -> &DidUniqueSuffix {
        &self.did_unique_suffix
    }

    /// How the signing key is identified: inline for a create operation
    /// whose template declares `kid`, by name otherwise.
    pub fn key_reference(&self) -> KeyReference {
        match &self.decoded {
            OperationPayload::Create(create) => match create.public_key(&self.header.kid) {
                Some(key) => KeyReference::Inline(key),
                None => KeyReference::Named(self.header.kid.clone()),
            },
            _ => KeyReference::Named(self.header.kid.clone()),
        }
    }

    /// The operation record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

fn create_suffix(encoded_payload: &str) -> Result<DidUniqueSuffix, OperationError> {
    DidUniqueSuffix::new(MultihashValidator::hash(encoded_payload.as_bytes()))
        .map_err(|e| OperationError::PayloadDidUniqueSuffixInvalid(e.to_string()))
}

fn record_bytes(header: &OperationHeader, payload: &str, signature: &str) -> Vec<u8> {
    json!({
        HEADER: {
            HEADER_ALG: header.alg.as_str(),
            HEADER_KID: header.kid,
            HEADER_OPERATION: header.kind.as_str(),
        },
        PAYLOAD: payload,
        SIGNATURE: signature,
    })
    .to_string()
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::OperationGenerator;

    fn params() -> ProtocolParameters {
        ProtocolParameters::default()
    }

    fn record(value: Value) -> Result<Operation, OperationError> {
        Operation::parse(value.to_string().as_bytes(), &params())
    }

    fn valid_record() -> Value {
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let op = OperationGenerator::generate_create_operation(OperationGenerator::did_document_template(), &pk, "#key1", &sk);
        serde_json::from_slice(op.as_bytes()).unwrap()
    }

    #[test]
    fn create_verifies_under_matching_key_only() {
        // Scenario D: a create operation signed with the template's key.
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let op = OperationGenerator::generate_create_operation(OperationGenerator::did_document_template(), &pk, "#key1", &sk);
        assert!(op.verify(&pk));

        let (_, unrelated) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        assert!(!op.verify(&unrelated));
    }

    #[test]
    fn verify_rejects_algorithm_mismatch() {
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::EdDsa);
        let op = OperationGenerator::generate_create_operation(OperationGenerator::did_document_template(), &pk, "#key1", &sk);
        assert!(op.verify(&pk));
        let (_, es256k) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        assert!(!op.verify(&es256k));
    }

    #[test]
    fn parse_roundtrips_constructed_operation() {
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let op = OperationGenerator::generate_create_operation(OperationGenerator::did_document_template(), &pk, "#key1", &sk);
        let parsed = Operation::parse(op.as_bytes(), &params()).unwrap();
        assert_eq!(parsed, op);
        assert!(parsed.verify(&pk));
        assert_eq!(parsed.key_reference(), KeyReference::Inline(pk));
    }

    #[test]
    fn create_suffix_is_hash_of_encoded_payload() {
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let op = OperationGenerator::generate_create_operation(OperationGenerator::did_document_template(), &pk, "#key1", &sk);
        assert_eq!(
            op.did_unique_suffix().as_str(),
            MultihashValidator::hash(op.encoded_payload().as_bytes())
        );
    }

    #[test]
    fn update_and_delete_target_suffix() {
        let (sk, _) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let target = DidUniqueSuffix::new("EiA-GtHEOH9IcEEoBQ9p1KCMIjTmTO8x2qXJPb20ry6C0A").unwrap();

        let update = OperationGenerator::generate_update_operation(&target, json!({"patches": []}), "#key1", &sk);
        assert_eq!(update.kind(), OperationKind::Update);
        assert_eq!(update.did_unique_suffix(), &target);
        assert_eq!(update.key_reference(), KeyReference::Named("#key1".into()));
        assert!(update.verify(&sk.public_key()));

        let delete = OperationGenerator::generate_delete_operation(&target, "#key1", &sk);
        assert_eq!(delete.kind(), OperationKind::Delete);
        assert_eq!(delete.did_unique_suffix(), &target);
        assert!(delete.verify(&sk.public_key()));
    }

    #[test]
    fn update_body_must_be_object() {
        let (sk, _) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let target = DidUniqueSuffix::new("EiAabc").unwrap();
        assert!(matches!(
            Operation::update(&target, &json!([1]), "#key1", &sk),
            Err(OperationError::PayloadNotWellFormed(_))
        ));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (sk, pk) = OperationGenerator::generate_key_pair(SignatureAlgorithm::Es256k);
        let target = DidUniqueSuffix::new("EiAabc").unwrap();
        let op = OperationGenerator::generate_delete_operation(&target, "#key1", &sk);
        let mut value: Value = serde_json::from_slice(op.as_bytes()).unwrap();
        value["payload"] = json!(Encoder::encode(r#"{"didUniqueSuffix":"EiAxyz"}"#));
        let tampered = record(value).unwrap();
        assert!(!tampered.verify(&pk));
    }

    #[test]
    fn exceeds_max_size() {
        let params = ProtocolParameters {
            max_operation_byte_size: 10,
            ..Default::default()
        };
        assert_eq!(
            Operation::parse(&[b' '; 11], &params),
            Err(OperationError::ExceedsMaxSize { size: 11, max: 10 })
        );
    }

    #[test]
    fn structural_errors_in_order() {
        assert!(matches!(
            Operation::parse(b"not json", &params()),
            Err(OperationError::NotWellFormed(_))
        ));

        let mut v = valid_record();
        v["extra"] = json!(1);
        assert_eq!(record(v), Err(OperationError::UnknownProperty("extra".into())));

        let mut v = valid_record();
        v.as_object_mut().unwrap().remove("header");
        assert_eq!(record(v), Err(OperationError::HeaderMissing));

        let mut v = valid_record();
        v["header"] = json!("create");
        assert_eq!(record(v), Err(OperationError::HeaderNotObject));

        let mut v = valid_record();
        v["header"]["nonce"] = json!(1);
        assert_eq!(record(v), Err(OperationError::HeaderUnknownProperty("nonce".into())));

        let mut v = valid_record();
        v["header"].as_object_mut().unwrap().remove("operation");
        assert_eq!(record(v), Err(OperationError::KindMissing));

        let mut v = valid_record();
        v["header"]["operation"] = json!(1);
        assert_eq!(record(v), Err(OperationError::KindNotString));

        let mut v = valid_record();
        v["header"]["operation"] = json!("recover");
        assert_eq!(record(v), Err(OperationError::KindUnknown("recover".into())));

        let mut v = valid_record();
        v["header"].as_object_mut().unwrap().remove("kid");
        assert_eq!(record(v), Err(OperationError::KidMissing));

        let mut v = valid_record();
        v["header"]["kid"] = json!(null);
        assert_eq!(record(v), Err(OperationError::KidNotString));

        let mut v = valid_record();
        v["header"].as_object_mut().unwrap().remove("alg");
        assert_eq!(record(v), Err(OperationError::AlgMissing));

        let mut v = valid_record();
        v["header"]["alg"] = json!(256);
        assert_eq!(record(v), Err(OperationError::AlgNotString));

        let mut v = valid_record();
        v["header"]["alg"] = json!("RS256");
        assert_eq!(record(v), Err(OperationError::AlgUnsupported("RS256".into())));

        let mut v = valid_record();
        v.as_object_mut().unwrap().remove("payload");
        assert_eq!(record(v), Err(OperationError::PayloadMissing));

        let mut v = valid_record();
        v["payload"] = json!({});
        assert_eq!(record(v), Err(OperationError::PayloadNotString));

        let mut v = valid_record();
        v["payload"] = json!("not+base64url=");
        assert_eq!(record(v), Err(OperationError::PayloadNotEncoded));

        let mut v = valid_record();
        v.as_object_mut().unwrap().remove("signature");
        assert_eq!(record(v), Err(OperationError::SignatureMissing));

        let mut v = valid_record();
        v["signature"] = json!(false);
        assert_eq!(record(v), Err(OperationError::SignatureNotString));

        let mut v = valid_record();
        v["signature"] = json!("a/b");
        assert_eq!(record(v), Err(OperationError::SignatureNotEncoded));

        let mut v = valid_record();
        v["payload"] = json!(Encoder::encode("plain text"));
        assert!(matches!(record(v), Err(OperationError::PayloadNotWellFormed(_))));
    }

    #[test]
    fn kind_must_match_payload_shape() {
        let mut v = valid_record();
        v["header"]["operation"] = json!("delete");
        assert_eq!(record(v), Err(OperationError::PayloadDidUniqueSuffixMissing));
    }
}
