//! Builders for valid, signed operations. Test support only.

use serde_json::{json, Value};
use sidetree_crypto::{PrivateKey, PublicKey, SignatureAlgorithm};
use sidetree_types::DidUniqueSuffix;

use crate::operation::Operation;
use crate::payload::PUBLIC_KEY;

/// Generates valid operations and key material for tests.
pub struct OperationGenerator;

impl OperationGenerator {
    pub fn generate_key_pair(algorithm: SignatureAlgorithm) -> (PrivateKey, PublicKey) {
        let private_key = PrivateKey::generate(algorithm);
        let public_key = private_key.public_key();
        (private_key, public_key)
    }

    /// A minimal DID document template with one placeholder public key.
    pub fn did_document_template() -> Value {
        json!({
            "@context": "https://w3id.org/did/v1",
            "publicKey": [{
                "id": "#placeholder",
                "type": "Secp256k1VerificationKey2018",
                "publicKeyHex": "",
            }],
            "service": [{
                "type": "IdentityHub",
                "serviceEndpoint": {
                    "@context": "schema.identity.foundation/hub",
                    "@type": "UserServiceEndpoint",
                    "instance": ["did:sidetree:value1", "did:sidetree:value2"],
                },
            }],
        })
    }

    /// Create operation whose first template key is replaced by `public_key`
    /// under id `kid`, signed with `signing_key`.
    pub fn generate_create_operation(
        mut template: Value,
        public_key: &PublicKey,
        kid: &str,
        signing_key: &PrivateKey,
    ) -> Operation {
        let entry = json!({
            "id": kid,
            "type": public_key.algorithm().key_type(),
            "publicKeyHex": public_key.to_hex(),
        });
        let has_keys = template
            .get(PUBLIC_KEY)
            .and_then(Value::as_array)
            .is_some_and(|keys| !keys.is_empty());
        if has_keys {
            template[PUBLIC_KEY][0] = entry;
        } else {
            template[PUBLIC_KEY] = json!([entry]);
        }
        Operation::create(&template, kid, signing_key).expect("generated create operation is valid")
    }

    pub fn generate_update_operation(
        target: &DidUniqueSuffix,
        body: Value,
        kid: &str,
        signing_key: &PrivateKey,
    ) -> Operation {
        Operation::update(target, &body, kid, signing_key).expect("generated update operation is valid")
    }

    pub fn generate_delete_operation(target: &DidUniqueSuffix, kid: &str, signing_key: &PrivateKey) -> Operation {
        Operation::delete(target, kid, signing_key).expect("generated delete operation is valid")
    }

    /// `count` create operations, each under a fresh Ed25519 key `#key1`.
    pub fn generate_create_batch(count: usize) -> Vec<Operation> {
        (0..count)
            .map(|_| {
                let (sk, pk) = Self::generate_key_pair(SignatureAlgorithm::EdDsa);
                Self::generate_create_operation(Self::did_document_template(), &pk, "#key1", &sk)
            })
            .collect()
    }
}
