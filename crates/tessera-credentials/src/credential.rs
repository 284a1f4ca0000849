use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tessera_core::Identifier;
use tessera_crypto::Signature;

use crate::error::CredentialError;

/// Proof type of an attester signature over a root hash.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

/// Hash identifying a claim type: BLAKE3 over the schema's JSON.
///
/// `serde_json` keeps object keys sorted, so equal schemas hash equally
/// regardless of how they were written.
pub fn ctype_hash(schema: &serde_json::Value) -> Result<[u8; 32], CredentialError> {
    let bytes =
        serde_json::to_vec(schema).map_err(|e| CredentialError::Serialization(e.to_string()))?;
    Ok(tessera_crypto::hash(&bytes))
}

/// The attested statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// `0x`-prefixed hex of the claim type hash.
    #[serde(rename = "cTypeHash")]
    pub ctype_hash: String,
    pub contents: serde_json::Value,
    /// DID of the subject.
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    /// DID URL of the attester's assertion key, `did:tessera:...#0x...`.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    /// `0x`-prefixed hex of the signature over the root hash.
    pub signature: String,
}

/// A verifiable credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub claim: Claim,
    #[serde(rename = "claimNonce")]
    pub claim_nonce: String,
    /// `0x`-prefixed hex of the root hash.
    #[serde(rename = "rootHash")]
    pub root_hash: String,
    pub attester: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

/// The decoded, structurally valid parts of a credential.
#[derive(Debug, Clone)]
pub(crate) struct CheckedCredential {
    pub attester: Identifier,
    pub ctype_hash: [u8; 32],
    pub root_hash: [u8; 32],
    pub verification_method: String,
    pub signature: Signature,
}

impl Claim {
    pub fn new(ctype_hash: [u8; 32], contents: serde_json::Value, owner: &Identifier) -> Self {
        Self {
            ctype_hash: to_hex(&ctype_hash),
            contents,
            owner: owner.uri().to_string(),
        }
    }

    /// Root hash of this claim under `nonce`.
    pub fn root_hash(&self, nonce: &str) -> Result<[u8; 32], CredentialError> {
        let commitment = serde_json::json!({
            "cTypeHash": self.ctype_hash,
            "contents": self.contents,
            "owner": self.owner,
            "nonce": nonce,
        });
        let bytes = serde_json::to_vec(&commitment)
            .map_err(|e| CredentialError::Serialization(e.to_string()))?;
        Ok(tessera_crypto::hash(&bytes))
    }
}

impl Credential {
    /// Wrap a claim with a fresh nonce and its root hash. The result
    /// still needs an attester proof.
    pub fn from_claim(claim: Claim, attester: &Identifier) -> Result<Self, CredentialError> {
        let mut nonce = [0u8; 16];
        OsRng.fill_bytes(&mut nonce);
        let claim_nonce = to_hex(&nonce);
        let root_hash = to_hex(&claim.root_hash(&claim_nonce)?);
        Ok(Self {
            claim,
            claim_nonce,
            root_hash,
            attester: attester.uri().to_string(),
            proof: None,
        })
    }

    /// Parse a credential from JSON.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CredentialError> {
        serde_json::from_value(value).map_err(|e| CredentialError::Malformed(e.to_string()))
    }

    pub fn to_value(&self) -> Result<serde_json::Value, CredentialError> {
        serde_json::to_value(self).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    /// Decoded root hash, if well formed.
    pub fn root_hash_bytes(&self) -> Result<[u8; 32], CredentialError> {
        parse_hash("rootHash", &self.root_hash)
    }

    /// Offline checks: required fields, identifiers, the root hash
    /// commitment and the proof encoding. Says nothing about attestation.
    pub fn check(&self) -> Result<(), CredentialError> {
        self.check_structure().map(|_| ())
    }

    /// Structural checks. No I/O.
    pub(crate) fn check_structure(&self) -> Result<CheckedCredential, CredentialError> {
        if self.claim_nonce.is_empty() {
            return Err(CredentialError::Malformed("claimNonce is empty".into()));
        }
        if !self.claim.contents.is_object() {
            return Err(CredentialError::Malformed(
                "claim contents must be a JSON object".into(),
            ));
        }
        let attester = Identifier::parse(&self.attester)
            .map_err(|e| CredentialError::Malformed(format!("attester: {}", e)))?;
        Identifier::parse(&self.claim.owner)
            .map_err(|e| CredentialError::Malformed(format!("owner: {}", e)))?;
        let ctype_hash = parse_hash("cTypeHash", &self.claim.ctype_hash)?;
        let root_hash = self.root_hash_bytes()?;
        if self.claim.root_hash(&self.claim_nonce)? != root_hash {
            return Err(CredentialError::Malformed(
                "rootHash does not match claim and nonce".into(),
            ));
        }

        let proof = self
            .proof
            .as_ref()
            .ok_or_else(|| CredentialError::Malformed("proof is missing".into()))?;
        if proof.proof_type != PROOF_TYPE {
            return Err(CredentialError::Malformed(format!(
                "unsupported proof type '{}'",
                proof.proof_type
            )));
        }
        if proof.verification_method.is_empty() {
            return Err(CredentialError::Malformed(
                "proof verificationMethod is empty".into(),
            ));
        }
        let signature = Signature::from_hex(&proof.signature)
            .map_err(|e| CredentialError::Malformed(format!("proof signature: {}", e)))?;

        Ok(CheckedCredential {
            attester,
            ctype_hash,
            root_hash,
            verification_method: proof.verification_method.clone(),
            signature,
        })
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_hash(field: &str, value: &str) -> Result<[u8; 32], CredentialError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| CredentialError::Malformed(format!("{} must be 0x-prefixed hex", field)))?;
    let bytes = hex::decode(digits)
        .map_err(|e| CredentialError::Malformed(format!("{}: {}", field, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        CredentialError::Malformed(format!("{} must be 32 bytes, got {}", field, b.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_core::FullIdentifier;
    use tessera_crypto::KeyPair;

    fn attester() -> Identifier {
        FullIdentifier::from_authentication_key(&[1u8; 32]).into()
    }

    fn owner() -> Identifier {
        FullIdentifier::from_authentication_key(&[2u8; 32]).into()
    }

    fn signed_credential() -> Credential {
        let ctype = ctype_hash(&json!({"title": "Email"})).unwrap();
        let claim = Claim::new(ctype, json!({"email": "a@example.org"}), &owner());
        let mut credential = Credential::from_claim(claim, &attester()).unwrap();
        let signature = tessera_crypto::sign(
            &credential.root_hash_bytes().unwrap(),
            &KeyPair::from_seed(&[3u8; 32]),
        );
        credential.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.into(),
            verification_method: format!("{}#0x00", attester()),
            signature: to_hex(&signature.to_bytes()),
        });
        credential
    }

    #[test]
    fn test_ctype_hash_ignores_key_order() {
        let a: serde_json::Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap();
        assert_eq!(ctype_hash(&a).unwrap(), ctype_hash(&b).unwrap());
    }

    #[test]
    fn test_root_hash_binds_nonce_and_contents() {
        let claim = Claim::new([0u8; 32], json!({"age": 30}), &owner());
        let other = Claim::new([0u8; 32], json!({"age": 31}), &owner());
        assert_ne!(claim.root_hash("n1").unwrap(), claim.root_hash("n2").unwrap());
        assert_ne!(claim.root_hash("n1").unwrap(), other.root_hash("n1").unwrap());
    }

    #[test]
    fn test_fresh_nonces_differ() {
        let claim = Claim::new([0u8; 32], json!({}), &owner());
        let a = Credential::from_claim(claim.clone(), &attester()).unwrap();
        let b = Credential::from_claim(claim, &attester()).unwrap();
        assert_ne!(a.claim_nonce, b.claim_nonce);
        assert_ne!(a.root_hash, b.root_hash);
    }

    #[test]
    fn test_well_formed_passes_structure() {
        let checked = signed_credential().check_structure().unwrap();
        assert_eq!(checked.attester, attester());
    }

    #[test]
    fn test_missing_proof_is_malformed() {
        let mut credential = signed_credential();
        credential.proof = None;
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_tampered_contents_is_malformed() {
        let mut credential = signed_credential();
        credential.claim.contents = json!({"email": "mallory@example.org"});
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_identifiers_are_malformed() {
        let mut credential = signed_credential();
        credential.attester = "did:web:example.org".into();
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));

        let mut credential = signed_credential();
        credential.claim.owner = "not a did".into();
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_root_hash_encoding() {
        let mut credential = signed_credential();
        credential.root_hash = "abcd".into();
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_undecodable_signature() {
        let mut credential = signed_credential();
        if let Some(proof) = credential.proof.as_mut() {
            proof.signature = "0x1234".into();
        }
        assert!(matches!(
            credential.check_structure(),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_field_in_json() {
        let mut value = signed_credential().to_value().unwrap();
        value.as_object_mut().unwrap().remove("claimNonce");
        assert!(matches!(
            Credential::from_value(value),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_json_field_names() {
        let value = signed_credential().to_value().unwrap();
        assert!(value["claim"]["cTypeHash"].is_string());
        assert!(value["rootHash"].as_str().unwrap().starts_with("0x"));
        assert_eq!(value["proof"]["type"], PROOF_TYPE);
        assert!(value["proof"]["verificationMethod"].is_string());
    }
}
