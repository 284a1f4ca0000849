//! Ed25519 signatures over transaction payloads and credential root hashes.

use ed25519_dalek::{Signer as _, SIGNATURE_LENGTH};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                what: "signature",
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&raw)))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse hex, with or without the `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self, CryptoError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(digits).map_err(|e| CryptoError::Encoding {
            what: "signature hex",
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}

pub fn sign(message: &[u8], keypair: &KeyPair) -> Signature {
    Signature(keypair.signing_key().sign(message))
}

/// Strict verification: weak public keys and malleable signatures are
/// refused.
pub fn verify(
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<(), CryptoError> {
    public_key
        .verifying_key()
        .verify_strict(message, &signature.0)
        .map_err(|_| CryptoError::BadSignature)
}
