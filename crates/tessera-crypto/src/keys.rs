//! Role key material. Ed25519 for the signature roles, X25519 for key
//! agreement. Only public halves ever leave this module.

use std::fmt;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use tessera_core::{KeyScheme, PUBLIC_KEY_LENGTH};
use x25519_dalek::StaticSecret;
use zeroize::Zeroizing;

use crate::error::CryptoError;

fn key_bytes(what: &'static str, bytes: &[u8]) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::InvalidLength {
        what,
        expected: PUBLIC_KEY_LENGTH,
        actual: bytes.len(),
    })
}

/// Ed25519 key pair. `SigningKey` wipes itself on drop.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Key pair whose Ed25519 secret is exactly `secret`.
    pub fn from_seed(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = Zeroizing::new(key_bytes("Ed25519 secret", bytes)?);
        Ok(Self::from_seed(&secret))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    pub fn scheme(&self) -> KeyScheme {
        KeyScheme::Ed25519
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPair").field(&self.public_key()).finish()
    }
}

/// Ed25519 public key, rendered as base58.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Decode raw key bytes. Points that are not on the curve are refused.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw = key_bytes("Ed25519 public key", bytes)?;
        VerifyingKey::from_bytes(&raw)
            .map(Self)
            .map_err(|e| CryptoError::Encoding {
                what: "Ed25519 public key",
                reason: e.to_string(),
            })
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    pub fn to_bs58(&self) -> String {
        bs58::encode(self.as_bytes()).into_string()
    }

    pub fn from_bs58(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| CryptoError::Encoding {
                what: "base58 public key",
                reason: e.to_string(),
            })?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bs58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

/// X25519 key pair for the key agreement role.
#[derive(Clone)]
pub struct EncryptionKeyPair {
    secret: StaticSecret,
}

impl EncryptionKeyPair {
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    pub fn from_seed(secret: [u8; 32]) -> Self {
        Self {
            secret: StaticSecret::from(secret),
        }
    }

    pub fn public_key(&self) -> EncryptionPublicKey {
        EncryptionPublicKey(x25519_dalek::PublicKey::from(&self.secret))
    }

    pub fn scheme(&self) -> KeyScheme {
        KeyScheme::X25519
    }

    /// Diffie-Hellman with a peer's key agreement key.
    pub fn shared_secret(&self, peer: &EncryptionPublicKey) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.diffie_hellman(&peer.0).to_bytes())
    }
}

impl fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncryptionKeyPair")
            .field(&self.public_key())
            .finish()
    }
}

/// X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EncryptionPublicKey(x25519_dalek::PublicKey);

impl EncryptionPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw = key_bytes("X25519 public key", bytes)?;
        Ok(Self(x25519_dalek::PublicKey::from(raw)))
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    pub fn to_bs58(&self) -> String {
        bs58::encode(self.as_bytes()).into_string()
    }
}

impl fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionPublicKey({})", self.to_bs58())
    }
}
