//! Role key derivation.
//!
//! All four document roles come from one seed phrase, each through its own
//! path. The signature roles are derived with HKDF-SHA256 using a
//! role-specific info string. The key agreement role first reduces the
//! seed to a 32-byte mini-secret and then runs it through a BLAKE3
//! key-derivation context, yielding an X25519 secret. Knowing one role's
//! secret reveals nothing about the others.

use hkdf::Hkdf;
use sha2::Sha256;
use tessera_core::KeyRole;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{EncryptionKeyPair, KeyPair};
use crate::seed::SeedPhrase;

/// BLAKE3 context for the key agreement secret.
const KEY_AGREEMENT_CONTEXT: &str = "tessera 2024-01-01 key agreement x25519";

/// Derivation path for a signature role.
fn signature_path(role: KeyRole) -> Option<&'static str> {
    match role {
        KeyRole::Authentication => Some("tessera//authentication"),
        KeyRole::AssertionMethod => Some("tessera//assertion"),
        KeyRole::CapabilityDelegation => Some("tessera//delegation"),
        KeyRole::KeyAgreement => None,
    }
}

/// Derive the Ed25519 key pair for a signature role.
pub fn derive_signing_key(seed: &SeedPhrase, role: KeyRole) -> Result<KeyPair, CryptoError> {
    let path = signature_path(role).ok_or_else(|| CryptoError::Derivation {
        role: role.to_string(),
        reason: "not a signature role".into(),
    })?;
    let seed_bytes = seed.seed_bytes();
    let hk = Hkdf::<Sha256>::new(None, &seed_bytes[..]);
    let mut output = Zeroizing::new([0u8; 32]);
    hk.expand(path.as_bytes(), &mut output[..])
        .map_err(|e| CryptoError::Derivation {
            role: role.to_string(),
            reason: format!("HKDF expand failed: {e}"),
        })?;
    Ok(KeyPair::from_seed(&output))
}

/// Derive the X25519 key pair for the key agreement role.
pub fn derive_encryption_key(seed: &SeedPhrase) -> EncryptionKeyPair {
    let seed_bytes = seed.seed_bytes();
    // The first half of the BIP-39 seed is the mini-secret.
    let secret = blake3::derive_key(KEY_AGREEMENT_CONTEXT, &seed_bytes[..32]);
    EncryptionKeyPair::from_seed(secret)
}

/// The four role keys of one identity.
#[derive(Debug, Clone)]
pub struct KeySet {
    pub authentication: KeyPair,
    pub key_agreement: EncryptionKeyPair,
    pub assertion_method: KeyPair,
    pub capability_delegation: KeyPair,
}

/// Derive every role key from a seed phrase. Deterministic.
pub fn derive_key_set(seed: &SeedPhrase) -> Result<KeySet, CryptoError> {
    let key_set = KeySet {
        authentication: derive_signing_key(seed, KeyRole::Authentication)?,
        key_agreement: derive_encryption_key(seed),
        assertion_method: derive_signing_key(seed, KeyRole::AssertionMethod)?,
        capability_delegation: derive_signing_key(seed, KeyRole::CapabilityDelegation)?,
    };
    tracing::debug!(
        authentication = %key_set.authentication.public_key().to_bs58(),
        "derived role key set"
    );
    Ok(key_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_seed() -> SeedPhrase {
        SeedPhrase::parse(TEST_PHRASE).unwrap()
    }

    #[test]
    fn test_derivation_deterministic() {
        let a = derive_key_set(&test_seed()).unwrap();
        let b = derive_key_set(&test_seed()).unwrap();
        assert_eq!(a.authentication.public_key(), b.authentication.public_key());
        assert_eq!(a.key_agreement.public_key(), b.key_agreement.public_key());
        assert_eq!(a.assertion_method.public_key(), b.assertion_method.public_key());
        assert_eq!(
            a.capability_delegation.public_key(),
            b.capability_delegation.public_key()
        );
    }

    #[test]
    fn test_roles_pairwise_distinct() {
        let keys = derive_key_set(&test_seed()).unwrap();
        let all = [
            *keys.authentication.public_key().as_bytes(),
            *keys.key_agreement.public_key().as_bytes(),
            *keys.assertion_method.public_key().as_bytes(),
            *keys.capability_delegation.public_key().as_bytes(),
        ];
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert_ne!(all[i], all[j], "roles {} and {} collide", i, j);
            }
        }
    }

    #[test]
    fn test_different_seeds_different_keys() {
        let other = SeedPhrase::generate(12).unwrap();
        let a = derive_key_set(&test_seed()).unwrap();
        let b = derive_key_set(&other).unwrap();
        assert_ne!(a.authentication.public_key(), b.authentication.public_key());
        assert_ne!(a.key_agreement.public_key(), b.key_agreement.public_key());
    }

    #[test]
    fn test_key_agreement_is_not_a_signature_role() {
        let result = derive_signing_key(&test_seed(), KeyRole::KeyAgreement);
        assert!(matches!(result, Err(CryptoError::Derivation { .. })));
    }

    #[test]
    fn test_invalid_seed_surfaces_before_derivation() {
        let result = SeedPhrase::parse("not a valid mnemonic at all");
        assert!(matches!(result, Err(CryptoError::InvalidSeed(_))));
    }
}
