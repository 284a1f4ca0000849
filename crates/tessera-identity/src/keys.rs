use tessera_core::KeyScheme;
use tessera_crypto::{EncryptionKeyPair, EncryptionPublicKey, KeyPair, KeySet, PublicKey};
use tessera_ledger::ChainKey;

/// Public half of a key about to be bound to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewKey {
    pub scheme: KeyScheme,
    pub public_key: [u8; 32],
}

impl NewKey {
    pub fn new(scheme: KeyScheme, public_key: [u8; 32]) -> Self {
        Self { scheme, public_key }
    }

    pub fn ed25519(public_key: &PublicKey) -> Self {
        Self::new(KeyScheme::Ed25519, *public_key.as_bytes())
    }

    pub fn x25519(public_key: &EncryptionPublicKey) -> Self {
        Self::new(KeyScheme::X25519, *public_key.as_bytes())
    }
}

impl From<&KeyPair> for NewKey {
    fn from(keypair: &KeyPair) -> Self {
        Self::ed25519(&keypair.public_key())
    }
}

impl From<&EncryptionKeyPair> for NewKey {
    fn from(keypair: &EncryptionKeyPair) -> Self {
        Self::x25519(&keypair.public_key())
    }
}

impl From<NewKey> for ChainKey {
    fn from(key: NewKey) -> Self {
        ChainKey::new(key.scheme, key.public_key)
    }
}

impl From<ChainKey> for NewKey {
    fn from(key: ChainKey) -> Self {
        NewKey::new(key.scheme, key.public_key)
    }
}

/// Keys for a DID about to be registered. Only authentication is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDidKeys {
    pub authentication: NewKey,
    pub key_agreement: Option<NewKey>,
    pub assertion_method: Option<NewKey>,
    pub capability_delegation: Option<NewKey>,
}

impl NewDidKeys {
    pub fn authentication_only(authentication: NewKey) -> Self {
        Self {
            authentication,
            key_agreement: None,
            assertion_method: None,
            capability_delegation: None,
        }
    }

    /// All four roles from a derived key set.
    pub fn from_key_set(keys: &KeySet) -> Self {
        Self {
            authentication: NewKey::from(&keys.authentication),
            key_agreement: Some(NewKey::from(&keys.key_agreement)),
            assertion_method: Some(NewKey::from(&keys.assertion_method)),
            capability_delegation: Some(NewKey::from(&keys.capability_delegation)),
        }
    }
}
