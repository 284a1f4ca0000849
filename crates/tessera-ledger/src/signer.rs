use async_trait::async_trait;
use tessera_core::{AccountAddress, KeyScheme};
use tessera_crypto::KeyPair;

/// What a signer hands back: the raw signature and its scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerOutput {
    pub signature: Vec<u8>,
    pub scheme: KeyScheme,
}

/// Failure reported by a signer (user refusal, locked wallet, ...).
#[derive(Debug, thiserror::Error)]
#[error("signer failed: {0}")]
pub struct SignerError(pub String);

/// External signing capability.
///
/// Keeps private key custody outside the registrar: a wallet, a hardware
/// device, or an in-process key pair can all stand behind this interface.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, payload: &[u8]) -> Result<SignerOutput, SignerError>;
}

/// Signer backed by an in-process Ed25519 key pair.
#[derive(Debug, Clone)]
pub struct KeyPairSigner {
    keypair: KeyPair,
}

impl KeyPairSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    /// Public key of the wrapped key pair.
    pub fn public_key(&self) -> tessera_crypto::PublicKey {
        self.keypair.public_key()
    }

    /// Ledger account controlled by the wrapped key pair.
    pub fn account(&self) -> AccountAddress {
        AccountAddress::from_public_key(self.keypair.public_key().as_bytes())
    }
}

#[async_trait]
impl Signer for KeyPairSigner {
    async fn sign(&self, payload: &[u8]) -> Result<SignerOutput, SignerError> {
        let signature = tessera_crypto::sign(payload, &self.keypair);
        Ok(SignerOutput {
            signature: signature.to_bytes().to_vec(),
            scheme: self.keypair.scheme(),
        })
    }
}
