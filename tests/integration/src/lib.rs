//! Fixtures shared by the cross-crate scenario tests.

use std::sync::Arc;

use tessera_core::{AccountAddress, FullIdentifier, Identifier, RegistrarConfig};
use tessera_crypto::{derive_key_set, KeySet, SeedPhrase};
use tessera_identity::{Document, LedgerRegistrar, NewDidKeys, ServiceEndpoint};
use tessera_ledger::{KeyPairSigner, MemoryLedger};

/// The 12-word BIP-39 test vector.
pub const TEST_PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn test_seed() -> SeedPhrase {
    SeedPhrase::parse(TEST_PHRASE).expect("test vector parses")
}

pub fn fresh_keys() -> KeySet {
    derive_key_set(&SeedPhrase::generate(12).expect("generate")).expect("derive")
}

/// Ledger account paying for the DID whose authentication key is in `keys`.
pub fn submitter_of(keys: &KeySet) -> AccountAddress {
    AccountAddress::from_public_key(keys.authentication.public_key().as_bytes())
}

/// A full DID registered on an in-memory ledger, with the signers for its
/// roles.
pub struct RegisteredDid {
    pub ledger: Arc<MemoryLedger>,
    pub registrar: LedgerRegistrar,
    pub keys: KeySet,
    pub submitter: AccountAddress,
    pub document: Document,
}

impl RegisteredDid {
    pub async fn new(services: Vec<ServiceEndpoint>) -> Self {
        Self::on(Arc::new(MemoryLedger::new()), fresh_keys(), services).await
    }

    pub async fn on(ledger: Arc<MemoryLedger>, keys: KeySet, services: Vec<ServiceEndpoint>) -> Self {
        let submitter = submitter_of(&keys);
        ledger.fund(&submitter, 100 * ledger.deposit());
        let registrar = LedgerRegistrar::new(ledger.clone(), RegistrarConfig::default());
        let document = registrar
            .register(
                &submitter,
                &NewDidKeys::from_key_set(&keys),
                services,
                &KeyPairSigner::new(keys.authentication.clone()),
            )
            .await
            .expect("registration succeeds");
        Self {
            ledger,
            registrar,
            keys,
            submitter,
            document,
        }
    }

    pub fn did(&self) -> FullIdentifier {
        match self.document.identifier() {
            Identifier::Full(full) => full.clone(),
            Identifier::Light(light) => panic!("registered a light DID: {}", light),
        }
    }

    pub fn authentication_signer(&self) -> KeyPairSigner {
        KeyPairSigner::new(self.keys.authentication.clone())
    }

    pub fn assertion_signer(&self) -> KeyPairSigner {
        KeyPairSigner::new(self.keys.assertion_method.clone())
    }
}
