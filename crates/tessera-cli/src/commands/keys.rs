//! `tessera keys` — Derive the key set of a seed phrase.

use clap::Args;
use tessera_core::FullIdentifier;
use tessera_crypto::{derive_key_set, SeedPhrase};
use tessera_identity::{Document, DocumentKeys, NewDidKeys};

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// The seed phrase, quoted.
    pub phrase: String,
}

pub fn run(args: &KeysArgs) -> anyhow::Result<()> {
    let seed = SeedPhrase::parse(args.phrase.trim())?;
    let keys = NewDidKeys::from_key_set(&derive_key_set(&seed)?);
    let did = FullIdentifier::from_authentication_key(&keys.authentication.public_key);

    // The document this key set registers as, before any ledger is involved.
    let document = Document::new(
        did.into(),
        DocumentKeys {
            authentication: vec![keys.authentication],
            key_agreement: keys.key_agreement.into_iter().collect(),
            assertion_method: keys.assertion_method.into_iter().collect(),
            capability_delegation: keys.capability_delegation.into_iter().collect(),
        },
        vec![],
    )?;

    println!("{}", serde_json::to_string_pretty(&document.to_json()?)?);
    Ok(())
}
