//! `tessera demo` — End-to-end walkthrough against an in-memory ledger.

use clap::Args;
use serde_json::json;
use tessera_core::{AccountAddress, FullIdentifier, Identifier};
use tessera_credentials::{
    ctype_hash, published_collection_urls, CredentialIssuer, CredentialVerifier, StaticFetcher,
    PUBLISHED_COLLECTION_SERVICE,
};
use tessera_crypto::{derive_key_set, SeedPhrase};
use tessera_identity::{
    upgraded_identifier, DidResolver, LedgerDidResolver, LedgerRegistrar, LightDocumentBuilder,
    NewDidKeys, NewKey, ServiceEndpoint,
};
use tessera_ledger::{KeyPairSigner, LedgerConnector, MemoryConnector};

use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Seed phrase of the attester. A fresh one is generated if omitted.
    #[arg(long)]
    pub phrase: Option<String>,

    /// Name to bind to the attester's DID.
    #[arg(long, default_value = "demo-attester")]
    pub name: String,

    /// Where the attester publishes its credentials.
    #[arg(long, default_value = "https://example.org/tessera/credentials.json")]
    pub collection_url: String,
}

pub async fn run(args: &DemoArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let endpoint = &config.ledger.endpoint;
    let connector = MemoryConnector::new();
    let ledger = connector.connect(endpoint).await?;
    let memory = connector
        .ledger(endpoint)
        .ok_or_else(|| anyhow::anyhow!("no in-memory ledger behind {}", endpoint))?;

    let seed = match &args.phrase {
        Some(phrase) => SeedPhrase::parse(phrase.trim())?,
        None => SeedPhrase::generate(12)?,
    };
    let keys = derive_key_set(&seed)?;
    let submitter = AccountAddress::from_public_key(keys.authentication.public_key().as_bytes());
    memory.fund(&submitter, 100 * memory.deposit());
    println!("[1] Derived key set, funded submitter {}", submitter);

    let light = LightDocumentBuilder::build(
        Some(NewKey::from(&keys.authentication)),
        Some(NewKey::from(&keys.key_agreement)),
        vec![],
    )?;
    println!("[2] Light DID: {}", light.identifier());

    let registrar = LedgerRegistrar::new(ledger.clone(), config.registrar.clone());
    let service = ServiceEndpoint::new(
        "#credentials",
        vec![PUBLISHED_COLLECTION_SERVICE.to_string()],
        vec![args.collection_url.clone()],
    )?;
    let auth_signer = KeyPairSigner::new(keys.authentication.clone());
    let document = registrar
        .register(
            &submitter,
            &NewDidKeys::from_key_set(&keys),
            vec![service],
            &auth_signer,
        )
        .await?;
    let did = match document.identifier() {
        Identifier::Full(full) => full.clone(),
        Identifier::Light(_) => anyhow::bail!("registration returned a light document"),
    };
    println!("[3] Registered full DID: {}", did);
    if upgraded_identifier(&light).as_ref() == Some(&did) {
        println!("    (same authentication key as the light DID above)");
    }

    registrar
        .claim_name(&did, &args.name, &submitter, &auth_signer)
        .await?;
    let resolver = LedgerDidResolver::new(ledger.clone(), config.resolver.clone());
    let by_name = resolver.resolve_name(&args.name).await?;
    println!(
        "[4] Name '{}' resolves to {}",
        args.name,
        by_name.document.identifier()
    );

    let assertion_signer = KeyPairSigner::new(keys.assertion_method.clone());
    let issuer = CredentialIssuer::new(
        ledger.clone(),
        config.registrar.clone(),
        &document,
        submitter.clone(),
    )?;
    let ctype = ctype_hash(&json!({
        "title": "Email",
        "properties": {"email": {"type": "string"}},
        "type": "object",
    }))?;
    let credential = issuer
        .issue(
            ctype,
            json!({"email": "holder@example.org"}),
            light.identifier(),
            &assertion_signer,
        )
        .await?;
    println!("[5] Issued credential with root hash {}", credential.root_hash);

    // The attester publishes at the URL in its document.
    let fetcher = StaticFetcher::new();
    fetcher.publish(
        &args.collection_url,
        json!([{ "credential": credential.to_value()? }]),
    );

    // A verifier who only knows the name: resolve, find the collection,
    // fetch and verify.
    let verifier = CredentialVerifier::new(ledger.clone(), config.verifier.clone());
    let found = resolver.resolve_name(&args.name).await?;
    for url in published_collection_urls(&found.document) {
        let outcomes = verifier.verify_published(&fetcher, &url).await?;
        for outcome in outcomes {
            println!(
                "[6] Published at {}: attester {}, valid = {}",
                url, outcome.attester, outcome.valid
            );
        }
    }

    issuer.revoke(&credential, &assertion_signer).await?;
    let outcome = verifier.verify(&credential).await?;
    println!("[7] After revocation: valid = {}", outcome.valid);

    let deactivated = registrar.deactivate(&did, &submitter, &auth_signer).await?;
    println!(
        "[8] Deactivated {}: metadata.deactivated = {}",
        did, deactivated.metadata.deactivated
    );
    print_resolution(&resolver, &did).await?;

    drop((registrar, resolver, issuer, verifier));
    connector.disconnect(ledger).await?;
    Ok(())
}

async fn print_resolution(resolver: &LedgerDidResolver, did: &FullIdentifier) -> anyhow::Result<()> {
    let resolved = resolver.resolve(&did.clone().into()).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
