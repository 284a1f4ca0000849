//! Integration test: key derivation, light documents, registration and
//! resolution across crates.

use std::sync::Arc;

use tessera_core::{
    AccountAddress, FullIdentifier, Identifier, KeyRole, KeyScheme, RegistrarConfig,
    ResolverConfig,
};
use tessera_crypto::derive_key_set;
use tessera_identity::{
    upgraded_identifier, DidResolver, IdentityError, LedgerDidResolver, LedgerRegistrar,
    LightDidResolver, LightDocumentBuilder, NewDidKeys, NewKey, ServiceEndpoint,
};
use tessera_integration_tests::{fresh_keys, submitter_of, test_seed, RegisteredDid};
use tessera_ledger::{KeyPairSigner, LedgerConnector, MemoryConnector, MemoryLedger};

fn svc() -> ServiceEndpoint {
    ServiceEndpoint::new("#svc", vec!["X".into()], vec!["http://e.org".into()]).unwrap()
}

// =========================================================================
// Derivation and light documents
// =========================================================================

#[test]
fn test_abandon_about_light_document() {
    let keys = derive_key_set(&test_seed()).unwrap();
    let doc = LightDocumentBuilder::build(
        Some(NewKey::from(&keys.authentication)),
        Some(NewKey::from(&keys.key_agreement)),
        vec![svc()],
    )
    .unwrap();

    assert_eq!(doc.authentication().len(), 1);
    assert_eq!(doc.key_agreement().len(), 1);
    assert_eq!(doc.service().len(), 1);
    assert_eq!(doc.service()[0].id, "#svc");
    assert!(doc.identifier().is_light());
}

#[test]
fn test_derivation_is_deterministic() {
    let a = derive_key_set(&test_seed()).unwrap();
    let b = derive_key_set(&test_seed()).unwrap();
    assert_eq!(a.authentication.public_key(), b.authentication.public_key());
    assert_eq!(a.assertion_method.public_key(), b.assertion_method.public_key());
    assert_eq!(
        a.capability_delegation.public_key(),
        b.capability_delegation.public_key()
    );
    assert_eq!(
        a.key_agreement.public_key().as_bytes(),
        b.key_agreement.public_key().as_bytes()
    );

    // Same seed, same light identifier.
    let build = |keys: &tessera_crypto::KeySet| {
        LightDocumentBuilder::build(
            Some(NewKey::from(&keys.authentication)),
            Some(NewKey::from(&keys.key_agreement)),
            vec![svc()],
        )
        .unwrap()
    };
    assert_eq!(build(&a).identifier(), build(&b).identifier());
}

#[test]
fn test_roles_are_isolated() {
    let keys = derive_key_set(&test_seed()).unwrap();
    let publics = [
        *keys.authentication.public_key().as_bytes(),
        *keys.assertion_method.public_key().as_bytes(),
        *keys.capability_delegation.public_key().as_bytes(),
        *keys.key_agreement.public_key().as_bytes(),
    ];
    for i in 0..publics.len() {
        for j in (i + 1)..publics.len() {
            assert_ne!(publics[i], publics[j], "roles {} and {} share a key", i, j);
        }
    }
    assert_eq!(keys.key_agreement.scheme(), KeyScheme::X25519);
    assert_eq!(keys.authentication.scheme(), KeyScheme::Ed25519);
}

#[tokio::test]
async fn test_light_resolution_is_offline_round_trip() {
    let keys = fresh_keys();
    let doc = LightDocumentBuilder::build(
        Some(NewKey::from(&keys.authentication)),
        Some(NewKey::from(&keys.key_agreement)),
        vec![svc()],
    )
    .unwrap();

    let resolved = LightDidResolver
        .resolve_uri(doc.identifier().uri())
        .await
        .unwrap();
    assert_eq!(resolved.document, doc);
    assert!(!resolved.metadata.deactivated);
    assert!(resolved.web3_name.is_none());
}

// =========================================================================
// Registration and full resolution
// =========================================================================

#[tokio::test]
async fn test_register_then_resolve_round_trip() {
    let registered = RegisteredDid::new(vec![svc()]).await;
    let resolver = LedgerDidResolver::new(registered.ledger.clone(), ResolverConfig::default());

    let resolved = resolver
        .resolve(registered.document.identifier())
        .await
        .unwrap();
    assert_eq!(resolved.document, registered.document);
    assert!(!resolved.metadata.deactivated);

    let did = registered.did();
    assert_eq!(
        did.authentication_key(),
        registered.keys.authentication.public_key().as_bytes()
    );
    for role in KeyRole::ALL {
        assert_eq!(resolved.document.keys(role).len(), 1, "role {}", role);
    }
}

#[tokio::test]
async fn test_never_registered_is_not_found() {
    let ledger = Arc::new(MemoryLedger::new());
    let resolver = LedgerDidResolver::new(ledger, ResolverConfig::default());
    let did: Identifier = FullIdentifier::from_authentication_key(&[9u8; 32]).into();

    let result = resolver.resolve(&did).await;
    assert!(matches!(result, Err(IdentityError::NotFound(_))));
}

#[tokio::test]
async fn test_zero_balance_stops_before_submission() {
    let ledger = Arc::new(MemoryLedger::new());
    let registrar = LedgerRegistrar::new(ledger.clone(), RegistrarConfig::default());
    let keys = fresh_keys();
    let broke = AccountAddress::from_public_key(&[1u8; 32]);

    let result = registrar
        .register(
            &broke,
            &NewDidKeys::from_key_set(&keys),
            vec![],
            &KeyPairSigner::new(keys.authentication.clone()),
        )
        .await;
    assert!(matches!(
        result,
        Err(IdentityError::InsufficientResources { available: 0, .. })
    ));
    assert_eq!(ledger.block_number(), 0);
}

#[tokio::test]
async fn test_upgrade_light_to_full() {
    let ledger = Arc::new(MemoryLedger::new());
    let registrar = LedgerRegistrar::new(ledger.clone(), RegistrarConfig::default());
    let keys = fresh_keys();
    let submitter = submitter_of(&keys);
    ledger.fund(&submitter, 10 * ledger.deposit());

    let light = LightDocumentBuilder::build(
        Some(NewKey::from(&keys.authentication)),
        Some(NewKey::from(&keys.key_agreement)),
        vec![svc()],
    )
    .unwrap();
    let full = registrar
        .upgrade(
            &light,
            &submitter,
            &KeyPairSigner::new(keys.authentication.clone()),
        )
        .await
        .unwrap();

    let expected = upgraded_identifier(&light).unwrap();
    assert_eq!(full.identifier(), &Identifier::from(expected));
    assert_ne!(full.identifier(), light.identifier());

    let resolver = LedgerDidResolver::new(ledger, ResolverConfig::default());
    let resolved = resolver.resolve(full.identifier()).await.unwrap();
    assert_eq!(resolved.document.service(), light.service());
    assert_eq!(resolved.document.key_agreement(), light.key_agreement());
}

#[tokio::test]
async fn test_names_and_deactivation() {
    let registered = RegisteredDid::new(vec![]).await;
    let did = registered.did();
    let signer = registered.authentication_signer();
    registered
        .registrar
        .claim_name(&did, "carol", &registered.submitter, &signer)
        .await
        .unwrap();

    let resolver = LedgerDidResolver::new(registered.ledger.clone(), ResolverConfig::default());
    let by_name = resolver.resolve_name("carol").await.unwrap();
    assert_eq!(by_name.document.identifier(), registered.document.identifier());
    assert_eq!(by_name.web3_name.as_deref(), Some("carol"));

    assert!(matches!(
        resolver.resolve_name("dave").await,
        Err(IdentityError::NameNotFound(_))
    ));

    registered
        .registrar
        .deactivate(&did, &registered.submitter, &signer)
        .await
        .unwrap();
    let resolved = resolver
        .resolve(registered.document.identifier())
        .await
        .unwrap();
    assert!(resolved.metadata.deactivated);

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["metadata"]["deactivated"], true);
    assert_eq!(json["document"]["identifier"], did.uri());
}

#[tokio::test]
async fn test_handles_to_separate_ledgers_are_independent() {
    let connector = MemoryConnector::new();
    let first = connector.connect("memory://first").await.unwrap();
    let second = connector.connect("memory://second").await.unwrap();

    let keys = fresh_keys();
    let submitter = submitter_of(&keys);
    let ledger = connector.ledger("memory://first").unwrap();
    ledger.fund(&submitter, 10 * ledger.deposit());

    let registrar = LedgerRegistrar::new(first.clone(), RegistrarConfig::default());
    let doc = registrar
        .register(
            &submitter,
            &NewDidKeys::from_key_set(&keys),
            vec![],
            &KeyPairSigner::new(keys.authentication.clone()),
        )
        .await
        .unwrap();

    let on_first = LedgerDidResolver::new(first.clone(), ResolverConfig::default());
    let on_second = LedgerDidResolver::new(second.clone(), ResolverConfig::default());
    assert!(on_first.resolve(doc.identifier()).await.is_ok());
    assert!(matches!(
        on_second.resolve(doc.identifier()).await,
        Err(IdentityError::NotFound(_))
    ));

    assert!(connector.connect("https://ledger.example.org").await.is_err());
    drop((registrar, on_first, on_second));
    connector.disconnect(first).await.unwrap();
    connector.disconnect(second).await.unwrap();
}
