//! Integration test: credential issuance, publication, verification and
//! revocation across crates.

use serde_json::json;
use tessera_core::{RegistrarConfig, VerifierConfig};
use tessera_credentials::{
    ctype_hash, published_collection_urls, Credential, CredentialError, CredentialIssuer,
    CredentialVerifier, StaticFetcher, PUBLISHED_COLLECTION_SERVICE,
};
use tessera_identity::{DidResolver, LedgerDidResolver, ServiceEndpoint};
use tessera_integration_tests::{fresh_keys, RegisteredDid};

const COLLECTION_URL: &str = "https://attester.example.org/credentials.json";

fn collection_service() -> ServiceEndpoint {
    ServiceEndpoint::new(
        "#credentials",
        vec![PUBLISHED_COLLECTION_SERVICE.into()],
        vec![COLLECTION_URL.into()],
    )
    .unwrap()
}

fn issuer_for(attester: &RegisteredDid) -> CredentialIssuer {
    CredentialIssuer::new(
        attester.ledger.clone(),
        RegistrarConfig::default(),
        &attester.document,
        attester.submitter.clone(),
    )
    .unwrap()
}

async fn issue_email(attester: &RegisteredDid, holder: &RegisteredDid) -> Credential {
    let ctype = ctype_hash(&json!({"title": "Email", "type": "object"})).unwrap();
    issuer_for(attester)
        .issue(
            ctype,
            json!({"email": "holder@example.org"}),
            holder.document.identifier(),
            &attester.assertion_signer(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_issue_and_verify_between_two_dids() {
    let attester = RegisteredDid::new(vec![collection_service()]).await;
    let holder = RegisteredDid::on(attester.ledger.clone(), fresh_keys(), vec![]).await;

    let credential = issue_email(&attester, &holder).await;
    assert_eq!(credential.claim.owner, holder.document.identifier().uri());

    let verifier = CredentialVerifier::new(attester.ledger.clone(), VerifierConfig::default());
    let outcome = verifier.verify(&credential).await.unwrap();
    assert!(outcome.valid);
    assert_eq!(&outcome.attester, attester.document.identifier());

    // The same credential as JSON verifies the same way.
    let outcome = verifier
        .verify_value(credential.to_value().unwrap())
        .await
        .unwrap();
    assert!(outcome.valid);
}

#[tokio::test]
async fn test_revocation_is_distinct_from_invalid_proof() {
    let attester = RegisteredDid::new(vec![]).await;
    let holder = RegisteredDid::on(attester.ledger.clone(), fresh_keys(), vec![]).await;
    let credential = issue_email(&attester, &holder).await;
    let verifier = CredentialVerifier::new(attester.ledger.clone(), VerifierConfig::default());

    issuer_for(&attester)
        .revoke(&credential, &attester.assertion_signer())
        .await
        .unwrap();
    let revoked = verifier.verify(&credential).await.unwrap();
    assert!(!revoked.valid);

    // A proof from someone else's assertion key is an error, not a
    // revocation.
    let mut forged = credential.clone();
    let other = fresh_keys();
    let signature =
        tessera_crypto::sign(&forged.root_hash_bytes().unwrap(), &other.assertion_method);
    if let Some(proof) = forged.proof.as_mut() {
        proof.signature = signature.to_hex();
    }
    assert!(matches!(
        verifier.verify(&forged).await,
        Err(CredentialError::AttestationMismatch(_))
    ));
}

#[tokio::test]
async fn test_holder_cannot_claim_someone_elses_attestation() {
    let attester = RegisteredDid::new(vec![]).await;
    let impostor = RegisteredDid::on(attester.ledger.clone(), fresh_keys(), vec![]).await;
    let credential = issue_email(&attester, &impostor).await;

    // Re-signed by the impostor and attributed to them, but the ledger
    // record still names the real attester.
    let mut claimed = credential.clone();
    claimed.attester = impostor.document.identifier().uri().to_string();
    let signature = tessera_crypto::sign(
        &claimed.root_hash_bytes().unwrap(),
        &impostor.keys.assertion_method,
    );
    if let Some(proof) = claimed.proof.as_mut() {
        proof.verification_method = format!(
            "{}{}",
            impostor.document.identifier(),
            impostor.document.assertion_method()[0].id
        );
        proof.signature = signature.to_hex();
    }

    let verifier = CredentialVerifier::new(attester.ledger.clone(), VerifierConfig::default());
    assert!(matches!(
        verifier.verify(&claimed).await,
        Err(CredentialError::AttestationMismatch(_))
    ));
}

#[tokio::test]
async fn test_published_collection_found_through_resolution() {
    let attester = RegisteredDid::new(vec![collection_service()]).await;
    let holder = RegisteredDid::on(attester.ledger.clone(), fresh_keys(), vec![]).await;
    let credential = issue_email(&attester, &holder).await;

    // A verifier that only knows the attester's DID finds the collection
    // through its document.
    let resolver = LedgerDidResolver::new(attester.ledger.clone(), Default::default());
    let resolved = resolver
        .resolve(attester.document.identifier())
        .await
        .unwrap();
    let urls = published_collection_urls(&resolved.document);
    assert_eq!(urls, vec![COLLECTION_URL.to_string()]);

    let fetcher = StaticFetcher::new();
    fetcher.publish(
        COLLECTION_URL,
        json!([{ "credential": credential.to_value().unwrap() }]),
    );
    let verifier = CredentialVerifier::new(attester.ledger.clone(), VerifierConfig::default());
    let outcomes = verifier.verify_published(&fetcher, &urls[0]).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].valid);

    let empty = StaticFetcher::new();
    empty.publish(COLLECTION_URL, json!([]));
    assert!(matches!(
        verifier.verify_published(&empty, COLLECTION_URL).await,
        Err(CredentialError::CredentialUnavailable(_))
    ));
}

#[tokio::test]
async fn test_deactivated_attester_credentials_still_verify() {
    let attester = RegisteredDid::new(vec![]).await;
    let holder = RegisteredDid::on(attester.ledger.clone(), fresh_keys(), vec![]).await;
    let credential = issue_email(&attester, &holder).await;

    attester
        .registrar
        .deactivate(
            &attester.did(),
            &attester.submitter,
            &attester.authentication_signer(),
        )
        .await
        .unwrap();

    let verifier = CredentialVerifier::new(attester.ledger.clone(), VerifierConfig::default());
    let outcome = verifier.verify(&credential).await.unwrap();
    assert!(outcome.valid);
}
