use serde::Serialize;
use tessera_core::{FullIdentifier, Identifier, KeyRole, KeyScheme, ResolverConfig, VerifierConfig};
use tessera_crypto::PublicKey;
use tessera_identity::{Document, IdentityError, LedgerDidResolver};
use tessera_ledger::{AttestationRecord, LedgerHandle};

use crate::credential::{CheckedCredential, Credential};
use crate::error::CredentialError;
use crate::fetcher::{fetch_collection, EndpointFetcher};

/// Service type advertising a published credential collection.
pub const PUBLISHED_COLLECTION_SERVICE: &str = "PublishedCredentialCollectionV1";

/// Result of a verification that got past structure and attestation
/// checks. `valid` is false when the attestation has been revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub attester: Identifier,
    pub valid: bool,
}

/// URLs of the published credential collections a document advertises.
pub fn published_collection_urls(document: &Document) -> Vec<String> {
    document
        .services_of_type(PUBLISHED_COLLECTION_SERVICE)
        .flat_map(|s| s.urls.iter().cloned())
        .collect()
}

/// Verifies credentials against attester documents and ledger
/// attestation records.
pub struct CredentialVerifier {
    ledger: LedgerHandle,
    resolver: LedgerDidResolver,
    config: VerifierConfig,
}

impl CredentialVerifier {
    pub fn new(ledger: LedgerHandle, config: VerifierConfig) -> Self {
        let resolver = LedgerDidResolver::new(
            ledger.clone(),
            ResolverConfig {
                query_timeout_ms: config.query_timeout_ms,
            },
        );
        Self {
            ledger,
            resolver,
            config,
        }
    }

    /// Verify a credential.
    ///
    /// Structure is checked before any ledger query. Revocation status is
    /// read from the ledger every time.
    pub async fn verify(
        &self,
        credential: &Credential,
    ) -> Result<VerificationOutcome, CredentialError> {
        let checked = credential.check_structure()?;
        let attester = match &checked.attester {
            Identifier::Full(full) => full.clone(),
            Identifier::Light(light) => {
                return Err(CredentialError::AttestationMismatch(format!(
                    "attester {} is a light DID",
                    light
                )))
            }
        };

        self.verify_proof(&attester, &checked).await?;
        let record = self.attestation(&checked.root_hash).await?;
        if record.attester != attester.uri() {
            return Err(CredentialError::AttestationMismatch(format!(
                "root hash is attested by {}, not {}",
                record.attester, attester
            )));
        }
        if record.ctype_hash != checked.ctype_hash {
            return Err(CredentialError::AttestationMismatch(
                "attested cType differs from the claim's".into(),
            ));
        }

        let valid = !record.revoked;
        tracing::info!(
            attester = %attester,
            root_hash = %credential.root_hash,
            valid,
            "credential verified"
        );
        Ok(VerificationOutcome {
            attester: checked.attester,
            valid,
        })
    }

    /// Parse and verify a credential given as JSON.
    pub async fn verify_value(
        &self,
        value: serde_json::Value,
    ) -> Result<VerificationOutcome, CredentialError> {
        let credential = Credential::from_value(value)?;
        self.verify(&credential).await
    }

    /// Fetch a published credential collection from `uri` and verify each
    /// entry in order. Stops at the first failing entry.
    ///
    /// The collection is a JSON array of `{"credential": ...}` objects.
    pub async fn verify_published(
        &self,
        fetcher: &dyn EndpointFetcher,
        uri: &str,
    ) -> Result<Vec<VerificationOutcome>, CredentialError> {
        let credentials = fetch_collection(fetcher, uri).await?;
        tracing::debug!(uri = %uri, count = credentials.len(), "verifying published collection");

        let mut outcomes = Vec::with_capacity(credentials.len());
        for credential in &credentials {
            outcomes.push(self.verify(credential).await?);
        }
        Ok(outcomes)
    }

    async fn verify_proof(
        &self,
        attester: &FullIdentifier,
        checked: &CheckedCredential,
    ) -> Result<(), CredentialError> {
        let resolved = self
            .resolver
            .resolve_full(attester)
            .await
            .map_err(|e| match e {
                IdentityError::NotFound(did) => {
                    CredentialError::AttestationMismatch(format!("attester {} not found", did))
                }
                IdentityError::Timeout(what) => CredentialError::Timeout(what),
                other => other.into(),
            })?;

        let key = resolved
            .document
            .find_key(KeyRole::AssertionMethod, &checked.verification_method)
            .ok_or_else(|| {
                CredentialError::AttestationMismatch(format!(
                    "{} is not an assertion key of {}",
                    checked.verification_method, attester
                ))
            })?;
        if key.scheme != KeyScheme::Ed25519 {
            return Err(CredentialError::AttestationMismatch(format!(
                "assertion key uses {}",
                key.scheme
            )));
        }
        let public_key = PublicKey::from_bytes(&key.public_key)
            .map_err(|e| CredentialError::AttestationMismatch(e.to_string()))?;
        tessera_crypto::verify(&checked.root_hash, &checked.signature, &public_key).map_err(
            |_| CredentialError::AttestationMismatch("signature over root hash is invalid".into()),
        )
    }

    async fn attestation(&self, root_hash: &[u8; 32]) -> Result<AttestationRecord, CredentialError> {
        let limit = self.config.query_timeout();
        let record = match tokio::time::timeout(limit, self.ledger.query_attestation(root_hash)).await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = limit.as_millis() as u64,
                    "attestation query timed out"
                );
                return Err(CredentialError::Timeout(format!(
                    "querying attestation 0x{}",
                    hex::encode(root_hash)
                )));
            }
        };
        record.ok_or_else(|| {
            CredentialError::AttestationMismatch(format!(
                "no attestation for root hash 0x{}",
                hex::encode(root_hash)
            ))
        })
    }
}
