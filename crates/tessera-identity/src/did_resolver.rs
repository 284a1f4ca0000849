use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tessera_core::{FullIdentifier, Identifier, ResolverConfig};
use tessera_ledger::{codec, LedgerError, LedgerHandle, NameRecord};

use crate::chain;
use crate::document::ResolvedDocument;
use crate::error::IdentityError;
use crate::light::LightDocumentBuilder;

/// Trait for resolving identifiers to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve an identifier to its document and metadata.
    async fn resolve(&self, identifier: &Identifier) -> Result<ResolvedDocument, IdentityError>;

    /// Resolve a bound human-readable name.
    async fn resolve_name(&self, name: &str) -> Result<ResolvedDocument, IdentityError>;

    /// Parse and resolve a DID URI.
    async fn resolve_uri(&self, uri: &str) -> Result<ResolvedDocument, IdentityError> {
        let identifier =
            Identifier::parse(uri).map_err(|e| IdentityError::InvalidDid(e.to_string()))?;
        self.resolve(&identifier).await
    }
}

/// Resolves light identifiers offline. Full identifiers and names need a
/// ledger and are reported as not found.
pub struct LightDidResolver;

#[async_trait]
impl DidResolver for LightDidResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<ResolvedDocument, IdentityError> {
        match identifier {
            Identifier::Light(light) => {
                let document = LightDocumentBuilder::from_identifier(light)?;
                Ok(ResolvedDocument::active(document))
            }
            Identifier::Full(full) => Err(IdentityError::NotFound(full.uri().to_string())),
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<ResolvedDocument, IdentityError> {
        Err(IdentityError::NameNotFound(name.to_string()))
    }
}

/// Resolves light identifiers locally and full identifiers and names
/// against a ledger.
pub struct LedgerDidResolver {
    ledger: LedgerHandle,
    config: ResolverConfig,
}

impl LedgerDidResolver {
    pub fn new(ledger: LedgerHandle, config: ResolverConfig) -> Self {
        Self { ledger, config }
    }

    /// Resolve a full identifier from ledger state.
    pub async fn resolve_full(
        &self,
        did: &FullIdentifier,
    ) -> Result<ResolvedDocument, IdentityError> {
        let bytes = bounded(
            self.config.query_timeout(),
            format!("querying {}", did),
            self.ledger.query_did(did),
        )
        .await?
        .ok_or_else(|| IdentityError::NotFound(did.uri().to_string()))?;
        let resolved = chain::resolve_state(did, &bytes)?;
        tracing::debug!(
            did = %did,
            deactivated = resolved.metadata.deactivated,
            "full DID resolved"
        );
        Ok(resolved)
    }
}

#[async_trait]
impl DidResolver for LedgerDidResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<ResolvedDocument, IdentityError> {
        match identifier {
            Identifier::Light(_) => {
                tracing::debug!(did = %identifier, "resolving light DID locally");
                LightDidResolver.resolve(identifier).await
            }
            Identifier::Full(full) => self.resolve_full(full).await,
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<ResolvedDocument, IdentityError> {
        let bytes = bounded(
            self.config.query_timeout(),
            format!("looking up name '{}'", name),
            self.ledger.query_by_name(name),
        )
        .await?
        .ok_or_else(|| IdentityError::NameNotFound(name.to_string()))?;
        let record: NameRecord = codec::decode(&bytes).map_err(|e| IdentityError::StateDecode {
            did: name.to_string(),
            reason: e.to_string(),
        })?;
        let did = match Identifier::parse(&record.did) {
            Ok(Identifier::Full(full)) => full,
            _ => {
                return Err(IdentityError::StateDecode {
                    did: record.did,
                    reason: format!("name '{}' points at a non-full identifier", name),
                })
            }
        };

        let resolved = self.resolve_full(&did).await?;
        if resolved.web3_name.as_deref() != Some(name) {
            return Err(IdentityError::StateDecode {
                did: did.uri().to_string(),
                reason: format!("name '{}' is not bound in DID state", name),
            });
        }
        Ok(resolved)
    }
}

/// Run a ledger call under a deadline.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    what: String,
    call: F,
) -> Result<T, IdentityError>
where
    F: Future<Output = Result<T, LedgerError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "{} timed out", what);
            Err(IdentityError::Timeout(what))
        }
    }
}
