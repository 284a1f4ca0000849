//! `tessera resolve` — Resolve a light DID and inspect what it publishes.
//!
//! Full DIDs and names live on a ledger. The only connector this binary
//! has is in-memory, so they are resolved inside `tessera demo`.

use clap::Args;
use serde::Serialize;
use std::time::Duration;
use tessera_core::Identifier;
use tessera_credentials::{
    fetch_collection, published_collection_urls, Credential, EndpointFetcher, HttpFetcher,
};
use tessera_identity::{DidResolver, Document, LightDidResolver, ResolvedDocument};

use crate::config::TesseraConfig;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The DID to resolve, or a name with `--name`.
    pub target: String,

    /// Treat the target as a bound name instead of a DID.
    #[arg(long)]
    pub name: bool,

    /// Fetch the published credential collections the document lists and
    /// check each credential offline.
    #[arg(long)]
    pub collections: bool,
}

/// One credential found in a published collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishedCredential {
    attester: String,
    root_hash: String,
    /// Why the offline checks failed, if they did.
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

impl From<&Credential> for PublishedCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            attester: credential.attester.clone(),
            root_hash: credential.root_hash.clone(),
            problem: credential.check().err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CollectionReport {
    url: String,
    credentials: Vec<PublishedCredential>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: &ResolveArgs, config: &TesseraConfig) -> anyhow::Result<()> {
    let resolved = resolve_target(args, config).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);

    if args.collections {
        let fetcher = HttpFetcher::new(Duration::from_millis(config.verifier.query_timeout_ms))?;
        let reports = inspect_collections(&fetcher, &resolved.document).await;
        if reports.is_empty() {
            tracing::info!("document lists no published credential collections");
        } else {
            tracing::info!("attestation and revocation are checked on a ledger, not here");
        }
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

async fn resolve_target(
    args: &ResolveArgs,
    config: &TesseraConfig,
) -> anyhow::Result<ResolvedDocument> {
    if !args.name {
        let identifier = Identifier::parse(&args.target)?;
        if identifier.is_light() {
            return Ok(LightDidResolver.resolve(&identifier).await?);
        }
    }
    anyhow::bail!(
        "'{}' can only be resolved on a ledger, and {} is an in-memory ledger whose state ends \
         with the process; `tessera demo` registers and resolves full DIDs and names",
        args.target,
        config.ledger.endpoint
    )
}

async fn inspect_collections(
    fetcher: &dyn EndpointFetcher,
    document: &Document,
) -> Vec<CollectionReport> {
    let mut reports = Vec::new();
    for url in published_collection_urls(document) {
        let report = match fetch_collection(fetcher, &url).await {
            Ok(credentials) => CollectionReport {
                credentials: credentials.iter().map(PublishedCredential::from).collect(),
                url,
                error: None,
            },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "collection unavailable");
                CollectionReport {
                    url,
                    credentials: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }
    reports
}
