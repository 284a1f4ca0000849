use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

use crate::credential::Credential;
use crate::error::CredentialError;

/// Fetches JSON published at a service endpoint.
///
/// Exists so verification can run against something other than the
/// network.
#[async_trait]
pub trait EndpointFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<serde_json::Value, CredentialError>;
}

/// Fetches over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CredentialError::CredentialUnavailable(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EndpointFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<serde_json::Value, CredentialError> {
        let unavailable = |e: reqwest::Error| {
            CredentialError::CredentialUnavailable(format!("fetching {}: {}", uri, e))
        };
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        tracing::debug!(uri = %uri, status = %response.status(), "endpoint fetched");
        response.json().await.map_err(unavailable)
    }
}

/// Serves fixed JSON documents from memory.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    documents: DashMap<String, serde_json::Value>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `document` at `uri`.
    pub fn publish(&self, uri: &str, document: serde_json::Value) {
        self.documents.insert(uri.to_string(), document);
    }
}

#[async_trait]
impl EndpointFetcher for StaticFetcher {
    async fn fetch(&self, uri: &str) -> Result<serde_json::Value, CredentialError> {
        self.documents
            .get(uri)
            .map(|d| d.value().clone())
            .ok_or_else(|| CredentialError::CredentialUnavailable(format!("nothing at {}", uri)))
    }
}

/// Fetch the credential collection published at `uri`.
///
/// The collection is a JSON array of `{"credential": ...}` objects and must
/// not be empty. Entries are parsed but not checked.
pub async fn fetch_collection(
    fetcher: &dyn EndpointFetcher,
    uri: &str,
) -> Result<Vec<Credential>, CredentialError> {
    let collection = fetcher.fetch(uri).await?;
    let entries = collection.as_array().ok_or_else(|| {
        CredentialError::CredentialUnavailable(format!("{} is not a credential collection", uri))
    })?;
    if entries.is_empty() {
        return Err(CredentialError::CredentialUnavailable(format!(
            "no credentials published at {}",
            uri
        )));
    }
    entries
        .iter()
        .map(|entry| {
            let credential = entry.get("credential").cloned().ok_or_else(|| {
                CredentialError::Malformed("collection entry has no 'credential' field".into())
            })?;
            Credential::from_value(credential)
        })
        .collect()
}
