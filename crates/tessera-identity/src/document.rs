use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tessera_core::{Identifier, KeyRole, KeyScheme};

use crate::error::IdentityError;
use crate::keys::NewKey;

/// Marker every fragment id in a document starts with.
pub const FRAGMENT_MARKER: char = '#';

/// A public key bound to a document role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    /// Content-addressed id, `#0x<hex>`.
    pub id: String,
    #[serde(rename = "type")]
    pub scheme: KeyScheme,
    #[serde(rename = "publicKey", with = "bs58_key")]
    pub public_key: [u8; 32],
}

impl VerificationKey {
    pub fn new(scheme: KeyScheme, public_key: [u8; 32]) -> Self {
        Self {
            id: tessera_crypto::key_id(scheme, &public_key),
            scheme,
            public_key,
        }
    }

    pub fn public_key_bs58(&self) -> String {
        bs58::encode(self.public_key).into_string()
    }
}

impl From<NewKey> for VerificationKey {
    fn from(key: NewKey) -> Self {
        Self::new(key.scheme, key.public_key)
    }
}

/// A service endpoint listed in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Fragment id, `#<name>`.
    pub id: String,
    #[serde(rename = "type")]
    pub service_types: Vec<String>,
    #[serde(rename = "serviceEndpoint")]
    pub urls: Vec<String>,
}

impl ServiceEndpoint {
    /// Create a service endpoint. A missing leading `#` is added.
    pub fn new(
        id: impl Into<String>,
        service_types: Vec<String>,
        urls: Vec<String>,
    ) -> Result<Self, IdentityError> {
        let id = id.into();
        let name = id.strip_prefix(FRAGMENT_MARKER).unwrap_or(&id);
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(IdentityError::InvalidService(format!(
                "service id '{}' must be a non-empty fragment without whitespace",
                id
            )));
        }
        if service_types.is_empty() || urls.is_empty() {
            return Err(IdentityError::InvalidService(format!(
                "service '{}' needs at least one type and one URL",
                id
            )));
        }
        Ok(Self {
            id: format!("{}{}", FRAGMENT_MARKER, name),
            service_types,
            urls,
        })
    }

    /// Id without the leading `#`.
    pub fn name(&self) -> &str {
        self.id.strip_prefix(FRAGMENT_MARKER).unwrap_or(&self.id)
    }

    pub fn has_type(&self, service_type: &str) -> bool {
        self.service_types.iter().any(|t| t == service_type)
    }
}

/// Role-scoped keys of a document before validation.
#[derive(Debug, Clone, Default)]
pub struct DocumentKeys {
    pub authentication: Vec<NewKey>,
    pub key_agreement: Vec<NewKey>,
    pub assertion_method: Vec<NewKey>,
    pub capability_delegation: Vec<NewKey>,
}

/// A DID document. Immutable once built.
///
/// Deserialized documents pass through [`Document::new`], with every key id
/// checked against the id derived from its public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDocument")]
pub struct Document {
    identifier: Identifier,
    authentication: Vec<VerificationKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    key_agreement: Vec<VerificationKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    assertion_method: Vec<VerificationKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    capability_delegation: Vec<VerificationKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    service: Vec<ServiceEndpoint>,
}

impl Document {
    /// Assemble and validate a document.
    ///
    /// Requires an authentication key, checks every key's scheme against
    /// its role, and rejects repeated key or service ids.
    pub fn new(
        identifier: Identifier,
        keys: DocumentKeys,
        services: Vec<ServiceEndpoint>,
    ) -> Result<Self, IdentityError> {
        if keys.authentication.is_empty() {
            return Err(IdentityError::MissingAuthenticationKey);
        }

        let mut seen = HashSet::new();
        let mut bind = |role: KeyRole, keys: Vec<NewKey>| -> Result<Vec<VerificationKey>, IdentityError> {
            keys.into_iter()
                .map(|key| {
                    if !role.accepts(key.scheme) {
                        return Err(IdentityError::InvalidKeyScheme {
                            role,
                            scheme: key.scheme,
                        });
                    }
                    let vk = VerificationKey::from(key);
                    if !seen.insert(vk.id.clone()) {
                        return Err(IdentityError::DuplicateId(vk.id));
                    }
                    Ok(vk)
                })
                .collect()
        };

        let authentication = bind(KeyRole::Authentication, keys.authentication)?;
        let key_agreement = bind(KeyRole::KeyAgreement, keys.key_agreement)?;
        let assertion_method = bind(KeyRole::AssertionMethod, keys.assertion_method)?;
        let capability_delegation =
            bind(KeyRole::CapabilityDelegation, keys.capability_delegation)?;

        for service in &services {
            if !seen.insert(service.id.clone()) {
                return Err(IdentityError::DuplicateId(service.id.clone()));
            }
        }

        Ok(Self {
            identifier,
            authentication,
            key_agreement,
            assertion_method,
            capability_delegation,
            service: services,
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn authentication(&self) -> &[VerificationKey] {
        &self.authentication
    }

    pub fn key_agreement(&self) -> &[VerificationKey] {
        &self.key_agreement
    }

    pub fn assertion_method(&self) -> &[VerificationKey] {
        &self.assertion_method
    }

    pub fn capability_delegation(&self) -> &[VerificationKey] {
        &self.capability_delegation
    }

    pub fn service(&self) -> &[ServiceEndpoint] {
        &self.service
    }

    /// Keys bound to `role`.
    pub fn keys(&self, role: KeyRole) -> &[VerificationKey] {
        match role {
            KeyRole::Authentication => &self.authentication,
            KeyRole::KeyAgreement => &self.key_agreement,
            KeyRole::AssertionMethod => &self.assertion_method,
            KeyRole::CapabilityDelegation => &self.capability_delegation,
        }
    }

    /// Look up a key of `role` by id. Accepts a bare fragment (`#0x..`) or
    /// a DID URL (`did:tessera:..#0x..`) naming this document.
    pub fn find_key(&self, role: KeyRole, key_ref: &str) -> Option<&VerificationKey> {
        let fragment = match key_ref.find(FRAGMENT_MARKER) {
            Some(0) => key_ref,
            Some(pos) if &key_ref[..pos] == self.identifier.uri() => &key_ref[pos..],
            _ => return None,
        };
        self.keys(role).iter().find(|k| k.id == fragment)
    }

    /// Services advertising `service_type`.
    pub fn services_of_type<'a>(
        &'a self,
        service_type: &'a str,
    ) -> impl Iterator<Item = &'a ServiceEndpoint> + 'a {
        self.service.iter().filter(move |s| s.has_type(service_type))
    }

    pub fn to_json(&self) -> Result<serde_json::Value, IdentityError> {
        serde_json::to_value(self).map_err(|e| IdentityError::Serialization(e.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    identifier: Identifier,
    authentication: Vec<VerificationKey>,
    #[serde(default)]
    key_agreement: Vec<VerificationKey>,
    #[serde(default)]
    assertion_method: Vec<VerificationKey>,
    #[serde(default)]
    capability_delegation: Vec<VerificationKey>,
    #[serde(default)]
    service: Vec<ServiceEndpoint>,
}

fn unbind(keys: Vec<VerificationKey>) -> Result<Vec<NewKey>, IdentityError> {
    keys.into_iter()
        .map(|key| {
            let new = NewKey::new(key.scheme, key.public_key);
            if VerificationKey::from(new).id != key.id {
                return Err(IdentityError::UnboundKeyId(key.id));
            }
            Ok(new)
        })
        .collect()
}

impl TryFrom<RawDocument> for Document {
    type Error = IdentityError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let keys = DocumentKeys {
            authentication: unbind(raw.authentication)?,
            key_agreement: unbind(raw.key_agreement)?,
            assertion_method: unbind(raw.assertion_method)?,
            capability_delegation: unbind(raw.capability_delegation)?,
        };
        let services = raw
            .service
            .into_iter()
            .map(|s| ServiceEndpoint::new(s.id, s.service_types, s.urls))
            .collect::<Result<Vec<_>, _>>()?;
        Document::new(raw.identifier, keys, services)
    }
}

/// Resolution metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub deactivated: bool,
}

/// A document together with its resolution metadata and bound name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub document: Document,
    pub metadata: DocumentMetadata,
    #[serde(rename = "web3Name", default, skip_serializing_if = "Option::is_none")]
    pub web3_name: Option<String>,
}

impl ResolvedDocument {
    pub fn active(document: Document) -> Self {
        Self {
            document,
            metadata: DocumentMetadata::default(),
            web3_name: None,
        }
    }
}

mod bs58_key {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bs58::encode(key).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = bs58::decode(&encoded).into_vec().map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("public key must be 32 bytes"))
    }
}
