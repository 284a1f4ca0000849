//! Light DIDs.
//!
//! A light DID document is encoded entirely in its identifier: the
//! authentication key is the identifier's key segment and the remaining
//! content (key agreement key, services) travels in the details segment
//! as compact JSON. Building and resolving are pure functions.

use serde::{Deserialize, Serialize};
use tessera_core::{KeyRole, KeyScheme, LightIdentifier};

use crate::document::{Document, DocumentKeys, ServiceEndpoint};
use crate::error::IdentityError;
use crate::keys::NewKey;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LightDetails {
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    key_agreement: Option<DetailsKey>,
    #[serde(rename = "s", default, skip_serializing_if = "Vec::is_empty")]
    services: Vec<ServiceEndpoint>,
}

impl LightDetails {
    fn is_empty(&self) -> bool {
        self.key_agreement.is_none() && self.services.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailsKey {
    #[serde(rename = "type")]
    scheme: KeyScheme,
    #[serde(rename = "publicKey")]
    public_key: String,
}

impl DetailsKey {
    fn to_new_key(&self) -> Result<NewKey, IdentityError> {
        let bytes = bs58::decode(&self.public_key)
            .into_vec()
            .map_err(|e| IdentityError::InvalidDid(format!("invalid key agreement key: {}", e)))?;
        let public_key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            IdentityError::InvalidDid(format!("key agreement key must be 32 bytes, got {}", b.len()))
        })?;
        Ok(NewKey::new(self.scheme, public_key))
    }
}

/// Builds light DID documents.
pub struct LightDocumentBuilder;

impl LightDocumentBuilder {
    /// Build a light document from its keys and services.
    ///
    /// The identifier is a pure function of the inputs: the same keys and
    /// services always give the same identifier.
    pub fn build(
        authentication: Option<NewKey>,
        key_agreement: Option<NewKey>,
        services: Vec<ServiceEndpoint>,
    ) -> Result<Document, IdentityError> {
        let authentication = authentication.ok_or(IdentityError::MissingAuthenticationKey)?;
        for (role, key) in [
            (KeyRole::Authentication, Some(authentication)),
            (KeyRole::KeyAgreement, key_agreement),
        ] {
            if let Some(key) = key {
                if !role.accepts(key.scheme) {
                    return Err(IdentityError::InvalidKeyScheme {
                        role,
                        scheme: key.scheme,
                    });
                }
            }
        }

        let services = services
            .into_iter()
            .map(|s| ServiceEndpoint::new(s.id, s.service_types, s.urls))
            .collect::<Result<Vec<_>, _>>()?;

        let details = LightDetails {
            key_agreement: key_agreement.map(|k| DetailsKey {
                scheme: k.scheme,
                public_key: bs58::encode(k.public_key).into_string(),
            }),
            services: services.clone(),
        };
        let encoded = if details.is_empty() {
            None
        } else {
            Some(
                serde_json::to_vec(&details)
                    .map_err(|e| IdentityError::Serialization(e.to_string()))?,
            )
        };

        let identifier = LightIdentifier::new(
            authentication.scheme,
            &authentication.public_key,
            encoded,
        )?;
        let keys = DocumentKeys {
            authentication: vec![authentication],
            key_agreement: key_agreement.into_iter().collect(),
            ..Default::default()
        };
        let document = Document::new(identifier.into(), keys, services)?;
        tracing::debug!(did = %document.identifier(), "light document built");
        Ok(document)
    }

    /// Rebuild the document a light identifier encodes.
    ///
    /// Fails with [`IdentityError::InvalidDid`] when the details cannot be
    /// decoded or do not re-encode to the same identifier.
    pub fn from_identifier(identifier: &LightIdentifier) -> Result<Document, IdentityError> {
        let details = match identifier.details() {
            None => LightDetails::default(),
            Some(bytes) => serde_json::from_slice(bytes).map_err(|e| {
                IdentityError::InvalidDid(format!("undecodable details in {}: {}", identifier, e))
            })?,
        };
        let key_agreement = details
            .key_agreement
            .as_ref()
            .map(DetailsKey::to_new_key)
            .transpose()?;
        let authentication = NewKey::new(
            identifier.authentication_scheme(),
            *identifier.authentication_key(),
        );

        let document = Self::build(Some(authentication), key_agreement, details.services)?;
        if document.identifier().uri() != identifier.uri() {
            return Err(IdentityError::InvalidDid(format!(
                "details of {} are not in canonical form",
                identifier
            )));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Identifier;

    fn auth() -> NewKey {
        NewKey::new(KeyScheme::Ed25519, [1u8; 32])
    }

    fn agreement() -> NewKey {
        NewKey::new(KeyScheme::X25519, [2u8; 32])
    }

    fn service(id: &str) -> ServiceEndpoint {
        ServiceEndpoint::new(
            id,
            vec!["PublishedCredentialCollectionV1".into()],
            vec!["http://example.domain.org".into()],
        )
        .unwrap()
    }

    fn light_of(document: &Document) -> LightIdentifier {
        match document.identifier() {
            Identifier::Light(light) => light.clone(),
            other => panic!("expected light identifier, got {}", other),
        }
    }

    #[test]
    fn test_missing_authentication() {
        let result = LightDocumentBuilder::build(None, Some(agreement()), vec![]);
        assert!(matches!(result, Err(IdentityError::MissingAuthenticationKey)));
    }

    #[test]
    fn test_authentication_only_has_no_details() {
        let doc = LightDocumentBuilder::build(Some(auth()), None, vec![]).unwrap();
        let light = light_of(&doc);
        assert!(light.details().is_none());
        assert!(!light.uri().contains(":z"));
        assert_eq!(doc.authentication().len(), 1);
        assert!(doc.key_agreement().is_empty());
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = LightDocumentBuilder::build(Some(auth()), Some(agreement()), vec![service("s")]).unwrap();
        let b = LightDocumentBuilder::build(Some(auth()), Some(agreement()), vec![service("s")]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identifier_depends_on_every_input() {
        let base = LightDocumentBuilder::build(Some(auth()), Some(agreement()), vec![service("s")]).unwrap();
        let no_services = LightDocumentBuilder::build(Some(auth()), Some(agreement()), vec![]).unwrap();
        let no_agreement = LightDocumentBuilder::build(Some(auth()), None, vec![service("s")]).unwrap();
        let other_auth = LightDocumentBuilder::build(
            Some(NewKey::new(KeyScheme::Ed25519, [3u8; 32])),
            Some(agreement()),
            vec![service("s")],
        )
        .unwrap();
        let uris = [
            base.identifier().uri(),
            no_services.identifier().uri(),
            no_agreement.identifier().uri(),
            other_auth.identifier().uri(),
        ];
        for i in 0..uris.len() {
            for j in (i + 1)..uris.len() {
                assert_ne!(uris[i], uris[j]);
            }
        }
    }

    #[test]
    fn test_key_agreement_scheme_checked() {
        let result = LightDocumentBuilder::build(
            Some(auth()),
            Some(NewKey::new(KeyScheme::Ed25519, [2u8; 32])),
            vec![],
        );
        assert!(matches!(
            result,
            Err(IdentityError::InvalidKeyScheme {
                role: KeyRole::KeyAgreement,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_services_rejected() {
        let result =
            LightDocumentBuilder::build(Some(auth()), None, vec![service("s"), service("#s")]);
        assert!(matches!(result, Err(IdentityError::DuplicateId(_))));
    }

    #[test]
    fn test_rebuild_from_identifier() {
        let doc = LightDocumentBuilder::build(
            Some(auth()),
            Some(agreement()),
            vec![service("my-service")],
        )
        .unwrap();
        let rebuilt = LightDocumentBuilder::from_identifier(&light_of(&doc)).unwrap();
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn test_rebuild_rejects_non_canonical_details() {
        // Same content, different key order: decodes, but re-encodes differently.
        let details = format!(
            r##"{{"s":[],"e":{{"type":"x25519","publicKey":"{}"}}}}"##,
            bs58::encode([2u8; 32]).into_string()
        );
        let light =
            LightIdentifier::new(KeyScheme::Ed25519, &[1u8; 32], Some(details.into_bytes())).unwrap();
        let result = LightDocumentBuilder::from_identifier(&light);
        assert!(matches!(result, Err(IdentityError::InvalidDid(_))));
    }

    #[test]
    fn test_rebuild_rejects_garbage_details() {
        let light = LightIdentifier::new(KeyScheme::Ed25519, &[1u8; 32], Some(b"not json".to_vec()))
            .unwrap();
        let result = LightDocumentBuilder::from_identifier(&light);
        assert!(matches!(result, Err(IdentityError::InvalidDid(_))));
    }
}
