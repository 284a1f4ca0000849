//! Conversion between documents and on-chain DID state.

use tessera_core::{AccountAddress, FullIdentifier};
use tessera_ledger::{codec, ChainService, DidChainState, DidCreationDetails};

use crate::document::{Document, DocumentKeys, DocumentMetadata, ResolvedDocument, ServiceEndpoint};
use crate::error::IdentityError;
use crate::keys::{NewDidKeys, NewKey};

/// Creation payload for a new full DID.
pub fn creation_details(
    submitter: &AccountAddress,
    keys: &NewDidKeys,
    services: &[ServiceEndpoint],
) -> DidCreationDetails {
    let did = FullIdentifier::from_authentication_key(&keys.authentication.public_key);
    DidCreationDetails {
        did: did.uri().to_string(),
        submitter: submitter.clone(),
        authentication: keys.authentication.into(),
        key_agreement: keys.key_agreement.into_iter().map(Into::into).collect(),
        assertion_method: keys.assertion_method.map(Into::into),
        capability_delegation: keys.capability_delegation.map(Into::into),
        services: services.iter().map(service_to_chain).collect(),
    }
}

fn service_to_chain(service: &ServiceEndpoint) -> ChainService {
    ChainService {
        id: service.name().to_string(),
        service_types: service.service_types.clone(),
        urls: service.urls.clone(),
    }
}

/// Decode raw on-chain state.
pub fn decode_state(did: &FullIdentifier, bytes: &[u8]) -> Result<DidChainState, IdentityError> {
    codec::decode(bytes).map_err(|e| state_error(did, e))
}

/// Turn on-chain state into the canonical full document.
///
/// Any mismatch between the state and a well-formed document for `did`
/// is a [`IdentityError::StateDecode`].
pub fn document_from_state(
    did: &FullIdentifier,
    state: &DidChainState,
) -> Result<Document, IdentityError> {
    if &state.authentication.public_key != did.authentication_key() {
        return Err(state_error(did, "authentication key does not match identifier"));
    }
    let keys = DocumentKeys {
        authentication: vec![NewKey::from(state.authentication)],
        key_agreement: state.key_agreement.iter().copied().map(NewKey::from).collect(),
        assertion_method: state.assertion_method.map(NewKey::from).into_iter().collect(),
        capability_delegation: state
            .capability_delegation
            .map(NewKey::from)
            .into_iter()
            .collect(),
    };
    let services = state
        .services
        .iter()
        .map(|s| ServiceEndpoint::new(s.id.as_str(), s.service_types.clone(), s.urls.clone()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| state_error(did, e))?;
    Document::new(did.clone().into(), keys, services).map_err(|e| state_error(did, e))
}

/// Decode raw on-chain state into a resolved document.
pub fn resolve_state(did: &FullIdentifier, bytes: &[u8]) -> Result<ResolvedDocument, IdentityError> {
    let state = decode_state(did, bytes)?;
    let document = document_from_state(did, &state)?;
    Ok(ResolvedDocument {
        document,
        metadata: DocumentMetadata {
            deactivated: state.deactivated,
        },
        web3_name: state.name,
    })
}

fn state_error(did: &FullIdentifier, reason: impl std::fmt::Display) -> IdentityError {
    IdentityError::StateDecode {
        did: did.uri().to_string(),
        reason: reason.to_string(),
    }
}
