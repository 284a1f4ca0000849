//! Tessera Identity Layer
//!
//! Decentralized identifier documents and their lifecycle:
//! - DID documents with role-scoped keys and service endpoints
//! - Light DIDs, self-certifying and resolvable offline
//! - Decoding of on-chain DID state into canonical full documents
//! - Registration of full DIDs and DID-authorized calls on a ledger
//! - Resolution of identifiers and bound names

pub mod chain;
pub mod did_resolver;
pub mod document;
pub mod error;
pub mod keys;
pub mod light;
pub mod registrar;

pub use did_resolver::{DidResolver, LedgerDidResolver, LightDidResolver};
pub use document::{
    Document, DocumentKeys, DocumentMetadata, ResolvedDocument, ServiceEndpoint, VerificationKey,
};
pub use error::IdentityError;
pub use keys::{NewDidKeys, NewKey};
pub use light::LightDocumentBuilder;
pub use registrar::{upgraded_identifier, LedgerRegistrar, Receipt};
