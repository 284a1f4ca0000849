//! Tessera Credentials — attested claims, issuance, and verification.
//!
//! A credential's root hash commits to its claim. The attester signs the
//! root hash with an assertion key and anchors it on the ledger; the
//! verifier checks structure, signature, anchoring and revocation.

pub mod credential;
pub mod error;
pub mod fetcher;
pub mod issuer;
pub mod verifier;

pub use credential::{ctype_hash, Claim, Credential, CredentialProof, PROOF_TYPE};
pub use error::CredentialError;
pub use fetcher::{fetch_collection, EndpointFetcher, HttpFetcher, StaticFetcher};
pub use issuer::CredentialIssuer;
pub use verifier::{
    published_collection_urls, CredentialVerifier, VerificationOutcome,
    PUBLISHED_COLLECTION_SERVICE,
};
