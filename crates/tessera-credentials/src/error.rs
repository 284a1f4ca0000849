/// Credential errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The credential is structurally unusable. Raised before any ledger
    /// work.
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// Signature, attester, or ledger anchoring does not line up.
    #[error("attestation mismatch: {0}")]
    AttestationMismatch(String),

    #[error("credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("identity error: {0}")]
    Identity(#[from] tessera_identity::IdentityError),

    #[error("ledger error: {0}")]
    Ledger(#[from] tessera_ledger::LedgerError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
