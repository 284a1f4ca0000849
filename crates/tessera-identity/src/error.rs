use tessera_core::{KeyRole, KeyScheme};

/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("a document needs an authentication key")]
    MissingAuthenticationKey,

    #[error("{scheme} keys cannot be used for {role}")]
    InvalidKeyScheme { role: KeyRole, scheme: KeyScheme },

    #[error("duplicate id in document: {0}")]
    DuplicateId(String),

    #[error("key id {0} is not derived from its public key")]
    UnboundKeyId(String),

    #[error("invalid service endpoint: {0}")]
    InvalidService(String),

    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("DID not found: {0}")]
    NotFound(String),

    #[error("name not found: {0}")]
    NameNotFound(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("on-chain state of {did} cannot be decoded: {reason}")]
    StateDecode { did: String, reason: String },

    #[error("insufficient resources: available {available}, required {required}")]
    InsufficientResources { available: u128, required: u128 },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid registration transition: {0}")]
    InvalidTransition(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] tessera_ledger::LedgerError),

    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    #[error("core error: {0}")]
    Core(#[from] tessera_core::CoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
