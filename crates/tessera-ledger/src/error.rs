/// Ledger-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger connection error: {0}")]
    Connection(String),

    #[error("ledger data decode error: {0}")]
    Decode(String),

    /// The transaction was refused before inclusion (bad signature,
    /// stale nonce, unknown origin).
    #[error("transaction refused: {0}")]
    Rejected(String),

    #[error("internal ledger error: {0}")]
    Internal(String),
}
