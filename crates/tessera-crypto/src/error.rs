/// Errors from seed handling, derivation, key decoding and signatures.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Bad word count, unknown word, or checksum mismatch.
    #[error("invalid seed phrase: {0}")]
    InvalidSeed(String),

    #[error("{what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed {what}: {reason}")]
    Encoding { what: &'static str, reason: String },

    #[error("signature does not verify")]
    BadSignature,

    #[error("cannot derive {role} key: {reason}")]
    Derivation { role: String, reason: String },
}
