//! Binary encoding of everything that crosses the ledger boundary.
//!
//! Every value is prefixed with a one-byte codec version so stored state
//! written by an older layout is reported as a decode error rather than
//! misread.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::LedgerError;

/// Current codec version.
pub const CODEC_VERSION: u8 = 1;

/// Encode a value with the version prefix.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    let body = bincode::serialize(value)
        .map_err(|e| LedgerError::Internal(format!("encode failed: {}", e)))?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a value, checking the version prefix.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| LedgerError::Decode("empty input".into()))?;
    if *version != CODEC_VERSION {
        return Err(LedgerError::Decode(format!(
            "unsupported codec version {}, expected {}",
            version, CODEC_VERSION
        )));
    }
    bincode::deserialize(body).map_err(|e| LedgerError::Decode(e.to_string()))
}
