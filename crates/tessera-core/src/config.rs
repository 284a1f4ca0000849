use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound for a single ledger state query, in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

/// Registrar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Check the submitter's free balance before submitting.
    #[serde(default = "default_true")]
    pub capacity_check: bool,
    /// Smallest free balance accepted by the capacity check. Transactions
    /// that reserve a deposit also need at least the ledger's deposit.
    #[serde(default = "default_minimum_balance")]
    pub minimum_balance: u64,
    /// Upper bound for waiting on transaction finality, in milliseconds.
    #[serde(default = "default_finality_timeout_ms")]
    pub finality_timeout_ms: u64,
    /// Upper bound for a single ledger state query, in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

/// Credential verifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Upper bound for the attestation/revocation query, in milliseconds.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_query_timeout_ms() -> u64 {
    10_000
}
fn default_finality_timeout_ms() -> u64 {
    60_000
}
fn default_minimum_balance() -> u64 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            capacity_check: true,
            minimum_balance: default_minimum_balance(),
            finality_timeout_ms: default_finality_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl RegistrarConfig {
    pub fn finality_timeout(&self) -> Duration {
        Duration::from_millis(self.finality_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl VerifierConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let resolver = ResolverConfig::default();
        assert_eq!(resolver.query_timeout(), Duration::from_secs(10));

        let registrar = RegistrarConfig::default();
        assert!(registrar.capacity_check);
        assert_eq!(registrar.minimum_balance, 1);
        assert_eq!(registrar.finality_timeout(), Duration::from_secs(60));

        let verifier = VerifierConfig::default();
        assert_eq!(verifier.query_timeout_ms, 10_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let registrar: RegistrarConfig =
            serde_json::from_str(r#"{"capacity_check": false}"#).unwrap();
        assert!(!registrar.capacity_check);
        assert_eq!(registrar.finality_timeout_ms, 60_000);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = RegistrarConfig {
            minimum_balance: 500,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: RegistrarConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.minimum_balance, 500);
        assert!(back.capacity_check);
    }
}
