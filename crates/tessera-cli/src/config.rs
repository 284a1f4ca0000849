//! `tessera.toml`: ledger endpoint, per-component settings, logging.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_core::{RegistrarConfig, ResolverConfig, VerifierConfig};

/// Full configuration for the `tessera` binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TesseraConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub registrar: RegistrarConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Endpoint handed to the ledger connector.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

/// Output shape of log lines on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_endpoint() -> String {
    "memory://local".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format == LogFormat::Json
    }
}

impl TesseraConfig {
    /// Read `path`, or the defaults when there is no file there. Absent
    /// sections and fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?,
            _ => {}
        }
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }
}
