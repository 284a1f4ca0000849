//! BIP-39 seed phrases.
//!
//! A seed phrase is the single secret every role key is derived from. It is
//! never written anywhere by this crate; the 64-byte seed is recomputed on
//! demand and wiped after use.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;

/// Word counts accepted by BIP-39.
const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// A checksum-validated English BIP-39 mnemonic.
#[derive(Clone)]
pub struct SeedPhrase {
    mnemonic: Mnemonic,
}

impl SeedPhrase {
    /// Parse a mnemonic. Whitespace and letter case are normalized first.
    ///
    /// Fails with [`CryptoError::InvalidSeed`] on a bad word count, an
    /// unknown word, or a checksum mismatch.
    pub fn parse(phrase: &str) -> Result<Self, CryptoError> {
        let normalized = phrase
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| CryptoError::InvalidSeed(e.to_string()))?;
        Ok(Self { mnemonic })
    }

    /// Generate a fresh mnemonic with `word_count` words from OS entropy.
    pub fn generate(word_count: usize) -> Result<Self, CryptoError> {
        if !VALID_WORD_COUNTS.contains(&word_count) {
            return Err(CryptoError::InvalidSeed(format!(
                "unsupported word count {}, expected one of {:?}",
                word_count, VALID_WORD_COUNTS
            )));
        }
        // 11 bits per word, 1 checksum bit per 32 bits of entropy.
        let mut entropy = vec![0u8; word_count / 3 * 4];
        OsRng.fill_bytes(&mut entropy);
        let result = Mnemonic::from_entropy(&entropy);
        entropy.zeroize();
        let mnemonic = result.map_err(|e| CryptoError::InvalidSeed(e.to_string()))?;
        Ok(Self { mnemonic })
    }

    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// The phrase as space-separated words.
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    /// 64-byte BIP-39 seed with an empty passphrase.
    pub(crate) fn seed_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.mnemonic.to_seed_normalized(""))
    }
}

impl std::fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedPhrase")
            .field("word_count", &self.word_count())
            .finish_non_exhaustive()
    }
}
