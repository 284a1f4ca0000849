pub mod derivation;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod seed;
pub mod signing;

pub use derivation::{derive_encryption_key, derive_key_set, derive_signing_key, KeySet};
pub use error::CryptoError;
pub use hashing::{hash, key_id, Hash};
pub use keys::{EncryptionKeyPair, EncryptionPublicKey, KeyPair, PublicKey};
pub use seed::SeedPhrase;
pub use signing::{sign, verify, Signature};
