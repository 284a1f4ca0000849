//! Tessera Core — Fundamental types, errors, and configuration for the
//! Tessera decentralized identifier toolkit.

pub mod config;
pub mod error;
pub mod registration_state;
pub mod types;

pub use config::{RegistrarConfig, ResolverConfig, VerifierConfig};
pub use error::CoreError;
pub use registration_state::{RegistrationEvent, RegistrationState, RegistrationStateMachine};
pub use types::{
    AccountAddress, FullIdentifier, Identifier, KeyRole, KeyScheme, LightIdentifier, DID_PREFIX,
    PUBLIC_KEY_LENGTH,
};
