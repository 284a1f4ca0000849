use crate::registration_state::RegistrationState;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: RegistrationState,
        to: RegistrationState,
    },

    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
