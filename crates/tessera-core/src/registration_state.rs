use std::fmt;

use crate::error::CoreError;

/// The states of a single ledger registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RegistrationState {
    /// Payload built, no signature yet.
    Unsigned,
    /// Signature obtained from the signer.
    Signed,
    /// Handed to the ledger, awaiting inclusion.
    Submitted,
    /// Included in a finalized block. Final state.
    Finalized,
    /// Refused by the ledger; no state change happened. Final state.
    Rejected,
}

impl RegistrationState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Finalized | Self::Rejected)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned => write!(f, "Unsigned"),
            Self::Signed => write!(f, "Signed"),
            Self::Submitted => write!(f, "Submitted"),
            Self::Finalized => write!(f, "Finalized"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Events that drive a registration attempt forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// The signer returned a signature for the payload.
    Sign,
    /// The signed transaction was handed to the ledger client.
    Submit,
    /// The ledger reported inclusion in a finalized block.
    Finalize,
    /// The ledger refused the transaction.
    Reject,
}

/// Enforces the registration lifecycle.
///
/// Valid transitions:
/// - Unsigned → Signed (Sign)
/// - Signed → Submitted (Submit)
/// - Submitted → Finalized (Finalize)
/// - Submitted → Rejected (Reject)
///
/// A rejected attempt is never resubmitted; callers start over from a
/// fresh `Unsigned` payload.
pub struct RegistrationStateMachine;

impl RegistrationStateMachine {
    /// Attempt a state transition based on an event.
    pub fn transition(
        current: RegistrationState,
        event: RegistrationEvent,
    ) -> Result<RegistrationState, CoreError> {
        let new_state = match (current, event) {
            (RegistrationState::Unsigned, RegistrationEvent::Sign) => RegistrationState::Signed,
            (RegistrationState::Signed, RegistrationEvent::Submit) => RegistrationState::Submitted,
            (RegistrationState::Submitted, RegistrationEvent::Finalize) => {
                RegistrationState::Finalized
            }
            (RegistrationState::Submitted, RegistrationEvent::Reject) => RegistrationState::Rejected,
            _ => {
                let target = match event {
                    RegistrationEvent::Sign => RegistrationState::Signed,
                    RegistrationEvent::Submit => RegistrationState::Submitted,
                    RegistrationEvent::Finalize => RegistrationState::Finalized,
                    RegistrationEvent::Reject => RegistrationState::Rejected,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "registration state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: RegistrationState, event: RegistrationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let s = RegistrationState::Unsigned;
        let s = RegistrationStateMachine::transition(s, RegistrationEvent::Sign).unwrap();
        assert_eq!(s, RegistrationState::Signed);
        let s = RegistrationStateMachine::transition(s, RegistrationEvent::Submit).unwrap();
        assert_eq!(s, RegistrationState::Submitted);
        let s = RegistrationStateMachine::transition(s, RegistrationEvent::Finalize).unwrap();
        assert_eq!(s, RegistrationState::Finalized);
        assert!(s.is_final());
    }

    #[test]
    fn test_rejection_is_final() {
        let s = RegistrationStateMachine::transition(
            RegistrationState::Submitted,
            RegistrationEvent::Reject,
        )
        .unwrap();
        assert_eq!(s, RegistrationState::Rejected);
        assert!(s.is_final());
    }

    #[test]
    fn test_cannot_submit_unsigned() {
        let result =
            RegistrationStateMachine::transition(RegistrationState::Unsigned, RegistrationEvent::Submit);
        assert!(matches!(
            result,
            Err(CoreError::InvalidStateTransition {
                from: RegistrationState::Unsigned,
                to: RegistrationState::Submitted,
            })
        ));
    }

    #[test]
    fn test_rejected_cannot_be_resubmitted() {
        assert!(!RegistrationStateMachine::can_transition(
            RegistrationState::Rejected,
            RegistrationEvent::Submit
        ));
        assert!(!RegistrationStateMachine::can_transition(
            RegistrationState::Rejected,
            RegistrationEvent::Sign
        ));
    }

    #[test]
    fn test_cannot_finalize_before_submission() {
        assert!(!RegistrationStateMachine::can_transition(
            RegistrationState::Signed,
            RegistrationEvent::Finalize
        ));
    }

    #[test]
    fn test_cannot_sign_twice() {
        assert!(!RegistrationStateMachine::can_transition(
            RegistrationState::Signed,
            RegistrationEvent::Sign
        ));
    }

    #[test]
    fn test_non_final_states() {
        assert!(!RegistrationState::Unsigned.is_final());
        assert!(!RegistrationState::Signed.is_final());
        assert!(!RegistrationState::Submitted.is_final());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", RegistrationState::Unsigned), "Unsigned");
        assert_eq!(format!("{}", RegistrationState::Finalized), "Finalized");
    }
}
