use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{AccountAddress, KeyRole, KeyScheme};

use crate::codec;
use crate::error::LedgerError;
use crate::signer::SignerOutput;

/// A public key as stored on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainKey {
    pub scheme: KeyScheme,
    pub public_key: [u8; 32],
}

impl ChainKey {
    pub fn new(scheme: KeyScheme, public_key: [u8; 32]) -> Self {
        Self { scheme, public_key }
    }
}

/// A service endpoint as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainService {
    /// Service id without the leading `#`.
    pub id: String,
    pub service_types: Vec<String>,
    pub urls: Vec<String>,
}

/// Payload of a DID creation transaction.
///
/// The ledger indexes the new DID by `did`, which must be the full
/// identifier of `authentication`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidCreationDetails {
    pub did: String,
    pub submitter: AccountAddress,
    pub authentication: ChainKey,
    pub key_agreement: Vec<ChainKey>,
    pub assertion_method: Option<ChainKey>,
    pub capability_delegation: Option<ChainKey>,
    pub services: Vec<ChainService>,
}

/// Operations an existing DID can authorize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DidCall {
    /// Bind a human-readable name to the DID.
    ClaimName { name: String },
    /// Deactivate the DID. Its state is kept as a tombstone.
    Deactivate,
    /// Anchor an attestation for a credential root hash.
    AddAttestation {
        claim_hash: [u8; 32],
        ctype_hash: [u8; 32],
    },
    /// Revoke a previously anchored attestation.
    RevokeAttestation { claim_hash: [u8; 32] },
}

impl DidCall {
    /// The role whose key must sign this call.
    pub fn required_role(&self) -> KeyRole {
        match self {
            Self::ClaimName { .. } | Self::Deactivate => KeyRole::Authentication,
            Self::AddAttestation { .. } | Self::RevokeAttestation { .. } => {
                KeyRole::AssertionMethod
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ClaimName { .. } => "claim_name",
            Self::Deactivate => "deactivate",
            Self::AddAttestation { .. } => "add_attestation",
            Self::RevokeAttestation { .. } => "revoke_attestation",
        }
    }

    /// Whether the ledger reserves a deposit from the submitter.
    pub fn reserves_deposit(&self) -> bool {
        matches!(self, Self::ClaimName { .. } | Self::AddAttestation { .. })
    }
}

/// A call authorized by an existing DID.
///
/// `tx_counter` must be exactly one more than the DID's last accepted
/// counter, which makes every signed call single-use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidAuthorizedCall {
    pub did: String,
    pub tx_counter: u64,
    pub call: DidCall,
    pub submitter: AccountAddress,
}

/// What a transaction asks the ledger to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    CreateDid(DidCreationDetails),
    DidCall(DidAuthorizedCall),
}

impl TransactionPayload {
    pub fn submitter(&self) -> &AccountAddress {
        match self {
            Self::CreateDid(details) => &details.submitter,
            Self::DidCall(call) => &call.submitter,
        }
    }

    pub fn did(&self) -> &str {
        match self {
            Self::CreateDid(details) => &details.did,
            Self::DidCall(call) => &call.did,
        }
    }

    pub fn reserves_deposit(&self) -> bool {
        match self {
            Self::CreateDid(_) => true,
            Self::DidCall(call) => call.call.reserves_deposit(),
        }
    }
}

/// A transaction waiting for its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub payload: TransactionPayload,
}

impl UnsignedTransaction {
    pub fn new(payload: TransactionPayload) -> Self {
        Self { payload }
    }

    /// Bytes the signer must sign.
    pub fn signing_payload(&self) -> Result<Vec<u8>, LedgerError> {
        codec::encode(&self.payload)
    }

    /// Attach a signer's output.
    pub fn into_signed(self, output: SignerOutput) -> SignedTransaction {
        SignedTransaction {
            payload: self.payload,
            signature: output.signature,
            scheme: output.scheme,
        }
    }
}

/// A transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub payload: TransactionPayload,
    pub signature: Vec<u8>,
    pub scheme: KeyScheme,
}

impl SignedTransaction {
    pub fn submitter(&self) -> &AccountAddress {
        self.payload.submitter()
    }

    /// Hash identifying this transaction.
    pub fn hash(&self) -> Result<[u8; 32], LedgerError> {
        Ok(tessera_crypto::hash(&codec::encode(self)?))
    }
}

/// Result of a submitted transaction once it left the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    /// Included in a finalized block.
    Finalized {
        block_number: u64,
        tx_hash: [u8; 32],
        finalized_at: DateTime<Utc>,
    },
    /// Included, but the ledger refused to apply it.
    Rejected { reason: String },
}

impl TxOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized { .. })
    }
}

/// On-chain state of a full DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidChainState {
    pub authentication: ChainKey,
    pub key_agreement: Vec<ChainKey>,
    pub assertion_method: Option<ChainKey>,
    pub capability_delegation: Option<ChainKey>,
    pub services: Vec<ChainService>,
    pub last_tx_counter: u64,
    pub deposit_owner: AccountAddress,
    pub deposit: u128,
    /// Deactivated DIDs keep their keys so past signatures stay checkable.
    pub deactivated: bool,
    pub name: Option<String>,
}

impl DidChainState {
    /// Key currently bound to a signature role.
    pub fn key_for(&self, role: KeyRole) -> Option<&ChainKey> {
        match role {
            KeyRole::Authentication => Some(&self.authentication),
            KeyRole::AssertionMethod => self.assertion_method.as_ref(),
            KeyRole::CapabilityDelegation => self.capability_delegation.as_ref(),
            KeyRole::KeyAgreement => None,
        }
    }
}

/// Ownership record of a bound name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    /// Full DID URI the name resolves to.
    pub did: String,
    pub owner: AccountAddress,
}

/// Ledger record anchoring a credential root hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Full DID URI of the attester.
    pub attester: String,
    pub ctype_hash: [u8; 32],
    pub revoked: bool,
    pub deposit_owner: AccountAddress,
}
