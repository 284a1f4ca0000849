use async_trait::async_trait;
use std::sync::Arc;
use tessera_core::{AccountAddress, FullIdentifier};

use crate::error::LedgerError;
use crate::types::{AttestationRecord, SignedTransaction, TxOutcome};

/// Ledger client interface.
///
/// Each implementation bridges Tessera to a concrete ledger (a remote
/// node, an in-memory test ledger, ...). State queries return the raw
/// encoded bytes; decoding them is the caller's concern.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a signed transaction and wait until it is finalized or
    /// rejected.
    async fn submit(&self, tx: SignedTransaction) -> Result<TxOutcome, LedgerError>;

    /// Encoded `DidChainState` of a full DID, if any.
    async fn query_did(&self, did: &FullIdentifier) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Encoded `NameRecord` of a bound name, if any.
    async fn query_by_name(&self, name: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Spendable balance of an account.
    async fn free_balance(&self, account: &AccountAddress) -> Result<u128, LedgerError>;

    /// Amount reserved from the submitter by a DID creation, a name claim
    /// or an attestation.
    async fn deposit(&self) -> Result<u128, LedgerError>;

    /// Attestation anchored for a credential root hash, if any.
    async fn query_attestation(
        &self,
        claim_hash: &[u8; 32],
    ) -> Result<Option<AttestationRecord>, LedgerError>;
}

/// Shared handle to a connected ledger client.
///
/// Passed explicitly to every component that talks to the ledger.
pub type LedgerHandle = Arc<dyn LedgerClient>;

/// Owns the connection lifecycle of ledger clients.
#[async_trait]
pub trait LedgerConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<LedgerHandle, LedgerError>;

    async fn disconnect(&self, handle: LedgerHandle) -> Result<(), LedgerError>;
}
