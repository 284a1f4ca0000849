//! Tessera Ledger Layer
//!
//! Narrow interfaces to the ledger that anchors full DIDs: a client for
//! submitting transactions and querying state, a connector that owns the
//! connection lifecycle, and an external signer. Also provides the wire
//! types exchanged with the ledger and an in-memory adapter.

pub mod adapters;
pub mod codec;
pub mod error;
pub mod signer;
pub mod traits;
pub mod types;

pub use adapters::memory::{MemoryConnector, MemoryLedger};
pub use error::LedgerError;
pub use signer::{KeyPairSigner, Signer, SignerError, SignerOutput};
pub use traits::{LedgerClient, LedgerConnector, LedgerHandle};
pub use types::{
    AttestationRecord, ChainKey, ChainService, DidAuthorizedCall, DidCall, DidChainState,
    DidCreationDetails, NameRecord, SignedTransaction, TransactionPayload, TxOutcome,
    UnsignedTransaction,
};
