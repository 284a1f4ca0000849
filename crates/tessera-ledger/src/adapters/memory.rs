use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tessera_core::{AccountAddress, FullIdentifier, KeyScheme};
use tessera_crypto::{PublicKey, Signature};

use crate::codec;
use crate::error::LedgerError;
use crate::traits::{LedgerClient, LedgerConnector, LedgerHandle};
use crate::types::{
    AttestationRecord, ChainKey, DidAuthorizedCall, DidCall, DidChainState, DidCreationDetails,
    NameRecord, SignedTransaction, TransactionPayload, TxOutcome,
};

/// Deposit reserved per stored item unless configured otherwise.
pub const DEFAULT_DEPOSIT: u128 = 1_000;

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 32;

/// Outcome of applying an included transaction.
enum Dispatch {
    Applied,
    Failed(String),
}

/// In-process ledger.
///
/// Applies transactions one block at a time, verifies DID signatures and
/// transaction counters, and reserves deposits from submitter balances.
/// DID state is stored in its encoded form, exactly as a remote node
/// would return it. Block time, query latency and forced rejections can
/// be tuned for tests.
pub struct MemoryLedger {
    /// Encoded `DidChainState` keyed by full DID URI.
    dids: DashMap<String, Vec<u8>>,
    /// Bound names.
    names: DashMap<String, NameRecord>,
    /// Attestations keyed by credential root hash.
    attestations: DashMap<[u8; 32], AttestationRecord>,
    /// Free balances.
    balances: DashMap<AccountAddress, u128>,
    deposit: u128,
    block_number: AtomicU64,
    block_time_ms: AtomicU64,
    query_delay_ms: AtomicU64,
    /// Reasons for the next included transactions to be rejected with.
    forced_rejections: Mutex<VecDeque<String>>,
    /// Serializes block production.
    block_lock: tokio::sync::Mutex<()>,
}

impl MemoryLedger {
    /// Create an empty ledger with instant blocks.
    pub fn new() -> Self {
        Self {
            dids: DashMap::new(),
            names: DashMap::new(),
            attestations: DashMap::new(),
            balances: DashMap::new(),
            deposit: DEFAULT_DEPOSIT,
            block_number: AtomicU64::new(0),
            block_time_ms: AtomicU64::new(0),
            query_delay_ms: AtomicU64::new(0),
            forced_rejections: Mutex::new(VecDeque::new()),
            block_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Set the deposit reserved per DID, name and attestation.
    pub fn with_deposit(mut self, deposit: u128) -> Self {
        self.deposit = deposit;
        self
    }

    /// Set the time between submission and finality.
    pub fn with_block_time(self, block_time: Duration) -> Self {
        self.set_block_time(block_time);
        self
    }

    pub fn set_block_time(&self, block_time: Duration) {
        self.block_time_ms
            .store(block_time.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay every state query by `delay`.
    pub fn set_query_delay(&self, delay: Duration) {
        self.query_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn deposit(&self) -> u128 {
        self.deposit
    }

    /// Height of the last produced block.
    pub fn block_number(&self) -> u64 {
        self.block_number.load(Ordering::SeqCst)
    }

    /// Credit `amount` to an account.
    pub fn fund(&self, account: &AccountAddress, amount: u128) {
        self.balances
            .entry(account.clone())
            .and_modify(|b| *b = b.saturating_add(amount))
            .or_insert(amount);
    }

    pub fn balance(&self, account: &AccountAddress) -> u128 {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }

    /// Make the next included transaction fail with `reason`.
    pub fn reject_next(&self, reason: impl Into<String>) {
        self.forced_rejections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reason.into());
    }

    /// Overwrite the stored state bytes of a DID.
    pub fn put_raw_did_state(&self, did: &FullIdentifier, bytes: Vec<u8>) {
        self.dids.insert(did.uri().to_string(), bytes);
    }

    fn take_forced_rejection(&self) -> Option<String> {
        self.forced_rejections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    fn load_did(&self, did: &str) -> Result<Option<DidChainState>, LedgerError> {
        match self.dids.get(did) {
            Some(bytes) => codec::decode(bytes.value()).map(Some),
            None => Ok(None),
        }
    }

    fn store_did(&self, did: &str, state: &DidChainState) -> Result<(), LedgerError> {
        self.dids.insert(did.to_string(), codec::encode(state)?);
        Ok(())
    }

    /// Take `amount` from an account's free balance.
    fn reserve(&self, account: &AccountAddress, amount: u128) -> bool {
        match self.balances.get_mut(account) {
            Some(mut balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => amount == 0,
        }
    }

    async fn query_latency(&self) {
        let delay = self.query_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Pool-level checks: signature and transaction counter.
    fn validate(&self, tx: &SignedTransaction) -> Result<(), LedgerError> {
        let payload = codec::encode(&tx.payload)?;
        match &tx.payload {
            TransactionPayload::CreateDid(details) => {
                check_signature(&details.authentication, tx.scheme, &payload, &tx.signature)
            }
            TransactionPayload::DidCall(call) => {
                let state = self
                    .load_did(&call.did)?
                    .ok_or_else(|| LedgerError::Rejected(format!("unknown DID {}", call.did)))?;
                let role = call.call.required_role();
                let key = state.key_for(role).ok_or_else(|| {
                    LedgerError::Rejected(format!("{} has no {} key", call.did, role))
                })?;
                check_signature(key, tx.scheme, &payload, &tx.signature)?;
                let expected = state.last_tx_counter + 1;
                if call.tx_counter != expected {
                    return Err(LedgerError::Rejected(format!(
                        "stale transaction counter {}, expected {}",
                        call.tx_counter, expected
                    )));
                }
                Ok(())
            }
        }
    }

    fn apply(&self, payload: &TransactionPayload) -> Result<Dispatch, LedgerError> {
        match payload {
            TransactionPayload::CreateDid(details) => self.apply_create(details),
            TransactionPayload::DidCall(call) => self.apply_call(call),
        }
    }

    fn apply_create(&self, details: &DidCreationDetails) -> Result<Dispatch, LedgerError> {
        let expected = FullIdentifier::from_authentication_key(&details.authentication.public_key);
        if details.did != expected.uri() {
            return Ok(Dispatch::Failed(
                "DID does not match its authentication key".into(),
            ));
        }
        if self.dids.contains_key(&details.did) {
            return Ok(Dispatch::Failed(format!("{} already exists", details.did)));
        }
        let signature_keys = details
            .assertion_method
            .iter()
            .chain(details.capability_delegation.iter());
        if details.key_agreement.iter().any(|k| k.scheme != KeyScheme::X25519)
            || signature_keys.into_iter().any(|k| !k.scheme.is_signature())
        {
            return Ok(Dispatch::Failed("invalid key scheme for role".into()));
        }
        let mut seen = HashSet::new();
        if !details.services.iter().all(|s| seen.insert(s.id.as_str())) {
            return Ok(Dispatch::Failed("duplicate service id".into()));
        }
        if !self.reserve(&details.submitter, self.deposit) {
            return Ok(Dispatch::Failed("insufficient balance for deposit".into()));
        }

        let state = DidChainState {
            authentication: details.authentication,
            key_agreement: details.key_agreement.clone(),
            assertion_method: details.assertion_method,
            capability_delegation: details.capability_delegation,
            services: details.services.clone(),
            last_tx_counter: 0,
            deposit_owner: details.submitter.clone(),
            deposit: self.deposit,
            deactivated: false,
            name: None,
        };
        self.store_did(&details.did, &state)?;
        tracing::info!(did = %details.did, "DID created");
        Ok(Dispatch::Applied)
    }

    fn apply_call(&self, call: &DidAuthorizedCall) -> Result<Dispatch, LedgerError> {
        let mut state = self
            .load_did(&call.did)?
            .ok_or_else(|| LedgerError::Internal(format!("{} vanished", call.did)))?;
        if state.deactivated {
            return Ok(Dispatch::Failed(format!("{} is deactivated", call.did)));
        }

        match &call.call {
            DidCall::ClaimName { name } => {
                if !is_valid_name(name) {
                    return Ok(Dispatch::Failed(format!("invalid name '{}'", name)));
                }
                if state.name.is_some() {
                    return Ok(Dispatch::Failed(format!("{} already owns a name", call.did)));
                }
                if self.names.contains_key(name) {
                    return Ok(Dispatch::Failed(format!("name '{}' already claimed", name)));
                }
                if !self.reserve(&call.submitter, self.deposit) {
                    return Ok(Dispatch::Failed("insufficient balance for deposit".into()));
                }
                self.names.insert(
                    name.clone(),
                    NameRecord {
                        did: call.did.clone(),
                        owner: call.submitter.clone(),
                    },
                );
                state.name = Some(name.clone());
                tracing::info!(did = %call.did, name = %name, "name claimed");
            }
            DidCall::Deactivate => {
                state.deactivated = true;
                self.fund(&state.deposit_owner, state.deposit);
                state.deposit = 0;
                tracing::info!(did = %call.did, "DID deactivated");
            }
            DidCall::AddAttestation {
                claim_hash,
                ctype_hash,
            } => {
                if self.attestations.contains_key(claim_hash) {
                    return Ok(Dispatch::Failed("attestation already exists".into()));
                }
                if !self.reserve(&call.submitter, self.deposit) {
                    return Ok(Dispatch::Failed("insufficient balance for deposit".into()));
                }
                self.attestations.insert(
                    *claim_hash,
                    AttestationRecord {
                        attester: call.did.clone(),
                        ctype_hash: *ctype_hash,
                        revoked: false,
                        deposit_owner: call.submitter.clone(),
                    },
                );
                tracing::info!(
                    attester = %call.did,
                    claim_hash = %hex::encode(claim_hash),
                    "attestation added"
                );
            }
            DidCall::RevokeAttestation { claim_hash } => {
                let Some(mut record) = self.attestations.get_mut(claim_hash) else {
                    return Ok(Dispatch::Failed("attestation not found".into()));
                };
                if record.attester != call.did {
                    return Ok(Dispatch::Failed("only the attester can revoke".into()));
                }
                if record.revoked {
                    return Ok(Dispatch::Failed("attestation already revoked".into()));
                }
                record.revoked = true;
                tracing::info!(
                    attester = %call.did,
                    claim_hash = %hex::encode(claim_hash),
                    "attestation revoked"
                );
            }
        }

        state.last_tx_counter = call.tx_counter;
        self.store_did(&call.did, &state)?;
        Ok(Dispatch::Applied)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_signature(
    key: &ChainKey,
    scheme: KeyScheme,
    payload: &[u8],
    signature: &[u8],
) -> Result<(), LedgerError> {
    if key.scheme != scheme || !scheme.is_signature() {
        return Err(LedgerError::Rejected(format!(
            "signature scheme {} does not match key scheme {}",
            scheme, key.scheme
        )));
    }
    let public_key = PublicKey::from_bytes(&key.public_key)
        .map_err(|e| LedgerError::Rejected(e.to_string()))?;
    let signature =
        Signature::from_bytes(signature).map_err(|e| LedgerError::Rejected(e.to_string()))?;
    tessera_crypto::verify(payload, &signature, &public_key)
        .map_err(|_| LedgerError::Rejected("bad signature".into()))
}

fn is_valid_name(name: &str) -> bool {
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn submit(&self, tx: SignedTransaction) -> Result<TxOutcome, LedgerError> {
        let _block = self.block_lock.lock().await;
        self.validate(&tx)?;

        let block_time = self.block_time_ms.load(Ordering::SeqCst);
        if block_time > 0 {
            tokio::time::sleep(Duration::from_millis(block_time)).await;
        }
        let block_number = self.block_number.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = tx.hash()?;

        if let Some(reason) = self.take_forced_rejection() {
            tracing::warn!(block_number, reason = %reason, "transaction rejected");
            return Ok(TxOutcome::Rejected { reason });
        }

        match self.apply(&tx.payload)? {
            Dispatch::Applied => Ok(TxOutcome::Finalized {
                block_number,
                tx_hash,
                finalized_at: Utc::now(),
            }),
            Dispatch::Failed(reason) => {
                tracing::warn!(
                    block_number,
                    did = %tx.payload.did(),
                    reason = %reason,
                    "transaction rejected"
                );
                Ok(TxOutcome::Rejected { reason })
            }
        }
    }

    async fn query_did(&self, did: &FullIdentifier) -> Result<Option<Vec<u8>>, LedgerError> {
        self.query_latency().await;
        Ok(self.dids.get(did.uri()).map(|bytes| bytes.value().clone()))
    }

    async fn query_by_name(&self, name: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.query_latency().await;
        match self.names.get(name) {
            Some(record) => codec::encode(record.value()).map(Some),
            None => Ok(None),
        }
    }

    async fn free_balance(&self, account: &AccountAddress) -> Result<u128, LedgerError> {
        self.query_latency().await;
        Ok(self.balance(account))
    }

    async fn deposit(&self) -> Result<u128, LedgerError> {
        Ok(self.deposit)
    }

    async fn query_attestation(
        &self,
        claim_hash: &[u8; 32],
    ) -> Result<Option<AttestationRecord>, LedgerError> {
        self.query_latency().await;
        Ok(self.attestations.get(claim_hash).map(|r| r.value().clone()))
    }
}

/// Scheme of endpoints served by [`MemoryConnector`].
pub const MEMORY_SCHEME: &str = "memory://";

/// Connector handing out [`MemoryLedger`] instances keyed by endpoint.
///
/// Connecting twice to the same endpoint yields the same ledger.
pub struct MemoryConnector {
    ledgers: DashMap<String, Arc<MemoryLedger>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
        }
    }

    /// Serve a pre-configured ledger at `endpoint`.
    pub fn insert(&self, endpoint: &str, ledger: Arc<MemoryLedger>) {
        self.ledgers.insert(endpoint.to_string(), ledger);
    }

    /// The ledger behind `endpoint`, for funding accounts and other
    /// test hooks.
    pub fn ledger(&self, endpoint: &str) -> Option<Arc<MemoryLedger>> {
        self.ledgers.get(endpoint).map(|l| Arc::clone(l.value()))
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerConnector for MemoryConnector {
    async fn connect(&self, endpoint: &str) -> Result<LedgerHandle, LedgerError> {
        if !endpoint.starts_with(MEMORY_SCHEME) {
            return Err(LedgerError::Connection(format!(
                "unsupported endpoint '{}', expected {}<name>",
                endpoint, MEMORY_SCHEME
            )));
        }
        let ledger = Arc::clone(
            self.ledgers
                .entry(endpoint.to_string())
                .or_insert_with(|| Arc::new(MemoryLedger::new()))
                .value(),
        );
        tracing::info!(endpoint = %endpoint, "connected to in-memory ledger");
        let handle: LedgerHandle = ledger;
        Ok(handle)
    }

    async fn disconnect(&self, handle: LedgerHandle) -> Result<(), LedgerError> {
        drop(handle);
        tracing::debug!("disconnected from in-memory ledger");
        Ok(())
    }
}
