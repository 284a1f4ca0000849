use tessera_core::{
    AccountAddress, FullIdentifier, Identifier, RegistrarConfig, RegistrationEvent,
    RegistrationState, RegistrationStateMachine, ResolverConfig,
};
use tessera_ledger::{
    DidAuthorizedCall, DidCall, LedgerError, LedgerHandle, Signer, TransactionPayload, TxOutcome,
    UnsignedTransaction,
};

use crate::chain;
use crate::did_resolver::{bounded, LedgerDidResolver};
use crate::document::{Document, DocumentKeys, ResolvedDocument, ServiceEndpoint};
use crate::error::IdentityError;
use crate::keys::{NewDidKeys, NewKey};

/// Proof that a transaction reached finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub block_number: u64,
    pub tx_hash: [u8; 32],
}

/// Anchors full DIDs on a ledger and submits DID-authorized calls.
///
/// Every operation walks one transaction through
/// `Unsigned -> Signed -> Submitted -> Finalized | Rejected`. Nothing is
/// retried. Two concurrent registrations of the same authentication key
/// are not coordinated here; the ledger accepts at most one of them.
pub struct LedgerRegistrar {
    ledger: LedgerHandle,
    config: RegistrarConfig,
    resolver: LedgerDidResolver,
}

impl LedgerRegistrar {
    pub fn new(ledger: LedgerHandle, config: RegistrarConfig) -> Self {
        let resolver = LedgerDidResolver::new(
            ledger.clone(),
            ResolverConfig {
                query_timeout_ms: config.query_timeout_ms,
            },
        );
        Self {
            ledger,
            config,
            resolver,
        }
    }

    /// Register a new full DID and return its canonical document.
    ///
    /// `signer` must sign with the authentication key in `keys`.
    pub async fn register(
        &self,
        submitter: &AccountAddress,
        keys: &NewDidKeys,
        services: Vec<ServiceEndpoint>,
        signer: &dyn Signer,
    ) -> Result<Document, IdentityError> {
        // Runs the same validation the resolved document will go through.
        let candidate = Document::new(
            FullIdentifier::from_authentication_key(&keys.authentication.public_key).into(),
            DocumentKeys {
                authentication: vec![keys.authentication],
                key_agreement: keys.key_agreement.into_iter().collect(),
                assertion_method: keys.assertion_method.into_iter().collect(),
                capability_delegation: keys.capability_delegation.into_iter().collect(),
            },
            services,
        )?;

        let details = chain::creation_details(submitter, keys, candidate.service());
        let did = FullIdentifier::from_authentication_key(&keys.authentication.public_key);
        let unsigned = UnsignedTransaction::new(TransactionPayload::CreateDid(details));
        let receipt = self.submit(unsigned, submitter, signer).await?;

        let resolved = self.resolver.resolve_full(&did).await?;
        tracing::info!(
            did = %did,
            block_number = receipt.block_number,
            "full DID registered"
        );
        Ok(resolved.document)
    }

    /// Register a full DID carrying the keys and services of a light
    /// document.
    pub async fn upgrade(
        &self,
        light: &Document,
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<Document, IdentityError> {
        if !light.identifier().is_light() {
            return Err(IdentityError::InvalidDid(format!(
                "{} is not a light DID",
                light.identifier()
            )));
        }
        let authentication = light
            .authentication()
            .first()
            .ok_or(IdentityError::MissingAuthenticationKey)?;
        let keys = NewDidKeys {
            authentication: NewKey::new(authentication.scheme, authentication.public_key),
            key_agreement: light
                .key_agreement()
                .first()
                .map(|k| NewKey::new(k.scheme, k.public_key)),
            assertion_method: None,
            capability_delegation: None,
        };
        let document = self
            .register(submitter, &keys, light.service().to_vec(), signer)
            .await?;
        tracing::info!(light = %light.identifier(), full = %document.identifier(), "light DID upgraded");
        Ok(document)
    }

    /// Bind a human-readable name. Signed with the authentication key.
    pub async fn claim_name(
        &self,
        did: &FullIdentifier,
        name: &str,
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<ResolvedDocument, IdentityError> {
        let call = DidCall::ClaimName {
            name: name.to_string(),
        };
        self.submit_call(did, call, submitter, signer).await?;
        self.resolver.resolve_full(did).await
    }

    /// Deactivate a full DID. Signed with the authentication key.
    pub async fn deactivate(
        &self,
        did: &FullIdentifier,
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<ResolvedDocument, IdentityError> {
        self.submit_call(did, DidCall::Deactivate, submitter, signer)
            .await?;
        self.resolver.resolve_full(did).await
    }

    /// Anchor an attestation of `claim_hash`. Signed with the attester's
    /// assertion key.
    pub async fn add_attestation(
        &self,
        attester: &FullIdentifier,
        claim_hash: [u8; 32],
        ctype_hash: [u8; 32],
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<Receipt, IdentityError> {
        let call = DidCall::AddAttestation {
            claim_hash,
            ctype_hash,
        };
        self.submit_call(attester, call, submitter, signer).await
    }

    /// Revoke an attestation. Signed with the attester's assertion key.
    pub async fn revoke_attestation(
        &self,
        attester: &FullIdentifier,
        claim_hash: [u8; 32],
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<Receipt, IdentityError> {
        self.submit_call(
            attester,
            DidCall::RevokeAttestation { claim_hash },
            submitter,
            signer,
        )
        .await
    }

    async fn submit_call(
        &self,
        did: &FullIdentifier,
        call: DidCall,
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<Receipt, IdentityError> {
        let bytes = bounded(
            self.config.query_timeout(),
            format!("querying {}", did),
            self.ledger.query_did(did),
        )
        .await?
        .ok_or_else(|| IdentityError::NotFound(did.uri().to_string()))?;
        let state = chain::decode_state(did, &bytes)?;

        tracing::debug!(did = %did, call = call.name(), "submitting DID call");
        let unsigned = UnsignedTransaction::new(TransactionPayload::DidCall(DidAuthorizedCall {
            did: did.uri().to_string(),
            tx_counter: state.last_tx_counter + 1,
            call,
            submitter: submitter.clone(),
        }));
        self.submit(unsigned, submitter, signer).await
    }

    /// Check the submitter can pay before anything is signed or sent.
    ///
    /// The required amount is the configured minimum, raised to the ledger
    /// deposit when `payload` reserves one.
    async fn check_capacity(
        &self,
        submitter: &AccountAddress,
        payload: &TransactionPayload,
    ) -> Result<(), IdentityError> {
        let available = bounded(
            self.config.query_timeout(),
            format!("querying balance of {}", submitter),
            self.ledger.free_balance(submitter),
        )
        .await?;
        let mut required = u128::from(self.config.minimum_balance);
        if payload.reserves_deposit() {
            let deposit = bounded(
                self.config.query_timeout(),
                "querying the ledger deposit".to_string(),
                self.ledger.deposit(),
            )
            .await?;
            required = required.max(deposit);
        }
        if available < required {
            tracing::warn!(
                submitter = %submitter,
                available,
                required,
                "submitter cannot cover the transaction"
            );
            return Err(IdentityError::InsufficientResources {
                available,
                required,
            });
        }
        Ok(())
    }

    async fn submit(
        &self,
        unsigned: UnsignedTransaction,
        submitter: &AccountAddress,
        signer: &dyn Signer,
    ) -> Result<Receipt, IdentityError> {
        if self.config.capacity_check {
            self.check_capacity(submitter, &unsigned.payload).await?;
        }

        let mut state = RegistrationState::Unsigned;
        let payload = unsigned.signing_payload()?;
        let output = signer
            .sign(&payload)
            .await
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        state = advance(state, RegistrationEvent::Sign)?;

        let signed = unsigned.into_signed(output);
        let did = signed.payload.did().to_string();
        state = advance(state, RegistrationEvent::Submit)?;

        let outcome = match tokio::time::timeout(
            self.config.finality_timeout(),
            self.ledger.submit(signed),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(did = %did, state = %state, "finality not reached in time");
                return Err(IdentityError::Timeout(format!(
                    "waiting for finality of a transaction for {}",
                    did
                )));
            }
        };

        match outcome {
            Ok(TxOutcome::Finalized {
                block_number,
                tx_hash,
                ..
            }) => {
                advance(state, RegistrationEvent::Finalize)?;
                Ok(Receipt {
                    block_number,
                    tx_hash,
                })
            }
            Ok(TxOutcome::Rejected { reason }) | Err(LedgerError::Rejected(reason)) => {
                advance(state, RegistrationEvent::Reject)?;
                tracing::warn!(did = %did, reason = %reason, "transaction rejected");
                Err(IdentityError::Rejected(reason))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn advance(
    state: RegistrationState,
    event: RegistrationEvent,
) -> Result<RegistrationState, IdentityError> {
    RegistrationStateMachine::transition(state, event)
        .map_err(|e| IdentityError::InvalidTransition(e.to_string()))
}

/// The full identifier a light document upgrades to.
pub fn upgraded_identifier(light: &Document) -> Option<FullIdentifier> {
    match light.identifier() {
        Identifier::Light(id) => Some(id.full_counterpart()),
        Identifier::Full(_) => None,
    }
}
