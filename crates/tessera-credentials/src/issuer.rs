use tessera_core::{AccountAddress, FullIdentifier, Identifier, KeyScheme, RegistrarConfig};
use tessera_identity::{Document, LedgerRegistrar, Receipt};
use tessera_ledger::{LedgerHandle, Signer};

use crate::credential::{to_hex, Claim, Credential, CredentialProof, PROOF_TYPE};
use crate::error::CredentialError;

/// Attester side: builds, signs and anchors credentials for one full DID.
pub struct CredentialIssuer {
    registrar: LedgerRegistrar,
    attester: FullIdentifier,
    verification_method: String,
    submitter: AccountAddress,
}

impl CredentialIssuer {
    /// Issue on behalf of the full DID described by `attester`, which must
    /// carry an assertion key.
    pub fn new(
        ledger: LedgerHandle,
        config: RegistrarConfig,
        attester: &Document,
        submitter: AccountAddress,
    ) -> Result<Self, CredentialError> {
        let did = match attester.identifier() {
            Identifier::Full(full) => full.clone(),
            Identifier::Light(light) => {
                return Err(CredentialError::IssuanceFailed(format!(
                    "{} is a light DID and cannot attest",
                    light
                )))
            }
        };
        let assertion_key = attester.assertion_method().first().ok_or_else(|| {
            CredentialError::IssuanceFailed(format!("{} has no assertion key", did))
        })?;
        let verification_method = format!("{}{}", did, assertion_key.id);

        Ok(Self {
            registrar: LedgerRegistrar::new(ledger, config),
            attester: did,
            verification_method,
            submitter,
        })
    }

    pub fn attester(&self) -> &FullIdentifier {
        &self.attester
    }

    /// DID URL of the key credentials are signed with.
    pub fn verification_method(&self) -> &str {
        &self.verification_method
    }

    /// Attest `contents` about `owner` and anchor the root hash on the
    /// ledger. `signer` must hold the attester's assertion key; it signs
    /// both the root hash and the anchoring transaction.
    pub async fn issue(
        &self,
        ctype_hash: [u8; 32],
        contents: serde_json::Value,
        owner: &Identifier,
        signer: &dyn Signer,
    ) -> Result<Credential, CredentialError> {
        let claim = Claim::new(ctype_hash, contents, owner);
        let mut credential = Credential::from_claim(claim, &self.attester.clone().into())?;
        let root_hash = credential.root_hash_bytes()?;

        let output = signer
            .sign(&root_hash)
            .await
            .map_err(|e| CredentialError::IssuanceFailed(e.to_string()))?;
        if output.scheme != KeyScheme::Ed25519 {
            return Err(CredentialError::IssuanceFailed(format!(
                "assertion signer produced a {} signature",
                output.scheme
            )));
        }
        credential.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.to_string(),
            verification_method: self.verification_method.clone(),
            signature: to_hex(&output.signature),
        });

        let receipt = self
            .registrar
            .add_attestation(&self.attester, root_hash, ctype_hash, &self.submitter, signer)
            .await?;
        tracing::info!(
            attester = %self.attester,
            owner = %owner,
            root_hash = %credential.root_hash,
            block_number = receipt.block_number,
            "credential attested"
        );
        Ok(credential)
    }

    /// Revoke a credential this attester issued.
    pub async fn revoke(
        &self,
        credential: &Credential,
        signer: &dyn Signer,
    ) -> Result<Receipt, CredentialError> {
        if credential.attester != self.attester.uri() {
            return Err(CredentialError::AttestationMismatch(format!(
                "credential was attested by {}, not {}",
                credential.attester, self.attester
            )));
        }
        let root_hash = credential.root_hash_bytes()?;
        let receipt = self
            .registrar
            .revoke_attestation(&self.attester, root_hash, &self.submitter, signer)
            .await?;
        tracing::info!(
            attester = %self.attester,
            root_hash = %credential.root_hash,
            "credential revoked"
        );
        Ok(receipt)
    }
}
