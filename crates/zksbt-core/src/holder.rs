//! Holder side of the protocol: claim, mint through the issuer, prove
//! membership against the latest root, submit.

use ark_bn254::Fr;
use std::sync::Arc;
use tracing::{info, warn};
use zksbt_types::{EcdsaSignature, ZksbtError, ZksbtResult};

use crate::addressing::PoolKey;
use crate::authority::{claim_message, Certificate, CertificateAuthority, MintOutcome};
use crate::config::{ZksbtConfig, DEFAULT_MAX_RETRIES};
use crate::group::{GroupReconstructor, MerkleGroup};
use crate::identity::{CredentialBinding, Identity};
use crate::ledger::{Ledger, Pool, TxReceipt};
use crate::proof::{
    CircuitProfile, IdentityProfile, IdentityProof, MembershipProof, ProofPipeline, Prover,
    Verifier,
};
use crate::signer::MessageSigner;

pub struct CredentialHolder<L: Ledger + ?Sized, P: Prover, C: CircuitProfile> {
    identity: Identity,
    ledger: Arc<L>,
    pipeline: ProofPipeline<P, C>,
    max_root_retries: u32,
}

impl<L: Ledger + ?Sized, P: Prover, C: CircuitProfile> CredentialHolder<L, P, C> {
    pub fn new(identity: Identity, ledger: Arc<L>, pipeline: ProofPipeline<P, C>) -> Self {
        Self {
            identity,
            ledger,
            pipeline,
            max_root_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Membership circuit and root retry bound taken from `config`.
    pub fn from_config(
        identity: Identity,
        ledger: Arc<L>,
        prover: P,
        verifier: Arc<dyn Verifier>,
        config: &ZksbtConfig,
    ) -> Self {
        let pipeline = ProofPipeline::new(prover, config.prover.artifact(), verifier);
        Self::new(identity, ledger, pipeline)
            .with_max_root_retries(config.authority.max_root_retries)
    }

    pub fn with_max_root_retries(mut self, retries: u32) -> Self {
        self.max_root_retries = retries;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn commitment(&self) -> Fr {
        self.identity.commitment()
    }

    pub async fn claim_signature<S: MessageSigner + ?Sized>(
        &self,
        wallet: &S,
        pool: &PoolKey,
    ) -> ZksbtResult<EcdsaSignature> {
        let message = claim_message(&self.commitment(), pool);
        wallet.sign_message(message.as_bytes()).await
    }

    pub async fn request_certificate<S: MessageSigner + ?Sized>(
        &self,
        authority: &CertificateAuthority,
        wallet: &S,
        pool: &PoolKey,
    ) -> ZksbtResult<Certificate> {
        let signature = self.claim_signature(wallet, pool).await?;
        authority
            .issue_certificate(&self.commitment(), pool, &signature)
            .await
    }

    pub async fn mint<S: MessageSigner + ?Sized>(
        &self,
        authority: &CertificateAuthority,
        wallet: &S,
        pool: &PoolKey,
    ) -> ZksbtResult<MintOutcome> {
        let signature = self.claim_signature(wallet, pool).await?;
        authority
            .mint_with_certificate(&*self.ledger, &self.commitment(), pool, &signature)
            .await
    }

    /// Rebuilds the pool's tree at its current root. A root the event log
    /// cannot reach is refetched up to `max_root_retries` times.
    pub async fn reconstruct(&self, key: &PoolKey) -> ZksbtResult<(Pool, MerkleGroup)> {
        let mut pool = self.ledger.pool(key).await?;
        let reconstructor = GroupReconstructor::new(&*self.ledger);
        let mut attempt = 0;

        loop {
            match reconstructor.reconstruct(key, pool.depth, pool.root).await {
                Ok(group) => return Ok((pool, group)),
                Err(e @ ZksbtError::RootMismatch { .. }) if attempt < self.max_root_retries => {
                    attempt += 1;
                    warn!("{}; refetching root (attempt {})", e, attempt);
                    pool.root = self.ledger.merkle_root(pool.id).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Membership proof for `key` against the latest root. Pools whose
    /// leaves are bound to a credential need that credential's `binding`.
    pub async fn prove_membership(
        &self,
        key: &PoolKey,
        binding: Option<&CredentialBinding>,
    ) -> ZksbtResult<MembershipProof> {
        let (pool, group) = self.reconstruct(key).await?;
        let job = self
            .pipeline
            .build_circuit_inputs(&self.identity, &group, pool.salt, binding)?;
        self.pipeline.prove(&job).await
    }

    /// Identity proof under `key`'s salt, for requesting a proof key from the
    /// backend. Runs on the identity circuit, not this holder's pipeline.
    pub async fn prove_identity<Q: Prover>(
        &self,
        identity_pipeline: &ProofPipeline<Q, IdentityProfile>,
        key: &PoolKey,
    ) -> ZksbtResult<IdentityProof> {
        let pool = self.ledger.pool(key).await?;
        let job = identity_pipeline.build_identity_inputs(&self.identity, pool.salt)?;
        identity_pipeline.prove_identity(&job).await
    }

    pub async fn submit_proof(
        &self,
        key: &PoolKey,
        proof: &MembershipProof,
    ) -> ZksbtResult<TxReceipt> {
        let receipt = self
            .ledger
            .verify(key, proof.nullifier_hash, &proof.proof)
            .await?;
        info!("Proof for pool {} accepted in {:?}", key, receipt.tx_hash);
        Ok(receipt)
    }
}
