use ark_bn254::Fr;
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;
use zksbt_types::{EcdsaSignature, EthAddress, ZksbtError, ZksbtResult, ECDSA_SIGNATURE_SIZE};

use super::allocator::{IdAllocator, SerializedAllocator};
use super::certificate::{certificate_message, claim_message, Certificate};
use super::eligibility::EligibilityPolicy;
use crate::addressing::PoolKey;
use crate::config::{
    AuthorityConfig, DEFAULT_MAX_PENDING_CERTIFICATES, DEFAULT_MAX_RETRIES,
    DEFAULT_PENDING_TTL_SECS,
};
use crate::ledger::{Ledger, MintRequest, TxReceipt, REVERT_ALREADY_MINTED};
use crate::signer::{recover_signer, LocalSigner, MessageSigner};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuanceState {
    ClaimReceived,
    SignatureVerified,
    EligibilityChecked,
    Issued,
    Rejected,
}

impl fmt::Display for IssuanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuanceState::ClaimReceived => write!(f, "claim-received"),
            IssuanceState::SignatureVerified => write!(f, "signature-verified"),
            IssuanceState::EligibilityChecked => write!(f, "eligibility-checked"),
            IssuanceState::Issued => write!(f, "issued"),
            IssuanceState::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MintOutcome {
    pub certificate: Certificate,
    /// `None` when the claimant was not eligible and nothing was submitted.
    pub receipt: Option<TxReceipt>,
}

struct PendingCertificate {
    claimant: Fr,
    pool: PoolKey,
    certificate: Certificate,
    seq: u64,
}

impl PendingCertificate {
    fn expired(&self, now_ms: u64, ttl: Duration) -> bool {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        now_ms.saturating_sub(self.certificate.verify_timestamp) >= ttl_ms
    }
}

/// Issued but not yet minted, keyed by the claim signature.
#[derive(Default)]
struct PendingCache {
    entries: HashMap<[u8; ECDSA_SIGNATURE_SIZE], PendingCertificate>,
    next_seq: u64,
}

impl PendingCache {
    fn evict_expired(&mut self, now_ms: u64, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, p| !p.expired(now_ms, ttl));
        before - self.entries.len()
    }

    /// Drops the oldest entries until there is room for one more.
    fn make_room(&mut self, capacity: usize) {
        while !self.entries.is_empty() && self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, p)| p.seq)
                .map(|(key, _)| *key);
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub struct CertificateAuthority {
    signer: Arc<dyn MessageSigner>,
    policy: Arc<dyn EligibilityPolicy>,
    allocator: Arc<dyn IdAllocator>,
    pending: RwLock<PendingCache>,
    pending_ttl: Duration,
    max_pending: usize,
    max_allocation_retries: u32,
}

impl CertificateAuthority {
    pub fn new(
        signer: Arc<dyn MessageSigner>,
        policy: Arc<dyn EligibilityPolicy>,
        allocator: Arc<dyn IdAllocator>,
    ) -> Self {
        Self {
            signer,
            policy,
            allocator,
            pending: RwLock::new(PendingCache::default()),
            pending_ttl: Duration::from_secs(DEFAULT_PENDING_TTL_SECS),
            max_pending: DEFAULT_MAX_PENDING_CERTIFICATES,
            max_allocation_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Unminted certificates older than `ttl` are no longer returned for a
    /// repeated claim; at most `max` are kept.
    pub fn with_pending_limits(mut self, ttl: Duration, max: usize) -> Self {
        self.pending_ttl = ttl;
        self.max_pending = max;
        self
    }

    pub fn with_max_allocation_retries(mut self, retries: u32) -> Self {
        self.max_allocation_retries = retries;
        self
    }

    /// Issuer key from the environment variable named in `config`.
    pub fn from_config(
        config: &AuthorityConfig,
        policy: Arc<dyn EligibilityPolicy>,
    ) -> ZksbtResult<Self> {
        let key = Zeroizing::new(std::env::var(&config.issuer_key_env).map_err(|_| {
            ZksbtError::Config(format!(
                "Issuer key variable {} is not set",
                config.issuer_key_env
            ))
        })?);
        let signer = LocalSigner::from_hex(&key)?;
        info!("Certificate authority signing as {}", signer.address());

        Ok(Self::new(Arc::new(signer), policy, Arc::new(SerializedAllocator::new()))
            .with_max_allocation_retries(config.max_allocation_retries)
            .with_pending_limits(config.pending_ttl(), config.max_pending_certificates))
    }

    pub fn issuer_address(&self) -> EthAddress {
        self.signer.address()
    }

    fn transition(&self, pool: &PoolKey, state: IssuanceState) {
        debug!("Issuance for pool {}: {}", pool, state);
    }

    /// Wallet that signed the claim message for `(claimant, pool)`.
    pub fn verify_claim(
        &self,
        claimant: &Fr,
        pool: &PoolKey,
        signature: &EcdsaSignature,
    ) -> ZksbtResult<EthAddress> {
        let message = claim_message(claimant, pool);
        recover_signer(message.as_bytes(), signature)
            .map_err(|e| ZksbtError::InvalidSignature(format!("claim signature: {}", e)))
    }

    pub async fn check_eligible(&self, wallet: &EthAddress, pool: &PoolKey) -> ZksbtResult<bool> {
        self.policy.check_eligible(wallet, pool).await
    }

    /// Allocates an id, re-allocating under the lock on a conflict.
    pub async fn allocate_id(&self, pool: &PoolKey, claimant: &Fr) -> ZksbtResult<u128> {
        let mut attempt = 0;
        loop {
            match self.allocator.allocate(pool, claimant).await {
                Ok(id) => return Ok(id),
                Err(e @ ZksbtError::IdAllocationConflict { .. })
                    if attempt < self.max_allocation_retries =>
                {
                    attempt += 1;
                    warn!("{}; re-allocating (attempt {})", e, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn issue_certificate(
        &self,
        claimant: &Fr,
        pool: &PoolKey,
        signature: &EcdsaSignature,
    ) -> ZksbtResult<Certificate> {
        self.transition(pool, IssuanceState::ClaimReceived);
        pool.attribute.validate_for(pool.category)?;

        let wallet = self.verify_claim(claimant, pool, signature)?;
        self.transition(pool, IssuanceState::SignatureVerified);

        let key = signature.to_bytes();
        if let Some(pending) = self.pending.read().await.entries.get(&key) {
            let fresh = !pending.expired(now_ms(), self.pending_ttl);
            if fresh && pending.claimant == *claimant && pending.pool == *pool {
                debug!(
                    "Returning pending certificate {} for pool {}",
                    pending.certificate.sbt_id, pool
                );
                return Ok(pending.certificate.clone());
            }
        }

        if !self.check_eligible(&wallet, pool).await? {
            self.transition(pool, IssuanceState::Rejected);
            return Ok(Certificate::ineligible());
        }
        self.transition(pool, IssuanceState::EligibilityChecked);

        let sbt_id = self.allocate_id(pool, claimant).await?;
        let verify_timestamp = now_ms();
        let message = certificate_message(claimant, pool, sbt_id, verify_timestamp);
        let issuer_signature = self.signer.sign_message(message.as_bytes()).await?;

        let certificate = Certificate {
            eligible: true,
            sbt_id,
            verify_timestamp,
            signature: Some(issuer_signature),
        };
        {
            let mut pending = self.pending.write().await;
            let evicted = pending.evict_expired(verify_timestamp, self.pending_ttl);
            if evicted > 0 {
                debug!("Evicted {} expired pending certificates", evicted);
            }
            pending.make_room(self.max_pending);
            let seq = pending.next_seq;
            pending.next_seq += 1;
            pending.entries.insert(
                key,
                PendingCertificate {
                    claimant: *claimant,
                    pool: pool.clone(),
                    certificate: certificate.clone(),
                    seq,
                },
            );
        }

        self.transition(pool, IssuanceState::Issued);
        info!("Issued certificate for pool {} with sbt id {}", pool, sbt_id);
        Ok(certificate)
    }

    /// Drops the pending certificate for `claim_signature` once it has been
    /// spent; a later request with the same signature gets a fresh id.
    pub async fn consume(&self, claim_signature: &EcdsaSignature) -> Option<Certificate> {
        self.pending
            .write()
            .await
            .entries
            .remove(&claim_signature.to_bytes())
            .map(|p| p.certificate)
    }

    /// Forgets certificates past the pending TTL; returns how many went.
    pub async fn evict_expired(&self) -> usize {
        self.pending
            .write()
            .await
            .evict_expired(now_ms(), self.pending_ttl)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.entries.len()
    }

    /// Issues a certificate and submits the mint in one step.
    pub async fn mint_with_certificate<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        claimant: &Fr,
        pool: &PoolKey,
        claim_signature: &EcdsaSignature,
    ) -> ZksbtResult<MintOutcome> {
        let certificate = self.issue_certificate(claimant, pool, claim_signature).await?;
        let Some(signature) = certificate.signature else {
            return Ok(MintOutcome {
                certificate,
                receipt: None,
            });
        };

        let request = MintRequest {
            claimant: *claimant,
            pool: pool.clone(),
            sbt_id: certificate.sbt_id,
            verify_timestamp: certificate.verify_timestamp,
            signature,
        };
        match ledger.mint(request).await {
            Ok(receipt) => {
                self.consume(claim_signature).await;
                info!("Minted sbt {} in pool {}", certificate.sbt_id, pool);
                Ok(MintOutcome {
                    certificate,
                    receipt: Some(receipt),
                })
            }
            Err(ZksbtError::LedgerRevert(reason)) => {
                if reason.contains(REVERT_ALREADY_MINTED) {
                    warn!(
                        "Ledger reports sbt {} in pool {} as minted",
                        certificate.sbt_id, pool
                    );
                    self.allocator.mark_taken(pool, certificate.sbt_id).await;
                    self.consume(claim_signature).await;
                }
                Err(ZksbtError::LedgerRevert(reason))
            }
            Err(e) => Err(e),
        }
    }
}
