use ark_bn254::Fr;
use async_trait::async_trait;
use ethers::types::{H256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zksbt_crypto::keccak256;
use zksbt_types::{ClaimAddress, EthAddress, ZksbtError, ZksbtResult};

use super::types::{EventCursor, EventPage, MemberInserted, MintRequest, Pool, TxReceipt};
use super::Ledger;
use crate::addressing::{claim_address, PoolKey};
use crate::authority::certificate_message;
use crate::group::IncrementalMerkleTree;
use crate::identity::{CredentialBinding, LeafScheme};
use crate::proof::{unpack_proof, FlatProof, VerificationKey, Verifier};
use crate::signer::recover_signer;

pub const REVERT_ALREADY_MINTED: &str = "zksbt exist!";
pub const REVERT_CLAIM_COLLISION: &str = "collision of zkAddress";
const REVERT_INVALID_CERTIFICATE: &str = "invalid certificate";
const REVERT_NULLIFIER_USED: &str = "nullifier already used";
const REVERT_INVALID_PROOF: &str = "invalid proof";
const REVERT_POOL_NOT_FOUND: &str = "pool not found";

const DEFAULT_PAGE_SIZE: usize = 100;

fn revert(reason: &str) -> ZksbtError {
    ZksbtError::LedgerRevert(reason.to_string())
}

struct PoolState {
    id: U256,
    salt: Fr,
    tree: IncrementalMerkleTree,
    holders: HashSet<Fr>,
    nullifiers: HashSet<Fr>,
}

#[derive(Default)]
struct LedgerState {
    pools: HashMap<PoolKey, PoolState>,
    ids: HashMap<U256, PoolKey>,
    events: Vec<MemberInserted>,
    minted: HashSet<U256>,
    claims: HashMap<ClaimAddress, Fr>,
    block: u64,
}

impl LedgerState {
    fn pool_mut(&mut self, key: &PoolKey) -> ZksbtResult<&mut PoolState> {
        self.pools
            .get_mut(key)
            .ok_or_else(|| revert(REVERT_POOL_NOT_FOUND))
    }

    fn seal(&mut self) -> TxReceipt {
        self.block += 1;
        TxReceipt {
            tx_hash: H256::from(keccak256(&self.block.to_be_bytes())),
            block_number: Some(self.block),
        }
    }
}

/// Registry contract semantics held in process: issuer-checked mints, one
/// tree per pool, a global member-inserted log and per-pool nullifier sets.
/// Proofs are checked against `[root, nullifierHash, salt]`.
pub struct InMemoryLedger {
    issuer: EthAddress,
    scheme: LeafScheme,
    depth: usize,
    verifier: Arc<dyn Verifier>,
    vk: VerificationKey,
    page_size: usize,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(
        issuer: EthAddress,
        scheme: LeafScheme,
        depth: usize,
        verifier: Arc<dyn Verifier>,
        vk: VerificationKey,
    ) -> Self {
        Self {
            issuer,
            scheme,
            depth,
            verifier,
            vk,
            page_size: DEFAULT_PAGE_SIZE,
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn issuer(&self) -> EthAddress {
        self.issuer
    }

    pub fn scheme(&self) -> LeafScheme {
        self.scheme
    }

    pub async fn add_pool(&self, key: PoolKey, salt: Fr) -> ZksbtResult<Pool> {
        key.attribute.validate_for(key.category)?;
        let mut state = self.state.write().await;
        if let Some(existing) = state.pools.get(&key) {
            return Err(ZksbtError::Config(format!(
                "Pool {} already exists with id {}",
                key, existing.id
            )));
        }

        let id = U256::from(state.pools.len() + 1);
        let tree = IncrementalMerkleTree::new(self.depth)?;
        let pool = Pool {
            id,
            root: tree.root(),
            salt,
            depth: self.depth,
        };
        state.ids.insert(id, key.clone());
        state.pools.insert(
            key.clone(),
            PoolState {
                id,
                salt,
                tree,
                holders: HashSet::new(),
                nullifiers: HashSet::new(),
            },
        );
        info!("Created pool {} with id {}", key, id);
        Ok(pool)
    }

    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    pub async fn is_nullifier_spent(&self, key: &PoolKey, nullifier_hash: &Fr) -> bool {
        self.state
            .read()
            .await
            .pools
            .get(key)
            .is_some_and(|p| p.nullifiers.contains(nullifier_hash))
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn pool(&self, key: &PoolKey) -> ZksbtResult<Pool> {
        let state = self.state.read().await;
        let pool = state
            .pools
            .get(key)
            .ok_or_else(|| revert(REVERT_POOL_NOT_FOUND))?;
        Ok(Pool {
            id: pool.id,
            root: pool.tree.root(),
            salt: pool.salt,
            depth: pool.tree.depth(),
        })
    }

    async fn merkle_root(&self, pool_id: U256) -> ZksbtResult<Fr> {
        let state = self.state.read().await;
        state
            .ids
            .get(&pool_id)
            .and_then(|key| state.pools.get(key))
            .map(|pool| pool.tree.root())
            .ok_or_else(|| revert(REVERT_POOL_NOT_FOUND))
    }

    async fn member_inserted_events(
        &self,
        _key: &PoolKey,
        cursor: EventCursor,
    ) -> ZksbtResult<EventPage> {
        let state = self.state.read().await;
        let start = (cursor.0 as usize).min(state.events.len());
        let end = (start + self.page_size).min(state.events.len());
        Ok(EventPage {
            events: state.events[start..end].to_vec(),
            next: (end < state.events.len()).then_some(EventCursor(end as u64)),
        })
    }

    async fn mint(&self, request: MintRequest) -> ZksbtResult<TxReceipt> {
        let message = certificate_message(
            &request.claimant,
            &request.pool,
            request.sbt_id,
            request.verify_timestamp,
        );
        match recover_signer(message.as_bytes(), &request.signature) {
            Ok(signer) if signer == self.issuer => {}
            _ => return Err(revert(REVERT_INVALID_CERTIFICATE)),
        }

        let binding = CredentialBinding::new(
            request.sbt_id,
            request.verify_timestamp,
            request.pool.attribute.clone(),
        );
        let leaf = self
            .scheme
            .identity_commitment(request.claimant, Some(&binding))?;
        let token = request.pool.descriptor(request.sbt_id).pack();
        let address = claim_address(&request.claimant);

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Some(existing) = state.claims.get(&address) {
            if *existing != request.claimant {
                warn!("Mint rejected: claim address {} collides", address);
                return Err(revert(REVERT_CLAIM_COLLISION));
            }
        }
        if state.minted.contains(&token) {
            return Err(revert(REVERT_ALREADY_MINTED));
        }

        let pool = state.pool_mut(&request.pool)?;
        if pool.holders.contains(&request.claimant) {
            return Err(revert(REVERT_ALREADY_MINTED));
        }
        let leaf_index = pool.tree.insert(leaf)?;
        pool.holders.insert(request.claimant);
        let pool_id = pool.id;

        state.minted.insert(token);
        state.claims.insert(address, request.claimant);
        state.events.push(MemberInserted {
            pool_id,
            token,
            leaf,
            leaf_index: leaf_index as u64,
        });

        debug!(
            "Minted sbt {} into pool {} at leaf {}",
            request.sbt_id, request.pool, leaf_index
        );
        Ok(state.seal())
    }

    async fn verify(
        &self,
        key: &PoolKey,
        nullifier_hash: Fr,
        proof: &FlatProof,
    ) -> ZksbtResult<TxReceipt> {
        let signals = {
            let state = self.state.read().await;
            let pool = state
                .pools
                .get(key)
                .ok_or_else(|| revert(REVERT_POOL_NOT_FOUND))?;
            if pool.nullifiers.contains(&nullifier_hash) {
                return Err(revert(REVERT_NULLIFIER_USED));
            }
            vec![pool.tree.root(), nullifier_hash, pool.salt]
        };

        let native = unpack_proof(proof);
        let verifier = self.verifier.clone();
        let vk = self.vk.clone();
        let valid = tokio::task::spawn_blocking(move || verifier.verify(&vk, &signals, &native))
            .await
            .map_err(|e| ZksbtError::Internal(format!("Verifier task failed: {}", e)))??;
        if !valid {
            return Err(revert(REVERT_INVALID_PROOF));
        }

        let mut state = self.state.write().await;
        if !state.pool_mut(key)?.nullifiers.insert(nullifier_hash) {
            return Err(revert(REVERT_NULLIFIER_USED));
        }
        info!("Accepted membership proof for pool {}", key);
        Ok(state.seal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::Category;
    use crate::proof::NativeProof;
    use crate::signer::{LocalSigner, MessageSigner};

    struct RejectAll;

    impl Verifier for RejectAll {
        fn verify(&self, _: &VerificationKey, _: &[Fr], _: &NativeProof) -> ZksbtResult<bool> {
            Ok(false)
        }
    }

    fn vk() -> VerificationKey {
        VerificationKey {
            protocol: "groth16".into(),
            curve: "bn128".into(),
            n_public: 3,
            vk_alpha_1: Vec::new(),
            vk_beta_2: Vec::new(),
            vk_gamma_2: Vec::new(),
            vk_delta_2: Vec::new(),
            ic: Vec::new(),
        }
    }

    fn pool() -> PoolKey {
        PoolKey::pomp(Category::POMP_ETH, 1).unwrap()
    }

    fn rejecting_ledger(issuer: EthAddress) -> InMemoryLedger {
        InMemoryLedger::new(issuer, LeafScheme::Raw, 4, Arc::new(RejectAll), vk())
    }

    async fn mint(ledger: &InMemoryLedger, issuer: &LocalSigner, claimant: u64, id: u128) {
        let claimant = Fr::from(claimant);
        let message = certificate_message(&claimant, &pool(), id, 42);
        let signature = issuer.sign_message(message.as_bytes()).await.unwrap();
        ledger
            .mint(MintRequest {
                claimant,
                pool: pool(),
                sbt_id: id,
                verify_timestamp: 42,
                signature,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_pool_reverts() {
        let ledger = rejecting_ledger(EthAddress::zero());
        let err = ledger.pool(&pool()).await.unwrap_err();
        assert!(matches!(err, ZksbtError::LedgerRevert(ref r) if r == REVERT_POOL_NOT_FOUND));
        assert!(ledger.merkle_root(U256::from(9u64)).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_pool_rejected() {
        let ledger = rejecting_ledger(EthAddress::zero());
        ledger.add_pool(pool(), Fr::from(1u64)).await.unwrap();
        assert!(ledger.add_pool(pool(), Fr::from(2u64)).await.is_err());
    }

    #[tokio::test]
    async fn test_events_are_paged_in_order() {
        let issuer = LocalSigner::random().unwrap();
        let ledger = rejecting_ledger(issuer.address()).with_page_size(2);
        let created = ledger.add_pool(pool(), Fr::from(1u64)).await.unwrap();
        for i in 1..=5u64 {
            mint(&ledger, &issuer, i, i as u128).await;
        }

        let mut cursor = Some(EventCursor::start());
        let mut leaves = Vec::new();
        let mut pages = 0;
        while let Some(c) = cursor {
            let page = ledger.member_inserted_events(&pool(), c).await.unwrap();
            leaves.extend(page.events.iter().map(|e| e.leaf));
            cursor = page.next;
            pages += 1;
        }
        assert_eq!(pages, 3);
        assert_eq!(leaves, (1..=5u64).map(Fr::from).collect::<Vec<_>>());

        let state = ledger.pool(&pool()).await.unwrap();
        assert_eq!(ledger.merkle_root(created.id).await.unwrap(), state.root);
        assert_ne!(state.root, created.root);
    }

    #[tokio::test]
    async fn test_rejected_proof_leaves_nullifier_unspent() {
        let ledger = rejecting_ledger(EthAddress::zero());
        ledger.add_pool(pool(), Fr::from(1u64)).await.unwrap();

        let err = ledger
            .verify(&pool(), Fr::from(5u64), &FlatProof::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ZksbtError::LedgerRevert(ref r) if r == REVERT_INVALID_PROOF));
        assert!(!ledger.is_nullifier_spent(&pool(), &Fr::from(5u64)).await);
    }
}
