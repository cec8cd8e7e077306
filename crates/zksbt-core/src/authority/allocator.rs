use ark_bn254::Fr;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zksbt_types::{ClaimAddress, ZksbtError, ZksbtResult};

use crate::addressing::{claim_address, PoolKey};

/// Hands out credential ids. Ids are unique within a pool and never reused.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Allocates the next id in `pool` for `commitment`, binding the
    /// commitment's claim address in the same critical section.
    async fn allocate(&self, pool: &PoolKey, commitment: &Fr) -> ZksbtResult<u128>;

    /// Records an id already used outside this allocator, e.g. one the
    /// ledger reported as minted.
    async fn mark_taken(&self, pool: &PoolKey, id: u128);
}

#[derive(Default)]
struct AllocatorState {
    next: HashMap<PoolKey, u128>,
    taken: HashMap<PoolKey, HashSet<u128>>,
    claims: HashMap<ClaimAddress, Fr>,
}

/// Per-pool monotonic counters and the claim-address registry behind one
/// async mutex.
#[derive(Default)]
pub struct SerializedAllocator {
    state: Mutex<AllocatorState>,
}

impl SerializedAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdAllocator for SerializedAllocator {
    async fn allocate(&self, pool: &PoolKey, commitment: &Fr) -> ZksbtResult<u128> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let address = claim_address(commitment);
        if let Some(existing) = state.claims.get(&address) {
            if existing != commitment {
                warn!("Claim address {} already bound to another commitment", address);
                return Err(ZksbtError::ClaimAddressCollision {
                    address: address.to_hex(),
                });
            }
        }

        let counter = state.next.entry(pool.clone()).or_insert(1);
        let id = *counter;
        *counter = id
            .checked_add(1)
            .ok_or_else(|| ZksbtError::Internal(format!("id space of pool {} exhausted", pool)))?;

        let taken = state.taken.entry(pool.clone()).or_default();
        if !taken.insert(id) {
            warn!("Id {} in pool {} is already taken", id, pool);
            return Err(ZksbtError::IdAllocationConflict {
                pool: pool.to_string(),
                id,
            });
        }

        state.claims.insert(address, *commitment);
        debug!("Allocated id {} in pool {}", id, pool);
        Ok(id)
    }

    async fn mark_taken(&self, pool: &PoolKey, id: u128) {
        let mut state = self.state.lock().await;
        state.taken.entry(pool.clone()).or_default().insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::Category;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn pool() -> PoolKey {
        PoolKey::pomp(Category::POMP_ETH, 100).unwrap()
    }

    /// Reads, yields, then writes: the shape of an allocator that awaits
    /// between loading and storing its counter.
    struct UnserializedCounter {
        next: std::sync::Mutex<u128>,
    }

    impl UnserializedCounter {
        async fn allocate(&self) -> u128 {
            let current = *self.next.lock().unwrap();
            tokio::task::yield_now().await;
            *self.next.lock().unwrap() = current + 1;
            current
        }
    }

    #[tokio::test]
    async fn test_unserialized_counter_duplicates_ids() {
        let counter = UnserializedCounter {
            next: std::sync::Mutex::new(1),
        };
        let (a, b) = tokio::join!(counter.allocate(), counter.allocate());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_serialized_allocator_never_duplicates() {
        let allocator = SerializedAllocator::new();
        let pool = pool();
        let (c1, c2) = (Fr::from(1u64), Fr::from(2u64));
        let (a, b) = tokio::join!(allocator.allocate(&pool, &c1), allocator.allocate(&pool, &c2));
        assert_ne!(a.unwrap(), b.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_allocations_are_unique() {
        let allocator = Arc::new(SerializedAllocator::new());
        let mut handles = Vec::new();
        for i in 0..64u64 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                allocator.allocate(&pool(), &Fr::from(i + 1)).await
            }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap().unwrap()));
        }
        assert_eq!(ids.len(), 64);
    }

    #[tokio::test]
    async fn test_pools_count_independently() {
        let allocator = SerializedAllocator::new();
        let other = PoolKey::pomp(Category::POMP_BNB, 100).unwrap();
        assert_eq!(allocator.allocate(&pool(), &Fr::from(1u64)).await.unwrap(), 1);
        assert_eq!(allocator.allocate(&other, &Fr::from(1u64)).await.unwrap(), 1);
        assert_eq!(allocator.allocate(&pool(), &Fr::from(2u64)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_taken_id_conflicts_then_advances() {
        let allocator = SerializedAllocator::new();
        allocator.mark_taken(&pool(), 1).await;

        let err = allocator
            .allocate(&pool(), &Fr::from(5u64))
            .await
            .unwrap_err();
        assert!(matches!(err, ZksbtError::IdAllocationConflict { id: 1, .. }));
        assert!(err.is_retryable());

        assert_eq!(allocator.allocate(&pool(), &Fr::from(5u64)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_claim_address_collision() {
        let allocator = SerializedAllocator::new();
        let low = Fr::from(0xabcdu64);
        let mut high_bit = [0u8; 32];
        high_bit[1] = 1;
        let high = low + zksbt_crypto::fr_from_be_bytes_mod_order(&high_bit);

        allocator.allocate(&pool(), &low).await.unwrap();
        // Same commitment again is not a collision.
        allocator.allocate(&pool(), &low).await.unwrap();

        let err = allocator.allocate(&pool(), &high).await.unwrap_err();
        assert!(matches!(err, ZksbtError::ClaimAddressCollision { .. }));
    }
}
