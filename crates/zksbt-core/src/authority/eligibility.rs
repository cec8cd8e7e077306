use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use zksbt_types::{EthAddress, ZksbtResult};

use crate::addressing::PoolKey;

/// External data source deciding who may hold a credential.
#[async_trait]
pub trait EligibilityPolicy: Send + Sync {
    async fn check_eligible(&self, wallet: &EthAddress, pool: &PoolKey) -> ZksbtResult<bool>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl EligibilityPolicy for AllowAll {
    async fn check_eligible(&self, _wallet: &EthAddress, _pool: &PoolKey) -> ZksbtResult<bool> {
        Ok(true)
    }
}

/// Static per-pool allow list.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    entries: HashMap<PoolKey, HashSet<EthAddress>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, pool: PoolKey, wallet: EthAddress) -> Self {
        self.entries.entry(pool).or_default().insert(wallet);
        self
    }
}

#[async_trait]
impl EligibilityPolicy for AllowList {
    async fn check_eligible(&self, wallet: &EthAddress, pool: &PoolKey) -> ZksbtResult<bool> {
        Ok(self
            .entries
            .get(pool)
            .is_some_and(|wallets| wallets.contains(wallet)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::Category;

    #[tokio::test]
    async fn test_allow_list_is_per_pool() {
        let wallet = EthAddress::from_bytes([1u8; 20]);
        let eth_100 = PoolKey::pomp(Category::POMP_ETH, 100).unwrap();
        let eth_10 = PoolKey::pomp(Category::POMP_ETH, 10).unwrap();
        let policy = AllowList::new().allow(eth_100.clone(), wallet);

        assert!(policy.check_eligible(&wallet, &eth_100).await.unwrap());
        assert!(!policy.check_eligible(&wallet, &eth_10).await.unwrap());
        assert!(!policy
            .check_eligible(&EthAddress::zero(), &eth_100)
            .await
            .unwrap());
    }
}
