use ark_bn254::Fr;
use async_trait::async_trait;
use ethers::{
    contract::{abigen, ContractCall, ContractError},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionReceipt, H256, U256},
};
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;
use zksbt_types::{ZksbtError, ZksbtResult};

use super::types::{EventCursor, EventPage, MemberInserted, MintRequest, Pool, TxReceipt};
use super::Ledger;
use crate::addressing::PoolKey;
use crate::config::LedgerConfig;
use crate::field::{fr_to_u256, u256_to_fr};
use crate::proof::FlatProof;

abigen!(
    ZksbtRegistry,
    r#"[
        function pools(uint64 category, string attribute) external view returns (uint256 id, uint256 root, uint256 salt)
        function getMerkleTreeRoot(uint256 poolId) external view returns (uint256)
        function mint(uint256 identity, uint64 category, string attribute, uint128 sbtId, uint64 verifyTimestamp, bytes signature) external
        function verify(uint64 category, string attribute, uint256 nullifierHash, uint256[8] proof) external
        event MemberInserted(uint256 indexed poolId, uint256 token, uint256 leaf, uint256 leafIndex)
    ]"#
);

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

fn contract_error(context: &str, e: ContractError<Client>) -> ZksbtError {
    if let Some(reason) = e.decode_revert::<String>() {
        return ZksbtError::LedgerRevert(reason);
    }
    if e.is_revert() {
        return ZksbtError::LedgerRevert(format!("{}: execution reverted", context));
    }
    ZksbtError::Network(format!("{}: {}", context, e))
}

fn into_receipt(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|b| b.as_u64()),
    }
}

fn pool_topic(pool_id: U256) -> H256 {
    let mut bytes = [0u8; 32];
    pool_id.to_big_endian(&mut bytes);
    H256::from(bytes)
}

/// The registry contract over JSON-RPC. Event cursors are block numbers;
/// one page covers `event_page_size` blocks.
pub struct ContractLedger {
    registry: ZksbtRegistry<Client>,
    client: Arc<Client>,
    depth: usize,
    page_size: u64,
    deployment_block: u64,
}

impl ContractLedger {
    pub async fn connect(config: &LedgerConfig, operator_key: &str) -> ZksbtResult<Self> {
        let address: Address = config
            .contract_address
            .as_deref()
            .ok_or_else(|| ZksbtError::Config("Registry contract address is not set".into()))?
            .parse()
            .map_err(|e| ZksbtError::Config(format!("Invalid contract address: {}", e)))?;

        info!("Connecting to RPC: {}", config.rpc_url);
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ZksbtError::Network(format!("Failed to create provider: {}", e)))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ZksbtError::Network(format!("Failed to get chain ID: {}", e)))?;
        if chain_id.as_u64() != config.chain_id {
            return Err(ZksbtError::Network(format!(
                "Chain ID mismatch: expected {}, got {}",
                config.chain_id,
                chain_id.as_u64()
            )));
        }

        let wallet: LocalWallet = operator_key
            .parse()
            .map_err(|e| ZksbtError::InvalidKey(format!("Invalid operator key: {}", e)))?;
        let wallet = wallet.with_chain_id(config.chain_id);
        info!("Operator wallet: {:?}", wallet.address());

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self {
            registry: ZksbtRegistry::new(address, client.clone()),
            client,
            depth: config.tree_depth,
            page_size: config.event_page_size.max(1),
            deployment_block: config.deployment_block,
        })
    }

    /// Operator key from the environment variable named in `config`.
    pub async fn from_config(config: &LedgerConfig) -> ZksbtResult<Self> {
        let key = Zeroizing::new(std::env::var(&config.operator_key_env).map_err(|_| {
            ZksbtError::Config(format!(
                "Operator key variable {} is not set",
                config.operator_key_env
            ))
        })?);
        Self::connect(config, &key).await
    }

    async fn pool_id(&self, key: &PoolKey) -> ZksbtResult<U256> {
        let (id, _, _) = self
            .registry
            .pools(key.category.0, key.attribute.to_string())
            .call()
            .await
            .map_err(|e| contract_error("pools", e))?;
        Ok(id)
    }

    async fn submit(
        &self,
        call: ContractCall<Client, ()>,
        context: &str,
    ) -> ZksbtResult<TxReceipt> {
        let pending = call.send().await.map_err(|e| contract_error(context, e))?;
        let receipt = pending
            .await
            .map_err(|e| ZksbtError::Network(format!("{} transaction failed: {}", context, e)))?
            .ok_or_else(|| ZksbtError::Network(format!("No receipt for {}", context)))?;
        if receipt.status.is_some_and(|s| s.as_u64() == 0) {
            return Err(ZksbtError::LedgerRevert(format!(
                "{}: execution reverted",
                context
            )));
        }
        info!("{} confirmed: {:?}", context, receipt.transaction_hash);
        Ok(into_receipt(receipt))
    }
}

#[async_trait]
impl Ledger for ContractLedger {
    async fn pool(&self, key: &PoolKey) -> ZksbtResult<Pool> {
        let (id, root, salt) = self
            .registry
            .pools(key.category.0, key.attribute.to_string())
            .call()
            .await
            .map_err(|e| contract_error("pools", e))?;
        Ok(Pool {
            id,
            root: u256_to_fr(root)?,
            salt: u256_to_fr(salt)?,
            depth: self.depth,
        })
    }

    async fn merkle_root(&self, pool_id: U256) -> ZksbtResult<Fr> {
        let root = self
            .registry
            .get_merkle_tree_root(pool_id)
            .call()
            .await
            .map_err(|e| contract_error("getMerkleTreeRoot", e))?;
        u256_to_fr(root)
    }

    async fn member_inserted_events(
        &self,
        key: &PoolKey,
        cursor: EventCursor,
    ) -> ZksbtResult<EventPage> {
        let pool_id = self.pool_id(key).await?;
        let latest = self
            .client
            .get_block_number()
            .await
            .map_err(|e| ZksbtError::Network(format!("Failed to get block number: {}", e)))?
            .as_u64();

        let from = cursor.0.max(self.deployment_block);
        if from > latest {
            return Ok(EventPage::default());
        }
        let to = from.saturating_add(self.page_size - 1).min(latest);

        let mut logs = self
            .registry
            .member_inserted_filter()
            .from_block(from)
            .to_block(to)
            .topic1(pool_topic(pool_id))
            .query_with_meta()
            .await
            .map_err(|e| contract_error("MemberInserted", e))?;
        logs.sort_by_key(|(_, meta)| (meta.block_number, meta.log_index));
        debug!(
            "Fetched {} MemberInserted logs in blocks {}..={}",
            logs.len(),
            from,
            to
        );

        let events = logs
            .into_iter()
            .map(|(log, _)| {
                Ok(MemberInserted {
                    pool_id: log.pool_id,
                    token: log.token,
                    leaf: u256_to_fr(log.leaf)?,
                    leaf_index: log.leaf_index.as_u64(),
                })
            })
            .collect::<ZksbtResult<Vec<_>>>()?;

        Ok(EventPage {
            events,
            next: (to < latest).then_some(EventCursor(to + 1)),
        })
    }

    async fn mint(&self, request: MintRequest) -> ZksbtResult<TxReceipt> {
        let call = self.registry.mint(
            fr_to_u256(&request.claimant),
            request.pool.category.0,
            request.pool.attribute.to_string(),
            request.sbt_id,
            request.verify_timestamp,
            Bytes::from(request.signature.to_bytes().to_vec()),
        );
        self.submit(call, "mint").await
    }

    async fn verify(
        &self,
        key: &PoolKey,
        nullifier_hash: Fr,
        proof: &FlatProof,
    ) -> ZksbtResult<TxReceipt> {
        let call = self.registry.verify(
            key.category.0,
            key.attribute.to_string(),
            fr_to_u256(&nullifier_hash),
            *proof.as_words(),
        );
        self.submit(call, "verify").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_topic_is_big_endian() {
        let topic = pool_topic(U256::from(0x0102u64));
        assert_eq!(topic.as_bytes()[30], 0x01);
        assert_eq!(topic.as_bytes()[31], 0x02);
        assert!(topic.as_bytes()[..30].iter().all(|b| *b == 0));
    }

    #[tokio::test]
    async fn test_connect_requires_contract_address() {
        let config = LedgerConfig::default();
        let err = ContractLedger::connect(&config, "01").await.err().unwrap();
        assert!(matches!(err, ZksbtError::Config(_)));
    }
}
