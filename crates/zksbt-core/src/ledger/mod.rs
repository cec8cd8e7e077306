//! Ledger port.
//!
//! The ledger owns pool state: the current root, the salt, minted ids and
//! spent nullifiers. The core reads roots and the member-inserted log, and
//! submits mints and proofs. Every call is an await point; nothing here is
//! retried implicitly.

mod contract;
mod memory;
mod types;

pub use contract::{ContractLedger, ZksbtRegistry};
pub use memory::{InMemoryLedger, REVERT_ALREADY_MINTED, REVERT_CLAIM_COLLISION};
pub use types::{EventCursor, EventPage, MemberInserted, MintRequest, Pool, TxReceipt};

use async_trait::async_trait;
use ark_bn254::Fr;
use ethers::types::U256;
use zksbt_types::ZksbtResult;

use crate::addressing::PoolKey;
use crate::proof::FlatProof;

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn pool(&self, key: &PoolKey) -> ZksbtResult<Pool>;

    async fn merkle_root(&self, pool_id: U256) -> ZksbtResult<Fr>;

    /// One page of member-inserted events at or after `cursor`, in emission
    /// order across all pools. `next` is `None` once the log is exhausted.
    async fn member_inserted_events(
        &self,
        key: &PoolKey,
        cursor: EventCursor,
    ) -> ZksbtResult<EventPage>;

    async fn mint(&self, request: MintRequest) -> ZksbtResult<TxReceipt>;

    async fn verify(
        &self,
        key: &PoolKey,
        nullifier_hash: Fr,
        proof: &FlatProof,
    ) -> ZksbtResult<TxReceipt>;
}
