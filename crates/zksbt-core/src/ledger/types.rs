use ark_bn254::Fr;
use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};
use zksbt_types::EcdsaSignature;

use crate::addressing::PoolKey;
use crate::field::serde_fr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: U256,
    #[serde(with = "serde_fr")]
    pub root: Fr,
    #[serde(with = "serde_fr")]
    pub salt: Fr,
    pub depth: usize,
}

/// Opaque resume point into the event log. The in-memory ledger counts
/// events; the contract ledger counts blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventCursor(pub u64);

impl EventCursor {
    pub fn start() -> Self {
        Self(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInserted {
    pub pool_id: U256,
    /// Packed credential address; `unpack` recovers the pool.
    pub token: U256,
    #[serde(with = "serde_fr")]
    pub leaf: Fr,
    pub leaf_index: u64,
}

#[derive(Clone, Debug, Default)]
pub struct EventPage {
    pub events: Vec<MemberInserted>,
    pub next: Option<EventCursor>,
}

#[derive(Clone, Debug)]
pub struct MintRequest {
    pub claimant: Fr,
    pub pool: PoolKey,
    pub sbt_id: u128,
    pub verify_timestamp: u64,
    pub signature: EcdsaSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
}
