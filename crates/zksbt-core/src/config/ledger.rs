use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_EVENT_PAGE_SIZE, DEFAULT_OPERATOR_KEY_ENV, DEFAULT_RPC_URL,
    DEFAULT_TREE_DEPTH,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub chain_id: u64,
    /// Blocks per `MemberInserted` query.
    pub event_page_size: u64,
    pub tree_depth: usize,
    /// First block worth scanning for events.
    pub deployment_block: u64,
    pub operator_key_env: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            chain_id: DEFAULT_CHAIN_ID,
            event_page_size: DEFAULT_EVENT_PAGE_SIZE,
            tree_depth: DEFAULT_TREE_DEPTH,
            deployment_block: 0,
            operator_key_env: DEFAULT_OPERATOR_KEY_ENV.to_string(),
        }
    }
}
