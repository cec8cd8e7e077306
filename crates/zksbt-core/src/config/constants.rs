pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

pub const DEFAULT_CHAIN_ID: u64 = 31337;

pub const DEFAULT_EVENT_PAGE_SIZE: u64 = 5000;

pub const DEFAULT_TREE_DEPTH: usize = 16;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Unminted certificates are forgotten after an hour.
pub const DEFAULT_PENDING_TTL_SECS: u64 = 3600;

pub const DEFAULT_MAX_PENDING_CERTIFICATES: usize = 10_000;

pub const DEFAULT_OPERATOR_KEY_ENV: &str = "ZKSBT_OPERATOR_KEY";

pub const DEFAULT_ISSUER_KEY_ENV: &str = "ZKSBT_ISSUER_KEY";
