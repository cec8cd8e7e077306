use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_ISSUER_KEY_ENV, DEFAULT_MAX_PENDING_CERTIFICATES, DEFAULT_MAX_RETRIES,
    DEFAULT_PENDING_TTL_SECS,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    pub issuer_key_env: String,
    pub max_allocation_retries: u32,
    /// Root refetches a holder makes when reconstruction overshoots.
    pub max_root_retries: u32,
    /// How long an issued, unminted certificate is returned for a repeated claim.
    pub pending_ttl_secs: u64,
    pub max_pending_certificates: usize,
}

impl AuthorityConfig {
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            issuer_key_env: DEFAULT_ISSUER_KEY_ENV.to_string(),
            max_allocation_retries: DEFAULT_MAX_RETRIES,
            max_root_retries: DEFAULT_MAX_RETRIES,
            pending_ttl_secs: DEFAULT_PENDING_TTL_SECS,
            max_pending_certificates: DEFAULT_MAX_PENDING_CERTIFICATES,
        }
    }
}
