use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZksbtError {
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signature too short for key derivation: need {required} bytes, got {actual}")]
    InvalidSignatureLength { required: usize, actual: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid attribute for category {category}: {reason}")]
    InvalidAttribute { category: u64, reason: String },

    #[error("Invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("Id allocation conflict in pool {pool}: id {id} is already taken")]
    IdAllocationConflict { pool: String, id: u128 },

    #[error("Claim address {address} is already bound to a different commitment")]
    ClaimAddressCollision { address: String },

    #[error("Root mismatch in pool {pool}: target root {target_root} not reached after {events_scanned} events ({members} members inserted)")]
    RootMismatch {
        pool: String,
        target_root: String,
        events_scanned: u64,
        members: usize,
    },

    #[error("Member {leaf} not found in pool {pool}")]
    MemberNotFound { pool: String, leaf: String },

    #[error("Merkle tree error: {0}")]
    MerkleTree(String),

    #[error("Proof packing mismatch: {0}")]
    ProofPackingMismatch(String),

    #[error("Proof verification failed in pool {pool} (salt {salt}): {reason}")]
    VerificationFailed {
        pool: String,
        salt: String,
        reason: String,
    },

    #[error("Public signal {index} mismatch: expected {expected}, got {actual}")]
    PublicSignalMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Prover error: {0}")]
    Prover(String),

    #[error("Ledger reverted: {0}")]
    LedgerRevert(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZksbtError {
    /// Errors the protocol recovers from locally: a stale root or a lost
    /// allocation race. Everything else goes back to the caller unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ZksbtError::RootMismatch { .. } | ZksbtError::IdAllocationConflict { .. }
        )
    }
}

pub type ZksbtResult<T> = Result<T, ZksbtError>;
