//! Backend bookkeeping keys for accepted proofs.

use ark_bn254::Fr;
use ethers::abi::{encode, Token};
use ethers::types::U256;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use zksbt_crypto::keccak256;
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::addressing::PoolKey;
use crate::config::ProverConfig;
use crate::field::{fr_to_decimal, fr_to_u256};
use crate::group::MerkleGroup;
use crate::identity::{CredentialBinding, LeafScheme};
use crate::proof::{
    verify_offchain, CircuitProfile, FlatProof, IdentityProfile, IdentityProof, VerificationKey,
    Verifier,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProofKey(pub [u8; 32]);

impl ProofKey {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ProofKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofKey({})", self.to_hex())
    }
}

impl fmt::Display for ProofKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// `keccak256(abi.encode(uint256[8] proof, uint256 claimant, uint64 category,
/// string attribute, uint128 sbtId, uint256 salt))`
pub fn proof_key(
    claimant: &Fr,
    pool: &PoolKey,
    sbt_id: u128,
    salt: &Fr,
    proof: &FlatProof,
) -> ProofKey {
    let words = proof.as_words().iter().copied().map(Token::Uint).collect();
    let encoded = encode(&[
        Token::FixedArray(words),
        Token::Uint(fr_to_u256(claimant)),
        Token::Uint(U256::from(pool.category.0)),
        Token::String(pool.attribute.to_string()),
        Token::Uint(U256::from(sbt_id)),
        Token::Uint(fr_to_u256(salt)),
    ]);
    ProofKey(keccak256(&encoded))
}

/// Derives proof keys only for identity proofs that verify, are made for
/// the claimant under the pool's salt, and whose claimant holds the
/// credential in the pool's group.
pub struct ProofKeyBinder {
    verifier: Arc<dyn Verifier>,
    vk: VerificationKey,
    scheme: LeafScheme,
}

impl ProofKeyBinder {
    /// `vk` is the identity circuit's key; `scheme` is how the pool's leaves
    /// are derived from commitments.
    pub fn new(verifier: Arc<dyn Verifier>, vk: VerificationKey, scheme: LeafScheme) -> Self {
        Self {
            verifier,
            vk,
            scheme,
        }
    }

    pub fn from_config(
        verifier: Arc<dyn Verifier>,
        config: &ProverConfig,
        scheme: LeafScheme,
    ) -> ZksbtResult<Self> {
        Ok(Self::new(verifier, config.load_identity_verification_key()?, scheme))
    }

    pub async fn bind_verified(
        &self,
        claimant: &Fr,
        group: &MerkleGroup,
        binding: &CredentialBinding,
        salt: &Fr,
        proof: &IdentityProof,
    ) -> ZksbtResult<ProofKey> {
        let pool = group.pool();
        let failed = |reason: String| ZksbtError::VerificationFailed {
            pool: pool.to_string(),
            salt: fr_to_decimal(salt),
            reason,
        };

        let expected = [*claimant, proof.nullifier_hash, *salt];
        if proof.public_signals.len() != IdentityProfile::PUBLIC_SIGNALS.len() {
            return Err(failed(format!(
                "identity proof exposes {} signals",
                proof.public_signals.len()
            )));
        }
        if proof.public_signals[0] != expected[0] {
            return Err(failed(format!(
                "proof is for identity {}",
                fr_to_decimal(&proof.public_signals[0])
            )));
        }
        if proof.public_signals[1] != expected[1] {
            return Err(failed("nullifier hash does not match the proof".into()));
        }
        if proof.public_signals[2] != expected[2] {
            return Err(failed(format!(
                "proof is bound to salt {}",
                fr_to_decimal(&proof.public_signals[2])
            )));
        }

        let leaf = self.scheme.identity_commitment(*claimant, Some(binding))?;
        if group.index_of(&leaf).is_none() {
            warn!(
                "Refusing proof key for pool {}: sbt {} is not held by the claimant",
                pool, binding.sbt_id
            );
            return Err(ZksbtError::MemberNotFound {
                pool: pool.to_string(),
                leaf: fr_to_decimal(&leaf),
            });
        }

        let valid = verify_offchain(self.verifier.clone(), &proof.proof, &expected, &self.vk).await?;
        if !valid {
            warn!("Refusing proof key for pool {}: proof did not verify", pool);
            return Err(failed("proof did not verify".into()));
        }

        let key = proof_key(claimant, pool, binding.sbt_id, salt, &proof.proof);
        debug!("Bound proof key {} for pool {}", key, pool);
        Ok(key)
    }
}
