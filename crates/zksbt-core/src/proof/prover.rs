use ark_bn254::Fr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zksbt_types::ZksbtResult;

use super::groth16::VerificationKey;
use super::types::NativeProof;
use crate::field::{serde_fr, serde_fr_seq};

/// Compiled circuit handed to the prover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitArtifact {
    pub wasm_path: PathBuf,
    pub zkey_path: PathBuf,
}

/// Witness inputs, named the way the circom circuits name their signals.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    #[serde(with = "serde_fr")]
    pub identity_trapdoor: Fr,
    #[serde(with = "serde_fr")]
    pub identity_nullifier: Fr,
    pub tree_path_indices: Vec<u8>,
    #[serde(with = "serde_fr_seq")]
    pub tree_siblings: Vec<Fr>,
    #[serde(with = "serde_fr")]
    pub external_nullifier: Fr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl std::fmt::Debug for CircuitInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitInput")
            .field("depth", &self.tree_siblings.len())
            .field("external_nullifier", &crate::field::fr_to_decimal(&self.external_nullifier))
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProverOutput {
    pub proof: NativeProof,
    pub public_signals: Vec<Fr>,
}

/// Witness generation and Groth16 proving, run outside this crate.
#[async_trait]
pub trait Prover: Send + Sync {
    async fn full_prove(
        &self,
        input: &CircuitInput,
        artifact: &CircuitArtifact,
    ) -> ZksbtResult<ProverOutput>;
}

/// Synchronous and CPU-bound; callers on an async runtime move it to the
/// blocking pool.
pub trait Verifier: Send + Sync {
    fn verify(
        &self,
        vk: &VerificationKey,
        public_signals: &[Fr],
        proof: &NativeProof,
    ) -> ZksbtResult<bool>;
}
