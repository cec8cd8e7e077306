#![allow(dead_code)]

use async_trait::async_trait;
use ethers::types::U256;
use std::path::PathBuf;
use std::sync::Arc;
use zksbt_core::field::{fr_to_u256, parse_fr};
use zksbt_core::{
    CircuitArtifact, CircuitInput, Fr, InMemoryLedger, LeafScheme, NativeProof, Prover,
    ProverOutput, VerificationKey, Verifier, ZksbtError, ZksbtResult,
};
use zksbt_crypto::{poseidon_hash2_fields, poseidon_hash_fields};
use zksbt_types::EthAddress;

pub const DEPTH: usize = 16;

/// Stands in for the circom prover: recomputes the public signals from the
/// witness and commits to them in `a.x`. With no path the first signal is the
/// identity commitment itself, as the identity circuit exposes it.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockProver {
    /// Replaces the salt signal, to simulate a circuit bound to another pool.
    pub forged_salt: Option<u64>,
}

fn optional_fr(value: &Option<String>) -> ZksbtResult<Option<Fr>> {
    value.as_deref().map(parse_fr).transpose()
}

pub fn seal(signals: &[Fr]) -> NativeProof {
    NativeProof {
        a: [fr_to_u256(&poseidon_hash_fields(signals)), U256::one()],
        b: [[U256::from(2u64), U256::from(3u64)], [U256::from(4u64), U256::from(5u64)]],
        c: [U256::from(6u64), U256::from(7u64)],
    }
}

#[async_trait]
impl Prover for MockProver {
    async fn full_prove(
        &self,
        input: &CircuitInput,
        _artifact: &CircuitArtifact,
    ) -> ZksbtResult<ProverOutput> {
        let mut leaf = poseidon_hash2_fields(input.identity_trapdoor, input.identity_nullifier);
        if let Some(id) = optional_fr(&input.sbt_id)? {
            leaf = poseidon_hash2_fields(leaf, id);
            if let Some(attribute) = optional_fr(&input.attribute)? {
                let time = optional_fr(&input.verify_timestamp)?
                    .ok_or_else(|| ZksbtError::Prover("missing verifyTimestamp".into()))?;
                leaf = poseidon_hash2_fields(poseidon_hash2_fields(leaf, time), attribute);
            }
        }

        let root = input
            .tree_siblings
            .iter()
            .zip(&input.tree_path_indices)
            .fold(leaf, |node, (sibling, bit)| {
                if *bit == 0 {
                    poseidon_hash2_fields(node, *sibling)
                } else {
                    poseidon_hash2_fields(*sibling, node)
                }
            });

        let salt = match self.forged_salt {
            Some(forged) => Fr::from(forged),
            None => input.external_nullifier,
        };
        let mut signals = vec![
            root,
            poseidon_hash2_fields(input.external_nullifier, input.identity_nullifier),
            salt,
        ];
        for extra in [&input.attribute, &input.begin, &input.end] {
            if let Some(value) = optional_fr(extra)? {
                signals.push(value);
            }
        }

        Ok(ProverOutput {
            proof: seal(&signals),
            public_signals: signals,
        })
    }
}

/// Accepts exactly the proofs [`MockProver`] seals for the given signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockVerifier;

impl Verifier for MockVerifier {
    fn verify(
        &self,
        _vk: &VerificationKey,
        public_signals: &[Fr],
        proof: &NativeProof,
    ) -> ZksbtResult<bool> {
        Ok(proof.a[0] == fr_to_u256(&poseidon_hash_fields(public_signals)))
    }
}

pub fn dummy_vk() -> VerificationKey {
    VerificationKey {
        protocol: "groth16".into(),
        curve: "bn128".into(),
        n_public: 3,
        vk_alpha_1: Vec::new(),
        vk_beta_2: Vec::new(),
        vk_gamma_2: Vec::new(),
        vk_delta_2: Vec::new(),
        ic: Vec::new(),
    }
}

pub fn artifact() -> CircuitArtifact {
    CircuitArtifact {
        wasm_path: PathBuf::from("semaphore.wasm"),
        zkey_path: PathBuf::from("semaphore.zkey"),
    }
}

pub fn identity_artifact() -> CircuitArtifact {
    CircuitArtifact {
        wasm_path: PathBuf::from("identity.wasm"),
        zkey_path: PathBuf::from("identity.zkey"),
    }
}

pub fn ledger(issuer: EthAddress, scheme: LeafScheme) -> Arc<InMemoryLedger> {
    Arc::new(
        InMemoryLedger::new(issuer, scheme, DEPTH, Arc::new(MockVerifier), dummy_vk())
            .with_page_size(2),
    )
}
