use ark_bn254::Fr;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};
use zksbt_types::{ZksbtError, ZksbtResult};

use super::groth16::VerificationKey;
use super::packing::{ensure_bit_exact, unpack_proof};
use super::profile::{expected_public_signals, CircuitProfile, SignalKind, SignalSources};
use super::prover::{CircuitArtifact, CircuitInput, Prover, Verifier};
use super::types::{FlatProof, IdentityProof, MembershipProof};
use crate::field::fr_to_decimal;
use crate::group::MerkleGroup;
use crate::identity::{CredentialBinding, Identity};

/// Circuit inputs plus the public signals a correct proof of them exposes.
#[derive(Clone, Debug)]
pub struct ProofJob {
    pub input: CircuitInput,
    pub expected_signals: Vec<Fr>,
    layout: &'static [SignalKind],
}

impl ProofJob {
    pub fn signal(&self, kind: SignalKind) -> Option<Fr> {
        self.layout
            .iter()
            .position(|k| *k == kind)
            .and_then(|i| self.expected_signals.get(i).copied())
    }

    fn require(&self, kind: SignalKind) -> ZksbtResult<Fr> {
        self.signal(kind).ok_or_else(|| {
            ZksbtError::Config(format!("proof job exposes no {:?} signal", kind))
        })
    }
}

pub struct ProofPipeline<P: Prover, C: CircuitProfile> {
    prover: P,
    artifact: CircuitArtifact,
    verifier: Arc<dyn Verifier>,
    _profile: PhantomData<C>,
}

impl<P: Prover, C: CircuitProfile> ProofPipeline<P, C> {
    pub fn new(prover: P, artifact: CircuitArtifact, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            prover,
            artifact,
            verifier,
            _profile: PhantomData,
        }
    }

    pub fn profile_name(&self) -> &'static str {
        C::NAME
    }

    /// Locates the holder's leaf in `group` and assembles the witness.
    pub fn build_circuit_inputs(
        &self,
        identity: &Identity,
        group: &MerkleGroup,
        salt: Fr,
        binding: Option<&CredentialBinding>,
    ) -> ZksbtResult<ProofJob> {
        let leaf = C::LEAF_SCHEME.identity_commitment(identity.commitment(), binding)?;
        let index = group.index_of(&leaf).ok_or_else(|| ZksbtError::MemberNotFound {
            pool: group.pool().to_string(),
            leaf: fr_to_decimal(&leaf),
        })?;
        let path = group.proof(index)?;

        let expected_signals = expected_public_signals::<C>(&SignalSources {
            merkle_root: Some(group.root()),
            identity_commitment: identity.commitment(),
            nullifier_hash: identity.nullifier_hash(&salt),
            salt,
            binding,
        })?;

        let mut input = CircuitInput {
            identity_trapdoor: *identity.trapdoor(),
            identity_nullifier: *identity.nullifier(),
            tree_path_indices: path.path_indices,
            tree_siblings: path.siblings,
            external_nullifier: salt,
            sbt_id: None,
            verify_timestamp: None,
            attribute: None,
            begin: None,
            end: None,
        };
        if let Some(b) = binding.filter(|_| C::LEAF_SCHEME.requires_binding()) {
            input.sbt_id = Some(b.sbt_id.to_string());
            input.verify_timestamp = Some(b.verify_timestamp.to_string());
        }
        if let Some(b) = binding {
            for kind in C::PUBLIC_SIGNALS {
                match kind {
                    SignalKind::AttributeHash => {
                        input.attribute = Some(fr_to_decimal(&b.attribute_hash()));
                    }
                    SignalKind::WindowBegin => {
                        input.begin = b.window.map(|w| w.begin.to_string());
                    }
                    SignalKind::WindowEnd => {
                        input.end = b.window.map(|w| w.end.to_string());
                    }
                    _ => {}
                }
            }
        }

        debug!(
            "Built {} circuit input for leaf {} of pool {}",
            C::NAME,
            index,
            group.pool()
        );
        Ok(ProofJob {
            input,
            expected_signals,
            layout: C::PUBLIC_SIGNALS,
        })
    }

    /// Witness for an identity circuit: the secrets and the salt, no path.
    pub fn build_identity_inputs(&self, identity: &Identity, salt: Fr) -> ZksbtResult<ProofJob> {
        let expected_signals = expected_public_signals::<C>(&SignalSources {
            merkle_root: None,
            identity_commitment: identity.commitment(),
            nullifier_hash: identity.nullifier_hash(&salt),
            salt,
            binding: None,
        })?;
        let input = CircuitInput {
            identity_trapdoor: *identity.trapdoor(),
            identity_nullifier: *identity.nullifier(),
            tree_path_indices: Vec::new(),
            tree_siblings: Vec::new(),
            external_nullifier: salt,
            sbt_id: None,
            verify_timestamp: None,
            attribute: None,
            begin: None,
            end: None,
        };
        Ok(ProofJob {
            input,
            expected_signals,
            layout: C::PUBLIC_SIGNALS,
        })
    }

    /// Runs the prover and checks its public signals against the ones the
    /// inputs imply before packing.
    async fn run(&self, job: &ProofJob) -> ZksbtResult<(FlatProof, Vec<Fr>)> {
        let output = self.prover.full_prove(&job.input, &self.artifact).await?;

        if output.public_signals.len() != job.expected_signals.len() {
            return Err(ZksbtError::PublicSignalMismatch {
                index: output.public_signals.len().min(job.expected_signals.len()),
                expected: format!("{} signals", job.expected_signals.len()),
                actual: format!("{} signals", output.public_signals.len()),
            });
        }
        for (index, (expected, actual)) in job
            .expected_signals
            .iter()
            .zip(&output.public_signals)
            .enumerate()
        {
            if expected != actual {
                return Err(ZksbtError::PublicSignalMismatch {
                    index,
                    expected: fr_to_decimal(expected),
                    actual: fr_to_decimal(actual),
                });
            }
        }

        let proof = ensure_bit_exact(&output.proof)?;
        info!("Generated {} proof", C::NAME);
        Ok((proof, output.public_signals))
    }

    pub async fn prove(&self, job: &ProofJob) -> ZksbtResult<MembershipProof> {
        let merkle_root = job.require(SignalKind::MerkleRoot)?;
        let nullifier_hash = job.require(SignalKind::NullifierHash)?;
        let (proof, public_signals) = self.run(job).await?;
        Ok(MembershipProof {
            proof,
            merkle_root,
            nullifier_hash,
            external_nullifier: job.input.external_nullifier,
            public_signals,
        })
    }

    pub async fn prove_identity(&self, job: &ProofJob) -> ZksbtResult<IdentityProof> {
        let identity_commitment = job.require(SignalKind::IdentityCommitment)?;
        let nullifier_hash = job.require(SignalKind::NullifierHash)?;
        let (proof, public_signals) = self.run(job).await?;
        Ok(IdentityProof {
            proof,
            identity_commitment,
            nullifier_hash,
            external_nullifier: job.input.external_nullifier,
            public_signals,
        })
    }

    /// Verifies on the blocking pool; pairings are too slow for a runtime
    /// worker.
    pub async fn verify_offchain(
        &self,
        proof: &MembershipProof,
        vk: &VerificationKey,
    ) -> ZksbtResult<bool> {
        verify_offchain(self.verifier.clone(), &proof.proof, &proof.public_signals, vk).await
    }
}

pub(crate) async fn verify_offchain(
    verifier: Arc<dyn Verifier>,
    proof: &FlatProof,
    public_signals: &[Fr],
    vk: &VerificationKey,
) -> ZksbtResult<bool> {
    let native = unpack_proof(proof);
    let signals = public_signals.to_vec();
    let vk = vk.clone();
    tokio::task::spawn_blocking(move || verifier.verify(&vk, &signals, &native))
        .await
        .map_err(|e| ZksbtError::Internal(format!("Verifier task failed: {}", e)))?
}
