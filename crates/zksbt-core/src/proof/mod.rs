mod groth16;
mod packing;
mod pipeline;
mod profile;
mod prover;
mod types;

pub use groth16::{
    ark_proof_to_native, native_proof_to_ark, ArkGroth16Verifier, VerificationKey,
};
pub use packing::{ensure_bit_exact, pack_proof, unpack_proof};
pub use pipeline::{ProofJob, ProofPipeline};
pub(crate) use pipeline::verify_offchain;
pub use profile::{
    expected_public_signals, AttributedProfile, CircuitProfile, IdentityProfile,
    MembershipProfile, PompProfile, SignalKind, SignalSources,
};
pub use prover::{CircuitArtifact, CircuitInput, Prover, ProverOutput, Verifier};
pub use types::{FlatProof, IdentityProof, MembershipProof, NativeProof, SnarkjsProof};
