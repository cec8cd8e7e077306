//! zkSBT protocol core.
//!
//! Identity derivation, credential addressing, certificate issuance, Merkle
//! group reconstruction from ledger events, and the Groth16 membership-proof
//! pipeline. The ledger and the prover are reached through the [`Ledger`]
//! and [`Prover`] ports; everything else runs in-process.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod addressing;
pub mod authority;
pub mod config;
pub mod field;
pub mod group;
pub mod holder;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod proof;
pub mod proof_key;
pub mod signer;

pub use addressing::{
    claim_address, pack, unpack, AttributeEncoding, Category, CredentialAttribute,
    CredentialDescriptor, PoolKey, PoolMetadata,
};
pub use authority::{
    AllowAll, AllowList, Certificate, CertificateAuthority, EligibilityPolicy, IdAllocator,
    MintOutcome, SerializedAllocator,
};
pub use config::ZksbtConfig;
pub use group::{GroupReconstructor, IncrementalMerkleTree, MerkleGroup, MerkleProof};
pub use holder::CredentialHolder;
pub use identity::{CredentialBinding, Identity, KeyMaterial, LeafScheme, ValidityWindow};
pub use ledger::{
    ContractLedger, EventCursor, EventPage, InMemoryLedger, Ledger, MemberInserted, MintRequest,
    Pool, TxReceipt,
};
pub use logging::init_logging;
pub use proof::{
    ArkGroth16Verifier, AttributedProfile, CircuitArtifact, CircuitInput, CircuitProfile,
    FlatProof, IdentityProfile, IdentityProof, MembershipProfile, MembershipProof, NativeProof,
    PompProfile, ProofJob, ProofPipeline, Prover, ProverOutput, SignalKind, VerificationKey,
    Verifier,
};
pub use proof_key::{proof_key, ProofKey, ProofKeyBinder};
pub use signer::{recover_signer, LocalSigner, MessageSigner};

pub use ark_bn254::Fr;
pub use zksbt_types::{ZksbtError, ZksbtResult};
