use ark_bn254::Fr;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::field::{parse_u256, serde_fr, serde_fr_seq};

/// Groth16 proof in prover order: `a`, `b` and `c` as affine coordinates,
/// with each `b` row holding one Fq2 coordinate as `[c0, c1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeProof {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

/// The eight words a verifier contract takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatProof(pub [U256; 8]);

impl FlatProof {
    pub fn as_words(&self) -> &[U256; 8] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    pub proof: FlatProof,
    #[serde(with = "serde_fr")]
    pub merkle_root: Fr,
    #[serde(with = "serde_fr")]
    pub nullifier_hash: Fr,
    #[serde(with = "serde_fr")]
    pub external_nullifier: Fr,
    /// Full public-signal vector, in the circuit's order.
    #[serde(with = "serde_fr_seq")]
    pub public_signals: Vec<Fr>,
}

/// Proof of knowledge of the secrets behind an identity commitment, scoped
/// to one salt. The backend binds proof keys to these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProof {
    pub proof: FlatProof,
    #[serde(with = "serde_fr")]
    pub identity_commitment: Fr,
    #[serde(with = "serde_fr")]
    pub nullifier_hash: Fr,
    #[serde(with = "serde_fr")]
    pub external_nullifier: Fr,
    #[serde(with = "serde_fr_seq")]
    pub public_signals: Vec<Fr>,
}

/// `proof.json` as written by snarkjs: projective coordinates as decimal
/// strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsProof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".into()
}

fn default_curve() -> String {
    "bn128".into()
}

fn coordinate(values: &[String], index: usize, what: &str) -> ZksbtResult<U256> {
    let raw = values.get(index).ok_or_else(|| {
        ZksbtError::Serialization(format!("{} is missing coordinate {}", what, index))
    })?;
    parse_u256(raw)
}

impl SnarkjsProof {
    pub fn to_native(&self) -> ZksbtResult<NativeProof> {
        if self.protocol != "groth16" {
            return Err(ZksbtError::Serialization(format!(
                "unsupported proof protocol {:?}",
                self.protocol
            )));
        }
        let row = |i: usize| -> ZksbtResult<[U256; 2]> {
            let values = self.pi_b.get(i).ok_or_else(|| {
                ZksbtError::Serialization(format!("pi_b is missing row {}", i))
            })?;
            Ok([coordinate(values, 0, "pi_b")?, coordinate(values, 1, "pi_b")?])
        };
        Ok(NativeProof {
            a: [coordinate(&self.pi_a, 0, "pi_a")?, coordinate(&self.pi_a, 1, "pi_a")?],
            b: [row(0)?, row(1)?],
            c: [coordinate(&self.pi_c, 0, "pi_c")?, coordinate(&self.pi_c, 1, "pi_c")?],
        })
    }

    pub fn from_native(proof: &NativeProof) -> Self {
        let s = |v: &U256| v.to_string();
        Self {
            pi_a: vec![s(&proof.a[0]), s(&proof.a[1]), "1".into()],
            pi_b: vec![
                vec![s(&proof.b[0][0]), s(&proof.b[0][1])],
                vec![s(&proof.b[1][0]), s(&proof.b[1][1])],
                vec!["1".into(), "0".into()],
            ],
            pi_c: vec![s(&proof.c[0]), s(&proof.c[1]), "1".into()],
            protocol: default_protocol(),
            curve: default_curve(),
        }
    }
}
