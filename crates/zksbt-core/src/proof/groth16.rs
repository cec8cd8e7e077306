//! Groth16 over BN254 with snarkjs-shaped keys and proofs.
//!
//! Points arriving as raw coordinates are checked for curve membership and
//! subgroup membership before they reach a pairing.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInt, PrimeField};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_snark::SNARK;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use zksbt_types::{ZksbtError, ZksbtResult};

use super::prover::Verifier;
use super::types::NativeProof;
use crate::field::parse_u256;

// ============================================================================
// Point conversion
// ============================================================================

fn fq_from_u256(value: U256) -> ZksbtResult<Fq> {
    Fq::from_bigint(BigInt(value.0)).ok_or_else(|| {
        ZksbtError::Crypto(format!("{} is not a canonical base field element", value))
    })
}

fn fq_to_u256(value: &Fq) -> U256 {
    U256(value.into_bigint().0)
}

fn g1_from_coords(coords: [U256; 2]) -> ZksbtResult<G1Affine> {
    if coords[0].is_zero() && coords[1].is_zero() {
        return Ok(G1Affine::zero());
    }
    let point = G1Affine::new_unchecked(fq_from_u256(coords[0])?, fq_from_u256(coords[1])?);
    if !point.is_on_curve() {
        return Err(ZksbtError::Crypto("G1 point is not on the curve".into()));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ZksbtError::Crypto("G1 point is not in the prime subgroup".into()));
    }
    Ok(point)
}

fn g1_to_coords(point: &G1Affine) -> [U256; 2] {
    if point.is_zero() {
        return [U256::zero(), U256::zero()];
    }
    [fq_to_u256(&point.x), fq_to_u256(&point.y)]
}

/// `coords[i]` is one Fq2 coordinate as `[c0, c1]`.
fn g2_from_coords(coords: [[U256; 2]; 2]) -> ZksbtResult<G2Affine> {
    if coords.iter().flatten().all(|c| c.is_zero()) {
        return Ok(G2Affine::zero());
    }
    let x = Fq2::new(fq_from_u256(coords[0][0])?, fq_from_u256(coords[0][1])?);
    let y = Fq2::new(fq_from_u256(coords[1][0])?, fq_from_u256(coords[1][1])?);
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(ZksbtError::Crypto("G2 point is not on the curve".into()));
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ZksbtError::Crypto("G2 point is not in the prime subgroup".into()));
    }
    Ok(point)
}

fn g2_to_coords(point: &G2Affine) -> [[U256; 2]; 2] {
    if point.is_zero() {
        return [[U256::zero(); 2]; 2];
    }
    [
        [fq_to_u256(&point.x.c0), fq_to_u256(&point.x.c1)],
        [fq_to_u256(&point.y.c0), fq_to_u256(&point.y.c1)],
    ]
}

pub fn native_proof_to_ark(proof: &NativeProof) -> ZksbtResult<Proof<Bn254>> {
    Ok(Proof {
        a: g1_from_coords(proof.a)?,
        b: g2_from_coords(proof.b)?,
        c: g1_from_coords(proof.c)?,
    })
}

pub fn ark_proof_to_native(proof: &Proof<Bn254>) -> NativeProof {
    NativeProof {
        a: g1_to_coords(&proof.a),
        b: g2_to_coords(&proof.b),
        c: g1_to_coords(&proof.c),
    }
}

// ============================================================================
// Verification key (snarkjs `verification_key.json`)
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: Vec<String>,
    pub vk_beta_2: Vec<Vec<String>>,
    pub vk_gamma_2: Vec<Vec<String>>,
    pub vk_delta_2: Vec<Vec<String>>,
    #[serde(rename = "IC")]
    pub ic: Vec<Vec<String>>,
}

fn g1_from_strings(values: &[String], what: &str) -> ZksbtResult<G1Affine> {
    if values.len() < 2 {
        return Err(ZksbtError::Serialization(format!("{} needs two coordinates", what)));
    }
    g1_from_coords([parse_u256(&values[0])?, parse_u256(&values[1])?])
}

fn g2_from_strings(values: &[Vec<String>], what: &str) -> ZksbtResult<G2Affine> {
    if values.len() < 2 || values[0].len() < 2 || values[1].len() < 2 {
        return Err(ZksbtError::Serialization(format!("{} needs 2x2 coordinates", what)));
    }
    g2_from_coords([
        [parse_u256(&values[0][0])?, parse_u256(&values[0][1])?],
        [parse_u256(&values[1][0])?, parse_u256(&values[1][1])?],
    ])
}

fn g1_to_strings(point: &G1Affine) -> Vec<String> {
    let [x, y] = g1_to_coords(point);
    let z = if point.is_zero() { "0" } else { "1" };
    vec![x.to_string(), y.to_string(), z.into()]
}

fn g2_to_strings(point: &G2Affine) -> Vec<Vec<String>> {
    let [x, y] = g2_to_coords(point);
    let z = if point.is_zero() { "0" } else { "1" };
    vec![
        vec![x[0].to_string(), x[1].to_string()],
        vec![y[0].to_string(), y[1].to_string()],
        vec![z.into(), "0".into()],
    ]
}

impl VerificationKey {
    pub fn from_json(json: &str) -> ZksbtResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ZksbtError::Serialization(format!("Invalid verification key: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> ZksbtResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ZksbtError::Config(format!("Failed to read verification key {:?}: {}", path, e))
        })?;
        Self::from_json(&contents)
    }

    pub fn to_ark(&self) -> ZksbtResult<VerifyingKey<Bn254>> {
        if self.protocol != "groth16" {
            return Err(ZksbtError::Serialization(format!(
                "unsupported protocol {:?}",
                self.protocol
            )));
        }
        if self.ic.len() != self.n_public + 1 {
            return Err(ZksbtError::Serialization(format!(
                "verification key declares {} public inputs but carries {} IC points",
                self.n_public,
                self.ic.len()
            )));
        }
        let gamma_abc_g1 = self
            .ic
            .iter()
            .map(|point| g1_from_strings(point, "IC"))
            .collect::<ZksbtResult<Vec<_>>>()?;
        Ok(VerifyingKey {
            alpha_g1: g1_from_strings(&self.vk_alpha_1, "vk_alpha_1")?,
            beta_g2: g2_from_strings(&self.vk_beta_2, "vk_beta_2")?,
            gamma_g2: g2_from_strings(&self.vk_gamma_2, "vk_gamma_2")?,
            delta_g2: g2_from_strings(&self.vk_delta_2, "vk_delta_2")?,
            gamma_abc_g1,
        })
    }

    pub fn from_ark(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            protocol: "groth16".into(),
            curve: "bn128".into(),
            n_public: vk.gamma_abc_g1.len().saturating_sub(1),
            vk_alpha_1: g1_to_strings(&vk.alpha_g1),
            vk_beta_2: g2_to_strings(&vk.beta_g2),
            vk_gamma_2: g2_to_strings(&vk.gamma_g2),
            vk_delta_2: g2_to_strings(&vk.delta_g2),
            ic: vk.gamma_abc_g1.iter().map(g1_to_strings).collect(),
        }
    }
}

// ============================================================================
// Verifier
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct ArkGroth16Verifier;

impl Verifier for ArkGroth16Verifier {
    fn verify(
        &self,
        vk: &VerificationKey,
        public_signals: &[Fr],
        proof: &NativeProof,
    ) -> ZksbtResult<bool> {
        if public_signals.len() != vk.n_public {
            return Err(ZksbtError::Crypto(format!(
                "expected {} public signals, got {}",
                vk.n_public,
                public_signals.len()
            )));
        }

        let pvk = Groth16::<Bn254>::process_vk(&vk.to_ark()?)
            .map_err(|e| ZksbtError::Crypto(format!("Failed to prepare VK: {}", e)))?;

        // Malformed points cannot verify anything; report them as a rejection.
        let proof = match native_proof_to_ark(proof) {
            Ok(proof) => proof,
            Err(e) => {
                debug!("Rejecting malformed proof: {}", e);
                return Ok(false);
            }
        };

        Groth16::<Bn254>::verify_with_processed_vk(&pvk, public_signals, &proof)
            .map_err(|e| ZksbtError::Crypto(format!("Verification error: {}", e)))
    }
}
