//! Poseidon hash over the BN254 scalar field.
//!
//! Every commitment, nullifier hash and Merkle node in zkSBT goes through
//! this one instance, so the prover's circuit and the native code agree.
//!
//! ## Parameters
//! - Field: BN254 Fr
//! - Width: 3 (rate=2, capacity=1)
//! - Full rounds: 8
//! - Partial rounds: 57
//! - S-box: x^5
//! - Round constants: Grain LFSR (arkworks standard)
//!
//! Output is the first squeezed element.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::{BigInteger, PrimeField};
use std::sync::OnceLock;
use zksbt_types::{ZksbtError, ZksbtResult, FIELD_ELEMENT_SIZE};

static CANONICAL_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

pub fn canonical_config() -> &'static PoseidonConfig<Fr> {
    CANONICAL_CONFIG.get_or_init(|| {
        let rate = 2;
        let alpha = 5u64;
        let full_rounds = 8;
        let partial_rounds = 57;
        let field_bits = 254;

        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            field_bits,
            rate,
            full_rounds,
            partial_rounds,
            0, // skip_matrices
        );

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

pub fn poseidon_hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(canonical_config());
    for input in inputs {
        sponge.absorb(input);
    }
    let output: Vec<Fr> = sponge.squeeze_field_elements(1);
    output[0]
}

/// Two-to-one compression for Merkle nodes and commitments.
pub fn poseidon_hash2_fields(left: Fr, right: Fr) -> Fr {
    poseidon_hash_fields(&[left, right])
}

// ============================================================================
// Byte Interface (32-byte big-endian, the EVM word layout)
// ============================================================================

pub fn fr_to_be_bytes(f: &Fr) -> [u8; FIELD_ELEMENT_SIZE] {
    let bytes = f.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_ELEMENT_SIZE];
    out[FIELD_ELEMENT_SIZE - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Strict conversion: rejects encodings at or above the field modulus.
pub fn fr_from_be_bytes(bytes: &[u8; FIELD_ELEMENT_SIZE]) -> ZksbtResult<Fr> {
    let f = Fr::from_be_bytes_mod_order(bytes);
    if fr_to_be_bytes(&f) != *bytes {
        return Err(ZksbtError::InvalidFieldElement(format!(
            "0x{} is not a canonical BN254 scalar",
            hex::encode(bytes)
        )));
    }
    Ok(f)
}

pub fn fr_from_be_bytes_mod_order(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_hash_deterministic() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);
        assert_eq!(poseidon_hash2_fields(a, b), poseidon_hash2_fields(a, b));
    }

    #[test]
    fn test_known_answer() {
        let expected = Fr::from_str(
            "7142104613055408817911962100316808866448378443474503659992478482890339429929",
        )
        .unwrap();
        assert_eq!(poseidon_hash2_fields(Fr::from(1u64), Fr::from(2u64)), expected);
    }

    #[test]
    fn test_hash_order_matters() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);
        assert_ne!(poseidon_hash2_fields(a, b), poseidon_hash2_fields(b, a));
    }

    #[test]
    fn test_arity_separates_outputs() {
        let a = Fr::from(5u64);
        let b = Fr::from(6u64);
        assert_ne!(
            poseidon_hash2_fields(a, b),
            poseidon_hash_fields(&[a, b, Fr::from(0u64)])
        );
    }

    #[test]
    fn test_be_bytes_layout() {
        let bytes = fr_to_be_bytes(&Fr::from(0x0102u64));
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rejects_non_canonical() {
        let err = fr_from_be_bytes(&[0xff; 32]).unwrap_err();
        assert!(matches!(err, ZksbtError::InvalidFieldElement(_)));
    }

    proptest! {
        #[test]
        fn prop_be_bytes_round_trip(x in any::<u64>(), y in any::<u64>()) {
            let f = Fr::from(x) * Fr::from(y) + Fr::from(7u64);
            let bytes = fr_to_be_bytes(&f);
            prop_assert_eq!(fr_from_be_bytes(&bytes).unwrap(), f);
        }
    }
}
