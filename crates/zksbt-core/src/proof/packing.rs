//! Flat proof layout.
//!
//! The EVM precompiles read Fq2 elements as `(c1, c0)`, so each row of `b`
//! is written in reverse:
//!
//! ```text
//! [a0, a1, b[0][1], b[0][0], b[1][1], b[1][0], c0, c1]
//! ```

use zksbt_types::{ZksbtError, ZksbtResult};

use super::types::{FlatProof, NativeProof};

pub fn pack_proof(proof: &NativeProof) -> FlatProof {
    FlatProof([
        proof.a[0],
        proof.a[1],
        proof.b[0][1],
        proof.b[0][0],
        proof.b[1][1],
        proof.b[1][0],
        proof.c[0],
        proof.c[1],
    ])
}

pub fn unpack_proof(flat: &FlatProof) -> NativeProof {
    let w = flat.0;
    NativeProof {
        a: [w[0], w[1]],
        b: [[w[3], w[2]], [w[5], w[4]]],
        c: [w[6], w[7]],
    }
}

/// Packs `proof` and confirms the result unpacks to the same value. A
/// failure here is a bug, never bad input.
pub fn ensure_bit_exact(proof: &NativeProof) -> ZksbtResult<FlatProof> {
    let flat = pack_proof(proof);
    let back = unpack_proof(&flat);
    if back != *proof {
        return Err(ZksbtError::ProofPackingMismatch(format!(
            "packed {:?} unpacked to {:?}",
            proof, back
        )));
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;
    use proptest::prelude::*;

    fn numbered() -> NativeProof {
        let n = |i: u64| U256::from(i);
        NativeProof {
            a: [n(1), n(2)],
            b: [[n(3), n(4)], [n(5), n(6)]],
            c: [n(7), n(8)],
        }
    }

    #[test]
    fn test_b_rows_are_swapped() {
        let flat = pack_proof(&numbered());
        let got: Vec<u64> = flat.0.iter().map(|w| w.low_u64()).collect();
        assert_eq!(got, vec![1, 2, 4, 3, 6, 5, 7, 8]);
    }

    #[test]
    fn test_unpack_inverts_pack() {
        let proof = numbered();
        assert_eq!(unpack_proof(&pack_proof(&proof)), proof);
        assert_eq!(ensure_bit_exact(&proof).unwrap(), pack_proof(&proof));
    }

    proptest! {
        #[test]
        fn prop_pack_round_trip(words in proptest::array::uniform8(any::<[u64; 4]>())) {
            let w: Vec<U256> = words.iter().map(|limbs| U256(*limbs)).collect();
            let proof = NativeProof {
                a: [w[0], w[1]],
                b: [[w[2], w[3]], [w[4], w[5]]],
                c: [w[6], w[7]],
            };
            prop_assert_eq!(unpack_proof(&pack_proof(&proof)), proof);
        }
    }
}
