#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod poseidon;
pub mod secp256k1_ops;

pub use poseidon::{
    canonical_config, fr_from_be_bytes, fr_from_be_bytes_mod_order, fr_to_be_bytes,
    poseidon_hash2_fields, poseidon_hash_fields,
};
pub use secp256k1_ops::*;

pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Uniformly random scalar, used for salts and fresh identities.
pub fn random_fr() -> ark_bn254::Fr {
    use ark_ff::UniformRand;
    ark_bn254::Fr::rand(&mut rand::thread_rng())
}
