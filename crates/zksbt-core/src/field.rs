//! Conversions between BN254 scalars and EVM words.
//!
//! `U256` stores four little-endian `u64` limbs, the same layout as the
//! arkworks `BigInt<4>` behind `Fr`, so conversion is a limb copy plus a
//! canonicity check.

use ark_bn254::Fr;
use ark_ff::{BigInt, PrimeField};
use ethers::types::U256;
use zksbt_types::{ZksbtError, ZksbtResult};

pub fn fr_to_u256(f: &Fr) -> U256 {
    U256(f.into_bigint().0)
}

/// Rejects words at or above the scalar modulus.
pub fn u256_to_fr(value: U256) -> ZksbtResult<Fr> {
    Fr::from_bigint(BigInt(value.0)).ok_or_else(|| {
        ZksbtError::InvalidFieldElement(format!("{} exceeds the BN254 scalar modulus", value))
    })
}

pub fn u256_to_fr_mod_order(value: U256) -> Fr {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    Fr::from_be_bytes_mod_order(&bytes)
}

/// Decimal rendering used in signed messages and circuit inputs.
pub fn fr_to_decimal(f: &Fr) -> String {
    fr_to_u256(f).to_string()
}

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_u256(s: &str) -> ZksbtResult<U256> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    };
    parsed.ok_or_else(|| ZksbtError::Serialization(format!("invalid integer literal: {:?}", s)))
}

pub fn parse_fr(s: &str) -> ZksbtResult<Fr> {
    u256_to_fr(parse_u256(s)?)
}

/// Serde adapter writing `Fr` as a decimal string, the snarkjs convention.
pub mod serde_fr {
    use super::{fr_to_decimal, parse_fr};
    use ark_bn254::Fr;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&fr_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_fr(&s).map_err(D::Error::custom)
    }
}

pub mod serde_fr_seq {
    use super::{fr_to_decimal, parse_fr};
    use ark_bn254::Fr;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&fr_to_decimal(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_fr(s).map_err(D::Error::custom))
            .collect()
    }
}
