use crate::constants::{CLAIM_ADDRESS_SIZE, ETH_ADDRESS_SIZE, FIELD_ELEMENT_SIZE};
use crate::error::{ZksbtError, ZksbtResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EthAddress(pub [u8; ETH_ADDRESS_SIZE]);

impl EthAddress {
    pub fn from_bytes(bytes: [u8; ETH_ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ETH_ADDRESS_SIZE] {
        &self.0
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let hex_addr = hex::encode(self.0);
        let hash = Keccak256::digest(hex_addr.as_bytes());
        let hash_hex = hex::encode(hash);

        let mut checksummed = String::with_capacity(42);
        checksummed.push_str("0x");

        for (c, h) in hex_addr.chars().zip(hash_hex.chars()) {
            if c.is_ascii_alphabetic() && h >= '8' {
                checksummed.push(c.to_ascii_uppercase());
            } else {
                checksummed.push(c);
            }
        }
        checksummed
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> ZksbtResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ZksbtError::InvalidAddress(e.to_string()))?;
        if bytes.len() != ETH_ADDRESS_SIZE {
            return Err(ZksbtError::InvalidAddress("Invalid address length".into()));
        }
        let mut arr = [0u8; ETH_ADDRESS_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn zero() -> Self {
        Self([0u8; ETH_ADDRESS_SIZE])
    }

    /// Lowercase hex without prefix, as it appears inside signed messages.
    pub fn to_message_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for EthAddress {
    type Err = ZksbtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_checksum())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl Default for EthAddress {
    fn default() -> Self {
        Self::zero()
    }
}

/// Legacy 160-bit address carved from the low bytes of an identity
/// commitment. Two commitments can share one; the allocator keeps the full
/// commitment next to it and rejects the second binding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimAddress(pub [u8; CLAIM_ADDRESS_SIZE]);

impl ClaimAddress {
    /// Takes the last 20 bytes of a big-endian commitment encoding.
    pub fn from_commitment_bytes(commitment_be: &[u8; FIELD_ELEMENT_SIZE]) -> Self {
        let mut arr = [0u8; CLAIM_ADDRESS_SIZE];
        arr.copy_from_slice(&commitment_be[FIELD_ELEMENT_SIZE - CLAIM_ADDRESS_SIZE..]);
        Self(arr)
    }

    pub fn as_bytes(&self) -> &[u8; CLAIM_ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ClaimAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimAddress({})", self.to_hex())
    }
}

impl fmt::Display for ClaimAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_rejects_bad_length() {
        assert!(EthAddress::from_hex("0x1234").is_err());
        assert!(EthAddress::from_hex("zz").is_err());
    }

    #[test]
    fn test_from_str_accepts_unprefixed() {
        let addr: EthAddress = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(addr.as_bytes()[19], 0xff);
    }

    #[test]
    fn test_claim_address_takes_low_bytes() {
        let mut commitment = [0u8; 32];
        for (i, b) in commitment.iter_mut().enumerate() {
            *b = i as u8;
        }
        let claim = ClaimAddress::from_commitment_bytes(&commitment);
        assert_eq!(claim.as_bytes()[0], 12);
        assert_eq!(claim.as_bytes()[19], 31);
    }

    #[test]
    fn test_claim_address_ignores_high_bytes() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        a[31] = 9;
        b[31] = 9;
        b[0] = 0x01;
        assert_eq!(
            ClaimAddress::from_commitment_bytes(&a),
            ClaimAddress::from_commitment_bytes(&b)
        );
    }
}
