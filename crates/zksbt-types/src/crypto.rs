use crate::constants::*;
use crate::error::{ZksbtError, ZksbtResult};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::fmt;
use zeroize::Zeroize;

#[derive(Clone, Serialize, Deserialize)]
pub struct Secp256k1PrivateKey(pub [u8; SECP256K1_PRIVATE_KEY_SIZE]);

impl Secp256k1PrivateKey {
    pub fn from_bytes(bytes: [u8; SECP256K1_PRIVATE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECP256K1_PRIVATE_KEY_SIZE] {
        &self.0
    }

    pub fn from_hex(s: &str) -> ZksbtResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = hex::decode(s).map_err(|e| ZksbtError::InvalidKey(e.to_string()))?;
        if bytes.len() != SECP256K1_PRIVATE_KEY_SIZE {
            bytes.zeroize();
            return Err(ZksbtError::InvalidKey("Invalid private key length".into()));
        }
        let mut arr = [0u8; SECP256K1_PRIVATE_KEY_SIZE];
        arr.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(arr))
    }
}

impl fmt::Debug for Secp256k1PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1PrivateKey([REDACTED])")
    }
}

impl Drop for Secp256k1PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Secp256k1PublicKey(
    #[serde_as(as = "serde_with::Bytes")] pub [u8; SECP256K1_PUBLIC_KEY_SIZE],
);

impl Secp256k1PublicKey {
    pub fn from_bytes(bytes: [u8; SECP256K1_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECP256K1_PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1PublicKey({})", self.to_hex())
    }
}

/// 65-byte recoverable signature laid out as `r || s || v`, with `v` in
/// the Ethereum 27/28 convention.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl EcdsaSignature {
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    pub fn to_bytes(&self) -> [u8; ECDSA_SIGNATURE_SIZE] {
        let mut bytes = [0u8; ECDSA_SIGNATURE_SIZE];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; ECDSA_SIGNATURE_SIZE]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self {
            r,
            s,
            v: bytes[64],
        }
    }

    pub fn from_slice(bytes: &[u8]) -> ZksbtResult<Self> {
        let arr: &[u8; ECDSA_SIGNATURE_SIZE] = bytes.try_into().map_err(|_| {
            ZksbtError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                ECDSA_SIGNATURE_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn from_hex(s: &str) -> ZksbtResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ZksbtError::InvalidSignature(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaSignature(v={})", self.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_debug_redacted() {
        let key = Secp256k1PrivateKey::from_bytes([7u8; 32]);
        assert_eq!(format!("{:?}", key), "Secp256k1PrivateKey([REDACTED])");
    }

    #[test]
    fn test_private_key_from_hex() {
        let hex_key = format!("0x{}", "01".repeat(32));
        let key = Secp256k1PrivateKey::from_hex(&hex_key).unwrap();
        assert_eq!(key.as_bytes(), &[1u8; 32]);
        assert!(Secp256k1PrivateKey::from_hex("0x01").is_err());
    }

    #[test]
    fn test_signature_byte_layout() {
        let sig = EcdsaSignature::new([1u8; 32], [2u8; 32], 28);
        let bytes = sig.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[32], 2);
        assert_eq!(bytes[64], 28);
        assert_eq!(EcdsaSignature::from_bytes(&bytes), sig);
    }

    #[test]
    fn test_signature_from_short_slice() {
        let err = EcdsaSignature::from_slice(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, ZksbtError::InvalidSignature(_)));
    }
}
