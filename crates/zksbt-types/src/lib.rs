#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;

pub use address::{ClaimAddress, EthAddress};
pub use constants::*;
pub use crypto::{EcdsaSignature, Secp256k1PrivateKey, Secp256k1PublicKey};
pub use error::{ZksbtError, ZksbtResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_address() {
        let addr = EthAddress::from_bytes([
            0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99,
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
        ]);
        let hex = addr.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 42);

        let parsed = EthAddress::from_hex(&hex).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_eip55_checksum() {
        // Reference vector from EIP-55.
        let addr = EthAddress::from_hex("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(addr.to_checksum(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_signature_hex() {
        let sig = EcdsaSignature::new([0x11; 32], [0x22; 32], 27);
        let hex = sig.to_hex();
        assert_eq!(hex.len(), 2 + 130);

        let parsed = EcdsaSignature::from_hex(&hex).unwrap();
        assert_eq!(parsed, sig);

        assert!(EcdsaSignature::from_hex("0x1234").is_err());
    }

    #[test]
    fn test_retryable_errors() {
        let conflict = ZksbtError::IdAllocationConflict {
            pool: "12/100".into(),
            id: 7,
        };
        assert!(conflict.is_retryable());

        let revert = ZksbtError::LedgerRevert("zksbt exist!".into());
        assert!(!revert.is_retryable());
    }
}
