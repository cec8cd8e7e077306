//! Credential addressing.
//!
//! A credential is addressed by `(category, attribute, id)` packed into one
//! 256-bit word:
//!
//! ```text
//! | 255 ..... 192 | 191 ........ 128 | 127 .......... 0 |
//! |   category    |  attribute code  |   allocated id   |
//! ```
//!
//! `(category, attribute)` alone names a pool. How an attribute is encoded
//! depends on the category and is decided here and nowhere else.

use ark_bn254::Fr;
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use zksbt_crypto::{fr_from_be_bytes_mod_order, fr_to_be_bytes, keccak256};
use zksbt_types::{ClaimAddress, ZksbtError, ZksbtResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub u64);

impl Category {
    pub const ZKBAB: Category = Category(1);
    pub const ZKKYC: Category = Category(2);
    pub const POMP_ETH: Category = Category(12);
    pub const POMP_BNB: Category = Category(13);

    pub fn encoding(&self) -> AttributeEncoding {
        match *self {
            Category::POMP_ETH | Category::POMP_BNB => AttributeEncoding::Numeric,
            Category::ZKBAB => AttributeEncoding::None,
            _ => AttributeEncoding::Text,
        }
    }

    pub fn is_pomp(&self) -> bool {
        self.encoding() == AttributeEncoding::Numeric
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Balance ranges accepted by the proof-of-membership categories.
pub const POMP_RANGES: [u64; 4] = [0, 1, 10, 100];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeEncoding {
    Numeric,
    Text,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum CredentialAttribute {
    Numeric(u64),
    Text(String),
    None,
}

impl CredentialAttribute {
    /// Parses the wire form of an attribute under `category`'s encoding.
    pub fn parse(category: Category, raw: &str) -> ZksbtResult<Self> {
        let attribute = match category.encoding() {
            AttributeEncoding::Numeric => {
                let value = raw.trim().parse::<u64>().map_err(|e| ZksbtError::InvalidAttribute {
                    category: category.0,
                    reason: format!("{:?} is not a number: {}", raw, e),
                })?;
                CredentialAttribute::Numeric(value)
            }
            AttributeEncoding::Text => CredentialAttribute::Text(raw.to_string()),
            AttributeEncoding::None => {
                if !raw.is_empty() {
                    return Err(ZksbtError::InvalidAttribute {
                        category: category.0,
                        reason: "category takes no attribute".into(),
                    });
                }
                CredentialAttribute::None
            }
        };
        attribute.validate_for(category)?;
        Ok(attribute)
    }

    pub fn validate_for(&self, category: Category) -> ZksbtResult<()> {
        let invalid = |reason: String| ZksbtError::InvalidAttribute {
            category: category.0,
            reason,
        };
        match (category.encoding(), self) {
            (AttributeEncoding::Numeric, CredentialAttribute::Numeric(value)) => {
                if category.is_pomp() && !POMP_RANGES.contains(value) {
                    return Err(invalid(format!("{} is not a supported range", value)));
                }
                Ok(())
            }
            (AttributeEncoding::Text, CredentialAttribute::Text(_)) => Ok(()),
            (AttributeEncoding::None, CredentialAttribute::None) => Ok(()),
            (expected, _) => Err(invalid(format!("expected {:?} attribute, got {}", expected, self))),
        }
    }

    /// 64-bit code stored in the middle of a packed address. Text is
    /// reduced to the first 8 bytes of its keccak256 digest.
    pub fn code(&self) -> u64 {
        match self {
            CredentialAttribute::Numeric(value) => *value,
            CredentialAttribute::Text(text) => {
                let digest = keccak256(text.as_bytes());
                let mut head = [0u8; 8];
                head.copy_from_slice(&digest[..8]);
                u64::from_be_bytes(head)
            }
            CredentialAttribute::None => 0,
        }
    }

    /// `keccak256(attribute) mod r`, the attribute term of a certified leaf.
    pub fn field_hash(&self) -> Fr {
        fr_from_be_bytes_mod_order(&keccak256(self.to_string().as_bytes()))
    }
}

impl fmt::Display for CredentialAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialAttribute::Numeric(value) => write!(f, "{}", value),
            CredentialAttribute::Text(text) => write!(f, "{}", text),
            CredentialAttribute::None => Ok(()),
        }
    }
}

/// Names one pool: one Merkle tree, one salt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    pub category: Category,
    pub attribute: CredentialAttribute,
}

impl PoolKey {
    pub fn new(category: Category, attribute: CredentialAttribute) -> ZksbtResult<Self> {
        attribute.validate_for(category)?;
        Ok(Self {
            category,
            attribute,
        })
    }

    pub fn pomp(category: Category, range: u64) -> ZksbtResult<Self> {
        Self::new(category, CredentialAttribute::Numeric(range))
    }

    pub fn metadata(&self) -> PoolMetadata {
        PoolMetadata {
            category: self.category,
            attribute_code: self.attribute.code(),
        }
    }

    pub fn descriptor(&self, id: u128) -> CredentialDescriptor {
        CredentialDescriptor {
            category: self.category,
            attribute: self.attribute.clone(),
            id,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.attribute)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    pub category: Category,
    pub attribute: CredentialAttribute,
    pub id: u128,
}

impl CredentialDescriptor {
    pub fn pool(&self) -> PoolKey {
        PoolKey {
            category: self.category,
            attribute: self.attribute.clone(),
        }
    }

    pub fn pack(&self) -> U256 {
        pack(self.category, &self.attribute, self.id)
    }
}

/// What survives `unpack`: the pool, without the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolMetadata {
    pub category: Category,
    pub attribute_code: u64,
}

pub fn pack(category: Category, attribute: &CredentialAttribute, id: u128) -> U256 {
    (U256::from(category.0) << 192) | (U256::from(attribute.code()) << 128) | U256::from(id)
}

pub fn unpack(address: U256) -> PoolMetadata {
    PoolMetadata {
        category: Category((address >> 192).low_u64()),
        attribute_code: (address >> 128).low_u64(),
    }
}

/// Low 160 bits of a commitment. Lossy: callers must compare the full
/// commitment before treating two equal claim addresses as the same holder.
pub fn claim_address(commitment: &Fr) -> ClaimAddress {
    ClaimAddress::from_commitment_bytes(&fr_to_be_bytes(commitment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_pomp_pool() {
        let packed = pack(Category::POMP_ETH, &CredentialAttribute::Numeric(100), 1);
        let meta = unpack(packed);
        assert_eq!(meta.category, Category(12));
        assert_eq!(meta.attribute_code, 100);
        assert_eq!(packed.low_u128(), 1);
    }

    #[test]
    fn test_unpack_ignores_id() {
        let attr = CredentialAttribute::Text("KR".into());
        let a = pack(Category::ZKKYC, &attr, 1);
        let b = pack(Category::ZKKYC, &attr, u128::MAX);
        assert_ne!(a, b);
        assert_eq!(unpack(a), unpack(b));
    }

    #[test]
    fn test_category_encodings() {
        assert_eq!(Category::POMP_BNB.encoding(), AttributeEncoding::Numeric);
        assert_eq!(Category::ZKKYC.encoding(), AttributeEncoding::Text);
        assert_eq!(Category::ZKBAB.encoding(), AttributeEncoding::None);
        assert_eq!(Category(77).encoding(), AttributeEncoding::Text);
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            CredentialAttribute::parse(Category::POMP_ETH, "10").unwrap(),
            CredentialAttribute::Numeric(10)
        );
        assert!(CredentialAttribute::parse(Category::POMP_ETH, "ten").is_err());
        assert!(CredentialAttribute::parse(Category::POMP_ETH, "5").is_err());
        assert_eq!(
            CredentialAttribute::parse(Category::ZKBAB, "").unwrap(),
            CredentialAttribute::None
        );
        assert!(CredentialAttribute::parse(Category::ZKBAB, "x").is_err());
    }

    #[test]
    fn test_pool_key_rejects_wrong_shape() {
        assert!(PoolKey::new(Category::ZKKYC, CredentialAttribute::Numeric(1)).is_err());
        assert!(PoolKey::pomp(Category::POMP_ETH, 100).is_ok());
    }

    #[test]
    fn test_text_code_is_keccak_prefix() {
        let attr = CredentialAttribute::Text("".into());
        // keccak256("") = c5d24601 86f7233c ...
        assert_eq!(attr.code(), 0xc5d2_4601_86f7_233c);
    }

    #[test]
    fn test_claim_address_collides_on_high_bits() {
        let low = Fr::from(0xdead_beefu64);
        let high = low + fr_from_be_bytes_mod_order(&{
            let mut b = [0u8; 32];
            b[0] = 0x01;
            b
        });
        assert_ne!(low, high);
        assert_eq!(claim_address(&low), claim_address(&high));
    }

    proptest! {
        #[test]
        fn prop_pack_unpack(category in any::<u64>(), code in any::<u64>(), id in any::<u128>()) {
            let meta = unpack(pack(Category(category), &CredentialAttribute::Numeric(code), id));
            prop_assert_eq!(meta.category, Category(category));
            prop_assert_eq!(meta.attribute_code, code);
        }
    }
}
