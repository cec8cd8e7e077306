use async_trait::async_trait;
use zksbt_crypto::{
    derive_eth_address_from_private, generate_private_key, recover_personal_signer,
    sign_personal_message,
};
use zksbt_types::{EcdsaSignature, EthAddress, Secp256k1PrivateKey, ZksbtResult};

/// A wallet able to produce EIP-191 personal-message signatures.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    fn address(&self) -> EthAddress;

    async fn sign_message(&self, message: &[u8]) -> ZksbtResult<EcdsaSignature>;
}

pub fn recover_signer(message: &[u8], signature: &EcdsaSignature) -> ZksbtResult<EthAddress> {
    recover_personal_signer(message, signature)
}

/// In-process secp256k1 key. Signing is deterministic (RFC 6979).
pub struct LocalSigner {
    key: Secp256k1PrivateKey,
    address: EthAddress,
}

impl LocalSigner {
    pub fn new(key: Secp256k1PrivateKey) -> ZksbtResult<Self> {
        let address = derive_eth_address_from_private(&key)?;
        Ok(Self { key, address })
    }

    pub fn from_hex(hex_key: &str) -> ZksbtResult<Self> {
        Self::new(Secp256k1PrivateKey::from_hex(hex_key)?)
    }

    pub fn random() -> ZksbtResult<Self> {
        Self::new(generate_private_key())
    }

    pub fn private_key(&self) -> &Secp256k1PrivateKey {
        &self.key
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSigner({})", self.address)
    }
}

#[async_trait]
impl MessageSigner for LocalSigner {
    fn address(&self) -> EthAddress {
        self.address
    }

    async fn sign_message(&self, message: &[u8]) -> ZksbtResult<EcdsaSignature> {
        sign_personal_message(&self.key, message)
    }
}
