use sha3::{Digest, Keccak256};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zksbt_types::{
    EcdsaSignature, EthAddress, Secp256k1PrivateKey, Secp256k1PublicKey, ZksbtError,
    ZksbtResult, SECP256K1_PRIVATE_KEY_SIZE,
};

thread_local! {
    static SECP256K1_CTX: Secp256k1<secp256k1::All> = Secp256k1::new();
}

pub fn generate_private_key() -> Secp256k1PrivateKey {
    loop {
        let bytes = crate::random_bytes::<SECP256K1_PRIVATE_KEY_SIZE>();
        if SecretKey::from_slice(&bytes).is_ok() {
            return Secp256k1PrivateKey::from_bytes(bytes);
        }
    }
}

fn derive_public_key(private_key: &Secp256k1PrivateKey) -> ZksbtResult<Secp256k1PublicKey> {
    SECP256K1_CTX.with(|ctx| {
        let secret = SecretKey::from_slice(private_key.as_bytes())
            .map_err(|e| ZksbtError::InvalidKey(e.to_string()))?;
        let public = PublicKey::from_secret_key(ctx, &secret);
        Ok(Secp256k1PublicKey::from_bytes(public.serialize()))
    })
}

pub fn derive_eth_address(public_key: &Secp256k1PublicKey) -> ZksbtResult<EthAddress> {
    let pubkey = PublicKey::from_slice(public_key.as_bytes())
        .map_err(|e| ZksbtError::InvalidKey(e.to_string()))?;

    let uncompressed = pubkey.serialize_uncompressed();
    let hash = Keccak256::digest(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(EthAddress::from_bytes(address))
}

pub fn derive_eth_address_from_private(
    private_key: &Secp256k1PrivateKey,
) -> ZksbtResult<EthAddress> {
    let public_key = derive_public_key(private_key)?;
    derive_eth_address(&public_key)
}

pub fn sign_message(
    private_key: &Secp256k1PrivateKey,
    message_hash: &[u8; 32],
) -> ZksbtResult<EcdsaSignature> {
    SECP256K1_CTX.with(|ctx| {
        let secret = SecretKey::from_slice(private_key.as_bytes())
            .map_err(|e| ZksbtError::InvalidKey(e.to_string()))?;
        let message = Message::from_digest_slice(message_hash)
            .map_err(|e| ZksbtError::Crypto(e.to_string()))?;

        let (recovery_id, signature) = ctx
            .sign_ecdsa_recoverable(&message, &secret)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&signature[..32]);
        s.copy_from_slice(&signature[32..]);

        let v = recovery_id.to_i32() as u8 + 27;

        Ok(EcdsaSignature::new(r, s, v))
    })
}

/// Signs `message` under the EIP-191 personal-message prefix.
pub fn sign_personal_message(
    private_key: &Secp256k1PrivateKey,
    message: &[u8],
) -> ZksbtResult<EcdsaSignature> {
    let hash = personal_message_hash(message);
    sign_message(private_key, &hash)
}

pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

pub fn recover_public_key(
    signature: &EcdsaSignature,
    message_hash: &[u8; 32],
) -> ZksbtResult<Secp256k1PublicKey> {
    SECP256K1_CTX.with(|ctx| {
        let v = if signature.v >= 27 {
            signature.v - 27
        } else {
            signature.v
        };

        let recovery_id = secp256k1::ecdsa::RecoveryId::from_i32(v as i32)
            .map_err(|e| ZksbtError::InvalidSignature(e.to_string()))?;

        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&signature.r);
        sig_bytes[32..].copy_from_slice(&signature.s);

        let recoverable_sig =
            secp256k1::ecdsa::RecoverableSignature::from_compact(&sig_bytes, recovery_id)
                .map_err(|e| ZksbtError::InvalidSignature(e.to_string()))?;

        let message = Message::from_digest_slice(message_hash)
            .map_err(|e| ZksbtError::Crypto(e.to_string()))?;

        let public_key = ctx
            .recover_ecdsa(&message, &recoverable_sig)
            .map_err(|e| ZksbtError::InvalidSignature(e.to_string()))?;

        Ok(Secp256k1PublicKey::from_bytes(public_key.serialize()))
    })
}

/// Address that produced `signature` over the EIP-191 form of `message`.
pub fn recover_personal_signer(
    message: &[u8],
    signature: &EcdsaSignature,
) -> ZksbtResult<EthAddress> {
    let hash = personal_message_hash(message);
    let public_key = recover_public_key(signature, &hash)?;
    derive_eth_address(&public_key)
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation_and_derivation() {
        let private_key = generate_private_key();
        let public_key = derive_public_key(&private_key).unwrap();
        let address = derive_eth_address(&public_key).unwrap();

        let hex = address.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 42);
    }

    #[test]
    fn test_known_address() {
        // Private key 1 maps to the generator point's well-known address.
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let key = Secp256k1PrivateKey::from_bytes(bytes);
        let address = derive_eth_address_from_private(&key).unwrap();
        assert_eq!(
            address.to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let private_key = generate_private_key();
        let address = derive_eth_address_from_private(&private_key).unwrap();
        let signer_of = |hash: &[u8; 32], sig: &EcdsaSignature| {
            recover_public_key(sig, hash).and_then(|pk| derive_eth_address(&pk))
        };

        let message_hash = keccak256(b"zksbt claim");
        let signature = sign_message(&private_key, &message_hash).unwrap();
        assert_eq!(signer_of(&message_hash, &signature).unwrap(), address);

        let wrong_hash = keccak256(b"wrong message");
        assert_ne!(signer_of(&wrong_hash, &signature).ok(), Some(address));
    }

    #[test]
    fn test_generated_keys_are_valid_scalars() {
        for _ in 0..8 {
            let key = generate_private_key();
            assert!(SecretKey::from_slice(key.as_bytes()).is_ok());
            assert!(derive_public_key(&key).is_ok());
        }
    }

    #[test]
    fn test_personal_message_recovery() {
        let private_key = generate_private_key();
        let address = derive_eth_address_from_private(&private_key).unwrap();

        let signature = sign_personal_message(&private_key, b"hello").unwrap();
        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(recover_personal_signer(b"hello", &signature).unwrap(), address);
        assert_ne!(recover_personal_signer(b"hellp", &signature).unwrap(), address);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = Secp256k1PrivateKey::from_bytes([0x42; 32]);
        let a = sign_personal_message(&key, b"same").unwrap();
        let b = sign_personal_message(&key, b"same").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_recovery_id() {
        let sig = EcdsaSignature::new([1u8; 32], [1u8; 32], 40);
        assert!(recover_personal_signer(b"x", &sig).is_err());
    }

    #[test]
    fn test_personal_hash_known_vector() {
        // keccak256("\x19Ethereum Signed Message:\n5hello")
        assert_eq!(
            hex::encode(personal_message_hash(b"hello")),
            "50b2c43fd39106bafbba0da34fc430e1f91e3c96ea2acee2bc34119f92b37750"
        );
    }
}
