//! Holder identities.
//!
//! A wallet signs [`IDENTITY_KEY_MESSAGE`]; the first 32 bytes of that
//! signature are the identity's only secret material. Re-signing the message
//! regenerates the same identity, so nothing is persisted.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::fmt;
use zksbt_crypto::{fr_from_be_bytes_mod_order, poseidon_hash2_fields, random_fr};
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::addressing::CredentialAttribute;
use crate::signer::MessageSigner;

pub const IDENTITY_KEY_MESSAGE: &str = "Sign this message to generate your zkSBT Privacy Key. \
This key lets the application decrypt your identity on zkSBT.\n\n\
IMPORTANT: Only sign this message if you trust the application.";

const TRAPDOOR_RANGE: std::ops::Range<usize> = 0..16;
const NULLIFIER_RANGE: std::ops::Range<usize> = 16..32;

/// Minimum signature length accepted by [`derive_key_material`].
pub const KEY_MATERIAL_SIGNATURE_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub trapdoor: Fr,
    pub nullifier: Fr,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED])")
    }
}

/// Reads the trapdoor from signature bytes `[0, 16)` and the nullifier from
/// `[16, 32)`, each as a big-endian integer.
pub fn derive_key_material(signature: &[u8]) -> ZksbtResult<KeyMaterial> {
    if signature.len() < KEY_MATERIAL_SIGNATURE_LEN {
        return Err(ZksbtError::InvalidSignatureLength {
            required: KEY_MATERIAL_SIGNATURE_LEN,
            actual: signature.len(),
        });
    }
    Ok(KeyMaterial {
        trapdoor: fr_from_be_bytes_mod_order(&signature[TRAPDOOR_RANGE]),
        nullifier: fr_from_be_bytes_mod_order(&signature[NULLIFIER_RANGE]),
    })
}

pub fn commitment(trapdoor: &Fr, nullifier: &Fr) -> Fr {
    poseidon_hash2_fields(*trapdoor, *nullifier)
}

#[derive(Clone)]
pub struct Identity {
    keys: KeyMaterial,
    commitment: Fr,
}

impl Identity {
    pub fn from_key_material(keys: KeyMaterial) -> Self {
        let commitment = commitment(&keys.trapdoor, &keys.nullifier);
        Self { keys, commitment }
    }

    pub fn from_signature(signature: &[u8]) -> ZksbtResult<Self> {
        Ok(Self::from_key_material(derive_key_material(signature)?))
    }

    /// Asks the wallet to sign [`IDENTITY_KEY_MESSAGE`] and derives from it.
    pub async fn from_signer<S: MessageSigner + ?Sized>(signer: &S) -> ZksbtResult<Self> {
        let signature = signer.sign_message(IDENTITY_KEY_MESSAGE.as_bytes()).await?;
        Self::from_signature(&signature.to_bytes())
    }

    /// Throwaway identity not tied to any wallet.
    pub fn random() -> Self {
        Self::from_key_material(KeyMaterial {
            trapdoor: random_fr(),
            nullifier: random_fr(),
        })
    }

    pub fn trapdoor(&self) -> &Fr {
        &self.keys.trapdoor
    }

    pub fn nullifier(&self) -> &Fr {
        &self.keys.nullifier
    }

    pub fn commitment(&self) -> Fr {
        self.commitment
    }

    /// One-time tag for this identity under `salt`. The ledger refuses a
    /// second proof carrying the same value for the same pool.
    pub fn nullifier_hash(&self, salt: &Fr) -> Fr {
        poseidon_hash2_fields(*salt, self.keys.nullifier)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity(commitment={})", crate::field::fr_to_decimal(&self.commitment))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub begin: u64,
    pub end: u64,
}

impl ValidityWindow {
    pub fn contains(&self, timestamp: u64) -> bool {
        self.begin <= timestamp && timestamp <= self.end
    }
}

/// Issuance facts a per-credential leaf is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBinding {
    pub sbt_id: u128,
    pub verify_timestamp: u64,
    pub attribute: CredentialAttribute,
    #[serde(default)]
    pub window: Option<ValidityWindow>,
}

impl CredentialBinding {
    pub fn new(sbt_id: u128, verify_timestamp: u64, attribute: CredentialAttribute) -> Self {
        Self {
            sbt_id,
            verify_timestamp,
            attribute,
            window: None,
        }
    }

    pub fn with_window(mut self, window: ValidityWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn attribute_hash(&self) -> Fr {
        self.attribute.field_hash()
    }
}

/// How a pool turns a base identity commitment into its tree leaf. Fixed per
/// deployment; the ledger and the prover must use the same scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafScheme {
    /// `leaf = commitment`
    Raw,
    /// `leaf = H(commitment, sbtId)`
    SbtBound,
    /// `leaf = H(H(H(commitment, sbtId), verifyTimestamp), attributeHash)`
    Certified,
}

impl LeafScheme {
    pub fn requires_binding(&self) -> bool {
        !matches!(self, LeafScheme::Raw)
    }

    pub fn identity_commitment(
        &self,
        base: Fr,
        binding: Option<&CredentialBinding>,
    ) -> ZksbtResult<Fr> {
        match self {
            LeafScheme::Raw => Ok(base),
            LeafScheme::SbtBound => {
                let b = need(binding, self)?;
                Ok(poseidon_hash2_fields(base, Fr::from(b.sbt_id)))
            }
            LeafScheme::Certified => {
                let b = need(binding, self)?;
                let with_id = poseidon_hash2_fields(base, Fr::from(b.sbt_id));
                let with_time = poseidon_hash2_fields(with_id, Fr::from(b.verify_timestamp));
                Ok(poseidon_hash2_fields(with_time, b.attribute_hash()))
            }
        }
    }
}

fn need<'b>(
    binding: Option<&'b CredentialBinding>,
    scheme: &LeafScheme,
) -> ZksbtResult<&'b CredentialBinding> {
    binding.ok_or_else(|| {
        ZksbtError::Internal(format!("{:?} leaves need a credential binding", scheme))
    })
}
