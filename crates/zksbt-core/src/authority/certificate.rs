use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use zksbt_types::{EcdsaSignature, EthAddress, ZksbtResult};

use crate::addressing::PoolKey;
use crate::field::fr_to_decimal;
use crate::signer::recover_signer;

/// Message a holder signs to request a credential in `pool`.
pub fn claim_message(claimant: &Fr, pool: &PoolKey) -> String {
    format!(
        "claim credential: identity={} category={} attribute={}",
        fr_to_decimal(claimant),
        pool.category,
        pool.attribute
    )
}

/// Message the issuer signs; the claim plus the allocated id and issuance
/// time in milliseconds.
pub fn certificate_message(
    claimant: &Fr,
    pool: &PoolKey,
    sbt_id: u128,
    verify_timestamp: u64,
) -> String {
    format!(
        "{} sbtId={} verifyTimestamp={}",
        claim_message(claimant, pool),
        sbt_id,
        verify_timestamp
    )
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub eligible: bool,
    pub sbt_id: u128,
    pub verify_timestamp: u64,
    pub signature: Option<EcdsaSignature>,
}

impl Certificate {
    /// Negative answer. Carries no id, no time and no signature, so it says
    /// nothing about why the policy refused.
    pub fn ineligible() -> Self {
        Self {
            eligible: false,
            sbt_id: 0,
            verify_timestamp: 0,
            signature: None,
        }
    }

    /// Hex signature, or the empty string for an ineligible answer.
    pub fn signature_hex(&self) -> String {
        self.signature.map(|s| s.to_hex()).unwrap_or_default()
    }

    pub fn signer(&self, claimant: &Fr, pool: &PoolKey) -> ZksbtResult<Option<EthAddress>> {
        let Some(signature) = &self.signature else {
            return Ok(None);
        };
        let message = certificate_message(claimant, pool, self.sbt_id, self.verify_timestamp);
        recover_signer(message.as_bytes(), signature).map(Some)
    }

    /// True only if `issuer` signed exactly this claimant, pool, id and time.
    pub fn verify(&self, claimant: &Fr, pool: &PoolKey, issuer: &EthAddress) -> bool {
        self.eligible
            && matches!(self.signer(claimant, pool), Ok(Some(signer)) if signer == *issuer)
    }
}
