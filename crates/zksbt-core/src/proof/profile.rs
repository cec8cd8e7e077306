//! Public-signal layouts.
//!
//! Each circuit fixes the order of its public signals. A profile records that
//! order at compile time together with the leaf scheme its pool uses, so a
//! layout mismatch is a type error rather than a failed verification.

use ark_bn254::Fr;
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::identity::{CredentialBinding, LeafScheme};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    IdentityCommitment,
    MerkleRoot,
    NullifierHash,
    ExternalNullifier,
    AttributeHash,
    WindowBegin,
    WindowEnd,
}

pub trait CircuitProfile: Send + Sync + 'static {
    const NAME: &'static str;
    const LEAF_SCHEME: LeafScheme;
    const PUBLIC_SIGNALS: &'static [SignalKind];
}

/// Every membership layout starts with root, nullifier hash and salt.
const fn has_membership_prefix(signals: &[SignalKind]) -> bool {
    signals.len() >= 3
        && matches!(signals[0], SignalKind::MerkleRoot)
        && matches!(signals[1], SignalKind::NullifierHash)
        && matches!(signals[2], SignalKind::ExternalNullifier)
}

/// Plain group membership over raw identity commitments.
pub struct MembershipProfile;

impl CircuitProfile for MembershipProfile {
    const NAME: &'static str = "membership";
    const LEAF_SCHEME: LeafScheme = LeafScheme::Raw;
    const PUBLIC_SIGNALS: &'static [SignalKind] = &[
        SignalKind::MerkleRoot,
        SignalKind::NullifierHash,
        SignalKind::ExternalNullifier,
    ];
}

/// Proof-of-membership range pools; leaves are bound to the sbt id.
pub struct PompProfile;

impl CircuitProfile for PompProfile {
    const NAME: &'static str = "pomp";
    const LEAF_SCHEME: LeafScheme = LeafScheme::SbtBound;
    const PUBLIC_SIGNALS: &'static [SignalKind] = &[
        SignalKind::MerkleRoot,
        SignalKind::NullifierHash,
        SignalKind::ExternalNullifier,
    ];
}

/// Certified leaves that also reveal the attribute hash and a validity window.
pub struct AttributedProfile;

impl CircuitProfile for AttributedProfile {
    const NAME: &'static str = "attributed";
    const LEAF_SCHEME: LeafScheme = LeafScheme::Certified;
    const PUBLIC_SIGNALS: &'static [SignalKind] = &[
        SignalKind::MerkleRoot,
        SignalKind::NullifierHash,
        SignalKind::ExternalNullifier,
        SignalKind::AttributeHash,
        SignalKind::WindowBegin,
        SignalKind::WindowEnd,
    ];
}

/// Knowledge of the secrets behind a public identity commitment. No tree is
/// involved; the backend checks this before handing out a proof key.
pub struct IdentityProfile;

impl CircuitProfile for IdentityProfile {
    const NAME: &'static str = "identity";
    const LEAF_SCHEME: LeafScheme = LeafScheme::Raw;
    const PUBLIC_SIGNALS: &'static [SignalKind] = &[
        SignalKind::IdentityCommitment,
        SignalKind::NullifierHash,
        SignalKind::ExternalNullifier,
    ];
}

const _: () = assert!(has_membership_prefix(MembershipProfile::PUBLIC_SIGNALS));
const _: () = assert!(has_membership_prefix(PompProfile::PUBLIC_SIGNALS));
const _: () = assert!(has_membership_prefix(AttributedProfile::PUBLIC_SIGNALS));

/// Values a public-signal vector is filled from.
#[derive(Clone, Copy)]
pub struct SignalSources<'a> {
    /// `None` for circuits that prove no tree membership.
    pub merkle_root: Option<Fr>,
    pub identity_commitment: Fr,
    pub nullifier_hash: Fr,
    pub salt: Fr,
    pub binding: Option<&'a CredentialBinding>,
}

/// The signal vector a correct proof for these inputs must expose.
pub fn expected_public_signals<C: CircuitProfile>(
    sources: &SignalSources<'_>,
) -> ZksbtResult<Vec<Fr>> {
    let missing = |kind: SignalKind, what: &str| {
        ZksbtError::Config(format!(
            "{} circuit exposes {:?} but {}",
            C::NAME,
            kind,
            what
        ))
    };
    let need_binding = |kind: SignalKind| {
        sources
            .binding
            .ok_or_else(|| missing(kind, "no credential binding was given"))
    };
    let need_window = |kind: SignalKind| {
        need_binding(kind)?
            .window
            .ok_or_else(|| missing(kind, "the binding has no validity window"))
    };

    C::PUBLIC_SIGNALS
        .iter()
        .map(|kind| match kind {
            SignalKind::IdentityCommitment => Ok(sources.identity_commitment),
            SignalKind::MerkleRoot => sources
                .merkle_root
                .ok_or_else(|| missing(*kind, "no group was given")),
            SignalKind::NullifierHash => Ok(sources.nullifier_hash),
            SignalKind::ExternalNullifier => Ok(sources.salt),
            SignalKind::AttributeHash => Ok(need_binding(*kind)?.attribute_hash()),
            SignalKind::WindowBegin => Ok(Fr::from(need_window(*kind)?.begin)),
            SignalKind::WindowEnd => Ok(Fr::from(need_window(*kind)?.end)),
        })
        .collect()
}
