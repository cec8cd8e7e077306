//! Backend certificate authority.
//!
//! Verifies claim signatures, asks the eligibility policy, allocates a
//! credential id and signs a certificate the ledger accepts for one mint.

mod allocator;
mod certificate;
mod eligibility;
mod issuer;

pub use allocator::{IdAllocator, SerializedAllocator};
pub use certificate::{certificate_message, claim_message, Certificate};
pub use eligibility::{AllowAll, AllowList, EligibilityPolicy};
pub use issuer::{CertificateAuthority, IssuanceState, MintOutcome};
