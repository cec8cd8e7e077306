pub const SECP256K1_PRIVATE_KEY_SIZE: usize = 32;

pub const SECP256K1_PUBLIC_KEY_SIZE: usize = 33;

pub const ECDSA_SIGNATURE_SIZE: usize = 65;

pub const ETH_ADDRESS_SIZE: usize = 20;

/// Width of the legacy claim address carved out of a commitment.
pub const CLAIM_ADDRESS_SIZE: usize = 20;

pub const FIELD_ELEMENT_SIZE: usize = 32;
