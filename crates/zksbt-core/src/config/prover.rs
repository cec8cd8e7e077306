use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zksbt_types::ZksbtResult;

use crate::proof::{CircuitArtifact, VerificationKey};

/// Compiled circuits. The membership circuit is proved by holders; the
/// identity circuit backs proof-key requests and is verified by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    pub wasm_path: PathBuf,
    pub zkey_path: PathBuf,
    pub identity_wasm_path: PathBuf,
    pub identity_zkey_path: PathBuf,
    pub identity_verification_key_path: PathBuf,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("circuits"))
    }
}

impl ProverConfig {
    /// The standard file names under one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            wasm_path: dir.join("semaphore.wasm"),
            zkey_path: dir.join("semaphore.zkey"),
            identity_wasm_path: dir.join("identity.wasm"),
            identity_zkey_path: dir.join("identity.zkey"),
            identity_verification_key_path: dir.join("identity_verification_key.json"),
        }
    }

    pub fn artifact(&self) -> CircuitArtifact {
        CircuitArtifact {
            wasm_path: self.wasm_path.clone(),
            zkey_path: self.zkey_path.clone(),
        }
    }

    pub fn identity_artifact(&self) -> CircuitArtifact {
        CircuitArtifact {
            wasm_path: self.identity_wasm_path.clone(),
            zkey_path: self.identity_zkey_path.clone(),
        }
    }

    pub fn load_identity_verification_key(&self) -> ZksbtResult<VerificationKey> {
        VerificationKey::load(&self.identity_verification_key_path)
    }
}
