use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zksbt_types::{EthAddress, ZksbtError, ZksbtResult};

use super::authority::AuthorityConfig;
use super::ledger::LedgerConfig;
use super::logging::LoggingConfig;
use super::prover::ProverConfig;
use super::types::LogLevel;
use crate::group::MAX_TREE_DEPTH;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZksbtConfig {
    pub logging: LoggingConfig,
    pub ledger: LedgerConfig,
    pub authority: AuthorityConfig,
    pub prover: ProverConfig,
}

impl ZksbtConfig {
    pub fn load(path: impl AsRef<Path>) -> ZksbtResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ZksbtError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| ZksbtError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ZksbtResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ZksbtError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ZksbtError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| ZksbtError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    /// `ZKSBT_*` overrides. `lookup` is `std::env::var` outside of tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rpc) = lookup("ZKSBT_RPC_URL") {
            self.ledger.rpc_url = rpc;
        }

        if let Some(address) = lookup("ZKSBT_CONTRACT_ADDRESS") {
            self.ledger.contract_address = Some(address);
        }

        if let Some(chain_id) = lookup("ZKSBT_CHAIN_ID") {
            match chain_id.parse() {
                Ok(id) => self.ledger.chain_id = id,
                Err(_) => warn!("Ignoring invalid ZKSBT_CHAIN_ID: {}", chain_id),
            }
        }

        if let Some(depth) = lookup("ZKSBT_TREE_DEPTH") {
            if let Ok(d) = depth.parse() {
                self.ledger.tree_depth = d;
            }
        }

        if let Some(dir) = lookup("ZKSBT_CIRCUIT_DIR") {
            self.prover = ProverConfig::in_dir(&PathBuf::from(dir));
        }

        if let Some(level) = lookup("ZKSBT_LOG_LEVEL") {
            self.logging.level = LogLevel::parse_lossy(&level);
        }

        if lookup("ZKSBT_LOG_JSON").is_some() {
            self.logging.json = true;
        }
    }

    pub fn validate(&self) -> ZksbtResult<()> {
        let rpc = &self.ledger.rpc_url;
        if !rpc.starts_with("http://") && !rpc.starts_with("https://") {
            return Err(ZksbtError::Config(format!(
                "RPC URL must be http(s): {}",
                rpc
            )));
        }

        if self.ledger.chain_id == 0 {
            return Err(ZksbtError::Config("Chain ID cannot be 0".into()));
        }

        if self.ledger.event_page_size == 0 {
            return Err(ZksbtError::Config("Event page size cannot be 0".into()));
        }

        if self.ledger.tree_depth == 0 || self.ledger.tree_depth > MAX_TREE_DEPTH {
            return Err(ZksbtError::Config(format!(
                "Tree depth must be between 1 and {}",
                MAX_TREE_DEPTH
            )));
        }

        match &self.ledger.contract_address {
            Some(address) => {
                EthAddress::from_hex(address).map_err(|e| {
                    ZksbtError::Config(format!("Invalid contract address {}: {}", address, e))
                })?;
            }
            None => warn!("No registry contract address configured; only in-process ledgers work"),
        }

        if self.authority.max_pending_certificates == 0 {
            return Err(ZksbtError::Config(
                "Pending certificate limit cannot be 0".into(),
            ));
        }

        if self.ledger.operator_key_env.is_empty() || self.authority.issuer_key_env.is_empty() {
            return Err(ZksbtError::Config(
                "Key environment variable names cannot be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            rpc_url: self.ledger.rpc_url.clone(),
            contract_address: self.ledger.contract_address.clone(),
            chain_id: self.ledger.chain_id,
            tree_depth: self.ledger.tree_depth,
            event_page_size: self.ledger.event_page_size,
            operator_key_set: std::env::var(&self.ledger.operator_key_env).is_ok(),
            issuer_key_set: std::env::var(&self.authority.issuer_key_env).is_ok(),
            circuit: self.prover.wasm_path.clone(),
            log_level: self.logging.level,
        }
    }
}

/// Printable summary that never includes key material.
#[derive(Debug)]
pub struct RedactedConfig {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub chain_id: u64,
    pub tree_depth: usize,
    pub event_page_size: u64,
    pub operator_key_set: bool,
    pub issuer_key_set: bool,
    pub circuit: PathBuf,
    pub log_level: LogLevel,
}

impl std::fmt::Display for RedactedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "zkSBT Configuration")?;
        writeln!(f, "===================")?;
        writeln!(f, "RPC: {} (chain {})", self.rpc_url, self.chain_id)?;
        writeln!(
            f,
            "Registry: {}",
            self.contract_address.as_deref().unwrap_or("not set")
        )?;
        writeln!(f, "Tree depth: {}", self.tree_depth)?;
        writeln!(f, "Event page size: {} blocks", self.event_page_size)?;
        writeln!(f, "Operator key: {}", if self.operator_key_set { "set" } else { "missing" })?;
        writeln!(f, "Issuer key: {}", if self.issuer_key_set { "set" } else { "missing" })?;
        writeln!(f, "Circuit: {:?}", self.circuit)?;
        writeln!(f, "Log level: {}", self.log_level)
    }
}
