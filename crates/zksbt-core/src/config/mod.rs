mod authority;
mod constants;
mod ledger;
mod logging;
mod prover;
mod settings;
mod types;

pub use authority::AuthorityConfig;
pub use constants::*;
pub use ledger::LedgerConfig;
pub use logging::LoggingConfig;
pub use prover::ProverConfig;
pub use settings::{RedactedConfig, ZksbtConfig};
pub use types::LogLevel;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("zksbt-config-{}-{}", std::process::id(), name))
            .join("zksbt.toml")
    }

    #[test]
    fn test_default_config_validation() {
        let config = ZksbtConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger.tree_depth, DEFAULT_TREE_DEPTH);
        assert_eq!(config.ledger.chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn test_invalid_depth() {
        let mut config = ZksbtConfig::default();
        config.ledger.tree_depth = 0;
        assert!(config.validate().is_err());
        config.ledger.tree_depth = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rpc_url() {
        let mut config = ZksbtConfig::default();
        config.ledger.rpc_url = "127.0.0.1:8545".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_contract_address() {
        let mut config = ZksbtConfig::default();
        config.ledger.contract_address = Some("0x1234".into());
        assert!(config.validate().is_err());

        config.ledger.contract_address = Some(format!("0x{}", "ab".repeat(20)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ZKSBT_RPC_URL", "https://rpc.example.org"),
            ("ZKSBT_CHAIN_ID", "56"),
            ("ZKSBT_TREE_DEPTH", "20"),
            ("ZKSBT_LOG_LEVEL", "DEBUG"),
            ("ZKSBT_LOG_JSON", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = ZksbtConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.ledger.rpc_url, "https://rpc.example.org");
        assert_eq!(config.ledger.chain_id, 56);
        assert_eq!(config.ledger.tree_depth, 20);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let mut config = ZksbtConfig::default();
        config.apply_overrides(|name| (name == "ZKSBT_CHAIN_ID").then(|| "mainnet".to_string()));
        assert_eq!(config.ledger.chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn test_circuit_dir_override() {
        let mut config = ZksbtConfig::default();
        config.apply_overrides(|name| (name == "ZKSBT_CIRCUIT_DIR").then(|| "/opt/pomp".to_string()));
        let artifact = config.prover.artifact();
        assert_eq!(artifact.wasm_path, PathBuf::from("/opt/pomp/semaphore.wasm"));
        assert_eq!(artifact.zkey_path, PathBuf::from("/opt/pomp/semaphore.zkey"));
        let identity = config.prover.identity_artifact();
        assert_eq!(identity.wasm_path, PathBuf::from("/opt/pomp/identity.wasm"));
        assert_eq!(
            config.prover.identity_verification_key_path,
            PathBuf::from("/opt/pomp/identity_verification_key.json")
        );
    }

    #[test]
    fn test_pending_limits_must_be_positive() {
        let mut config = ZksbtConfig::default();
        assert_eq!(config.authority.pending_ttl_secs, DEFAULT_PENDING_TTL_SECS);
        config.authority.max_pending_certificates = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_config() {
        let config = ZksbtConfig::default();
        let redacted = format!("{}", config.redacted());
        assert!(redacted.contains("RPC:"));
        assert!(redacted.contains("Registry: not set"));
    }

    #[test]
    fn test_config_serialization() {
        let mut config = ZksbtConfig::default();
        config.ledger.deployment_block = 1234;
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
        let parsed: ZksbtConfig = toml::from_str(&toml_str).expect("Failed to parse");
        assert_eq!(parsed.ledger.deployment_block, 1234);
        assert_eq!(parsed.logging.level, config.logging.level);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: ZksbtConfig = toml::from_str("[ledger]\nchain_id = 97\n").unwrap();
        assert_eq!(parsed.ledger.chain_id, 97);
        assert_eq!(parsed.ledger.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(parsed.authority.max_allocation_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save-load");
        let mut config = ZksbtConfig::default();
        config.ledger.event_page_size = 777;
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: ZksbtConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.ledger.event_page_size, 777);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let path = temp_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[ledger\nchain_id = ").unwrap();
        assert!(ZksbtConfig::load(&path).is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
