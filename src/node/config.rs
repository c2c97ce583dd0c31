use crate::airdrop::AirdropConfig;
use crate::control::{ControllerConfig, HysteresisPolicy};
use crate::txgen::SynthConfig;
use crate::utils::{FuzzError, Result};
use crate::worker::WorkerConfig;
use ethers::types::U256;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const GWEI: u64 = 1_000_000_000;

/// Fuzzer tunables. Every field has a default, so a TOML file only needs the
/// values it changes. Wei amounts that overflow TOML integers are given in
/// gwei or ether.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzConfig {
    pub window_size: usize,
    pub fee_margin_percent: u64,
    pub busy_utilization_percent: u64,
    pub idle_utilization_percent: u64,
    pub full_block_max_cost_eth: u64,
    pub trend_recovery_fee_cap_gwei: u64,
    pub initial_fee_cap_wei: u64,
    pub initial_cooldown_ms: u64,
    pub min_sleep_ms: u64,
    pub tx_gas_limit: u64,
    pub max_payload_len: usize,
    pub fee_tip_wei: u64,
    pub allow_legacy_txs: bool,
    pub airdrop_target_eth: u64,
    pub airdrop_period_secs: u64,
    pub airdrop_retry_delay_secs: u64,
    pub airdrop_fee_multiplier: u64,
    pub receipt_poll_ms: u64,
    pub random_buffer_len: usize,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            fee_margin_percent: 110,
            busy_utilization_percent: 40,
            idle_utilization_percent: 70,
            full_block_max_cost_eth: 1000,
            trend_recovery_fee_cap_gwei: 10_000,
            initial_fee_cap_wei: GWEI + 1,
            initial_cooldown_ms: 1000,
            min_sleep_ms: 10,
            // about 100 txs fill a 30M gas block
            tx_gas_limit: 300_000,
            max_payload_len: 128,
            fee_tip_wei: 1,
            allow_legacy_txs: false,
            airdrop_target_eth: 100,
            airdrop_period_secs: 30,
            airdrop_retry_delay_secs: 5,
            airdrop_fee_multiplier: 2,
            receipt_poll_ms: 1000,
            random_buffer_len: 10_000,
        }
    }
}

impl FuzzConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| FuzzError::Config(format!("could not read {}: {}", path.display(), e)))?;
        let cfg: FuzzConfig = toml::from_str(&data).map_err(|e| FuzzError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(FuzzError::Config("window_size must be at least 1".into()));
        }
        if self.max_payload_len == 0 {
            return Err(FuzzError::Config("max_payload_len must be at least 1".into()));
        }
        if self.airdrop_fee_multiplier == 0 {
            return Err(FuzzError::Config("airdrop_fee_multiplier must be at least 1".into()));
        }
        if self.random_buffer_len == 0 {
            return Err(FuzzError::Config("random_buffer_len must be at least 1".into()));
        }
        Ok(())
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            window_size: self.window_size,
            fee_margin_percent: self.fee_margin_percent,
            full_block_max_cost: ethers::utils::WEI_IN_ETHER * self.full_block_max_cost_eth,
            trend_recovery_fee_cap: U256::from(self.trend_recovery_fee_cap_gwei) * GWEI,
        }
    }

    pub fn policy(&self) -> HysteresisPolicy {
        HysteresisPolicy {
            busy_percent: self.busy_utilization_percent,
            idle_percent: self.idle_utilization_percent,
        }
    }

    pub fn synth(&self) -> SynthConfig {
        SynthConfig {
            max_payload_len: self.max_payload_len,
            gas_limit: self.tx_gas_limit,
            allow_legacy: self.allow_legacy_txs,
        }
    }

    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            min_sleep: Duration::from_millis(self.min_sleep_ms),
            fee_tip: U256::from(self.fee_tip_wei),
        }
    }

    pub fn airdrop(&self) -> AirdropConfig {
        AirdropConfig {
            target: ethers::utils::WEI_IN_ETHER * self.airdrop_target_eth,
            period: Duration::from_secs(self.airdrop_period_secs),
            retry_delay: Duration::from_secs(self.airdrop_retry_delay_secs),
            fee_multiplier: self.airdrop_fee_multiplier,
            fee_tip: U256::from(self.fee_tip_wei),
        }
    }

    pub fn initial_fee_cap(&self) -> U256 {
        U256::from(self.initial_fee_cap_wei)
    }

    pub fn initial_cooldown(&self) -> Duration {
        Duration::from_millis(self.initial_cooldown_ms)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_policy() {
        let cfg = FuzzConfig::default();
        cfg.validate().unwrap();
        let c = cfg.controller();
        assert_eq!(c.window_size, 5);
        assert_eq!(c.fee_margin_percent, 110);
        assert_eq!(c.full_block_max_cost, U256::exp10(21));
        let p = cfg.policy();
        assert_eq!((p.busy_percent, p.idle_percent), (40, 70));
        assert_eq!(cfg.airdrop().target, U256::exp10(20));
        assert!(!cfg.synth().allow_legacy);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: FuzzConfig = toml::from_str("window_size = 8\nallow_legacy_txs = true\n").unwrap();
        assert_eq!(cfg.window_size, 8);
        assert!(cfg.allow_legacy_txs);
        assert_eq!(cfg.fee_margin_percent, 110);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<FuzzConfig>("windw_size = 8\n").is_err());
    }

    #[test]
    fn test_zero_window_invalid() {
        let cfg = FuzzConfig { window_size: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(FuzzError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("txfuzz-config-{}.toml", std::process::id()));
        fs::write(&path, "airdrop_period_secs = 60\n").unwrap();
        let cfg = FuzzConfig::load(&path).unwrap();
        assert_eq!(cfg.airdrop().period, Duration::from_secs(60));
        let _ = fs::remove_file(&path);
        assert!(FuzzConfig::load(&path).is_err());
    }
}
