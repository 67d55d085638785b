use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{utils::parse_units, Address, U256};
use serde::Deserialize;

use crate::error::{PriceAlertError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint URL (HTTP)
    pub rpc_url: String,
    /// Hex-encoded private key of the submitting wallet
    pub private_key: String,
    /// Address of the deployed PriceAlert contract
    pub contract_address: String,
    /// Path to the contract interface file (JSON ABI)
    #[serde(default = "default_abi_path")]
    pub abi_path: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Seconds between price checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Price threshold in human units, e.g. "30000"
    #[serde(default = "default_price_threshold")]
    pub price_threshold: String,
    /// Implied decimal places of the price feed (BTC/USD uses 8)
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u8,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_abi_path() -> String {
    "./abi.json".to_string()
}

fn default_chain_id() -> u64 {
    11155111
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_price_threshold() -> String {
    "30000".to_string()
}

fn default_price_decimals() -> u8 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_builder = config::Config::builder()
            // Optional config file next to the binary
            .add_source(config::File::with_name("config").required(false))
            // Environment variables override the file (RPC_URL, PRIVATE_KEY,
            // CONTRACT_ADDRESS, ...)
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| PriceAlertError::Configuration(e.to_string()))?;

        config_builder
            .try_deserialize()
            .map_err(|e| PriceAlertError::Configuration(e.to_string()))
    }

    pub fn contract_address(&self) -> Result<Address> {
        Address::from_str(&self.contract_address).map_err(|e| {
            PriceAlertError::Configuration(format!(
                "Invalid contract address '{}': {}",
                self.contract_address, e
            ))
        })
    }

    /// Threshold scaled to its fixed-point representation
    pub fn threshold(&self) -> Result<U256> {
        let parsed = parse_units(&self.price_threshold, self.price_decimals).map_err(|e| {
            PriceAlertError::Configuration(format!(
                "Invalid price threshold '{}': {}",
                self.price_threshold, e
            ))
        })?;

        Ok(parsed.get_absolute())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        serde_json::from_str(
            r#"{
                "rpc_url": "http://localhost:8545",
                "private_key": "0x0000000000000000000000000000000000000000000000000000000000000001",
                "contract_address": "0x0000000000000000000000000000000000000000"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = minimal_config();

        assert_eq!(config.abi_path, "./abi.json");
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.price_threshold, "30000");
        assert_eq!(config.price_decimals, 8);
        assert_eq!(config.poll_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_threshold_fixed_point_conversion() {
        let config = minimal_config();

        // 30000 with 8 implied decimals
        assert_eq!(config.threshold().unwrap(), U256::from(3_000_000_000_000u64));
    }

    #[test]
    fn test_fractional_threshold() {
        let mut config = minimal_config();
        config.price_threshold = "30000.5".to_string();

        assert_eq!(config.threshold().unwrap(), U256::from(3_000_050_000_000u64));
    }

    #[test]
    fn test_invalid_contract_address() {
        let mut config = minimal_config();
        config.contract_address = "not-an-address".to_string();

        assert!(matches!(
            config.contract_address(),
            Err(PriceAlertError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = minimal_config();
        config.price_threshold = "thirty thousand".to_string();

        assert!(matches!(
            config.threshold(),
            Err(PriceAlertError::Configuration(_))
        ));
    }
}
