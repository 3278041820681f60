//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts with zero
//! configuration against the hosted backend; only the contract address
//! has no sensible default.

use std::path::PathBuf;
use std::str::FromStr;

use citysecrets_chain::U256;
use citysecrets_shared::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_FANOUT, DEFAULT_RPC_URL, DEFAULT_VOTE_VALUE_WEI,
};
use citysecrets_shared::Address;

use crate::reconcile::FanoutPolicy;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the content backend.
    /// Env: `CITYSECRETS_API_URL`
    pub api_base_url: String,

    /// Deployed SecretSpots contract.
    /// Env: `CITYSECRETS_CONTRACT_ADDRESS`
    /// Default: none (contract calls fail as misconfigured).
    pub contract_address: Option<Address>,

    /// JSON-RPC endpoint used to reach the contract.
    /// Env: `CITYSECRETS_RPC_URL`
    pub rpc_url: String,

    /// Wei attached to every vote.
    /// Env: `CITYSECRETS_VOTE_VALUE_WEI`
    pub vote_value: U256,

    /// On-chain lookups in flight per list refresh (at least 1).
    /// Env: `CITYSECRETS_FANOUT`
    pub fanout: usize,

    /// What a list refresh does when one record fails to reconcile.
    /// Env: `CITYSECRETS_FANOUT_POLICY` (`abort` / `best-effort`)
    pub fanout_policy: FanoutPolicy,

    /// Directory holding the local session database.
    /// Env: `CITYSECRETS_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            contract_address: None,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            vote_value: U256::from(DEFAULT_VOTE_VALUE_WEI),
            fanout: DEFAULT_FANOUT,
            fanout_policy: FanoutPolicy::AbortAll,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup.  Invalid values are
    /// logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CITYSECRETS_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("CITYSECRETS_CONTRACT_ADDRESS") {
            if !raw.trim().is_empty() {
                config.contract_address = parse_or_warn("CITYSECRETS_CONTRACT_ADDRESS", &raw);
            }
        }

        if let Some(url) = lookup("CITYSECRETS_RPC_URL").filter(|v| !v.trim().is_empty()) {
            config.rpc_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("CITYSECRETS_VOTE_VALUE_WEI") {
            if let Some(value) = parse_or_warn::<U256>("CITYSECRETS_VOTE_VALUE_WEI", &raw) {
                config.vote_value = value;
            }
        }

        if let Some(raw) = lookup("CITYSECRETS_FANOUT") {
            match parse_or_warn::<usize>("CITYSECRETS_FANOUT", &raw) {
                Some(0) => tracing::warn!("CITYSECRETS_FANOUT must be at least 1, using default"),
                Some(n) => config.fanout = n,
                None => {}
            }
        }

        if let Some(raw) = lookup("CITYSECRETS_FANOUT_POLICY") {
            if let Some(policy) = parse_or_warn("CITYSECRETS_FANOUT_POLICY", &raw) {
                config.fanout_policy = policy;
            }
        }

        if let Some(dir) = lookup("CITYSECRETS_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }

    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.contract_address, None);
        assert_eq!(config.vote_value, U256::from(10_000_000_000_000_000u128));
        assert_eq!(config.fanout, 8);
        assert_eq!(config.fanout_policy, FanoutPolicy::AbortAll);
    }

    #[test]
    fn test_reads_all_keys() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CITYSECRETS_API_URL", "http://localhost:5000"),
            (
                "CITYSECRETS_CONTRACT_ADDRESS",
                "0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e",
            ),
            ("CITYSECRETS_RPC_URL", "http://127.0.0.1:9545"),
            ("CITYSECRETS_VOTE_VALUE_WEI", "1000"),
            ("CITYSECRETS_FANOUT", "2"),
            ("CITYSECRETS_FANOUT_POLICY", "best-effort"),
            ("CITYSECRETS_DATA_DIR", "/tmp/citysecrets"),
        ]));

        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.contract_address, Some(Address::repeat_byte(0x5e)));
        assert_eq!(config.rpc_url, "http://127.0.0.1:9545");
        assert_eq!(config.vote_value, U256::from(1000u64));
        assert_eq!(config.fanout, 2);
        assert_eq!(config.fanout_policy, FanoutPolicy::BestEffort);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/citysecrets")));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CITYSECRETS_CONTRACT_ADDRESS", "0xnope"),
            ("CITYSECRETS_FANOUT", "0"),
            ("CITYSECRETS_FANOUT_POLICY", "sometimes"),
            ("CITYSECRETS_VOTE_VALUE_WEI", "-5"),
        ]));

        assert_eq!(config.contract_address, None);
        assert_eq!(config.fanout, DEFAULT_FANOUT);
        assert_eq!(config.fanout_policy, FanoutPolicy::AbortAll);
        assert_eq!(config.vote_value, U256::from(DEFAULT_VOTE_VALUE_WEI));
    }
}
