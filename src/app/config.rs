//! Client configuration.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WALLET_ENV` | `develop`, `staging` or `production` | `develop` |
//! | `WALLET_API_HOST` | Primary wallet API | per environment |
//! | `WALLET_RELAY_HOST` | Relay/enclave service | per environment |
//! | `WALLET_CHAIN_HOST` | Internal chain node API | per environment |
//! | `WALLET_BTC_API_HOST` | Bitcoin block explorer API | per environment |
//! | `WALLET_BTC_EXPLORER_HOST` | Bitcoin explorer web UI | per environment |
//! | `WALLET_ETH_API_HOST` | Ethereum explorer proxy API | per environment |
//! | `WALLET_ETH_EXPLORER_HOST` | Ethereum explorer web UI | per environment |
//! | `WALLET_TIMEOUT_MS` | Default request timeout | `5000` |
//! | `WALLET_CHAIN_TICKER` | Internal chain coin ticker | `EOS` |
//! | `WALLET_TOKEN_CONTRACT` | Internal chain token contract | `eosio.token` |
//! | `ETHERSCAN_API_KEY` | Explorer proxy API key | unset |

use std::collections::HashMap;
use std::env;

use secrecy::SecretString;
use tracing::debug;

use crate::domain::{
    ConfigError, ConfigProvider, DEFAULT_TIMEOUT_MS, Environment, InternalChainConfig, ServiceName,
};

/// Immutable client configuration. Build once, share via `Arc`.
#[derive(Debug)]
pub struct ClientConfig {
    environment: Environment,
    hosts: HashMap<ServiceName, String>,
    pub default_timeout_ms: u64,
    pub internal_chain: InternalChainConfig,
    /// Optional key for the Ethereum explorer proxy
    pub etherscan_api_key: Option<SecretString>,
}

impl ClientConfig {
    /// Configuration with the built-in host table for `environment`.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let hosts = ServiceName::ALL
            .iter()
            .map(|service| (*service, default_host(environment, *service).to_string()))
            .collect();
        Self {
            environment,
            hosts,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            internal_chain: InternalChainConfig::default(),
            etherscan_api_key: None,
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match get("WALLET_ENV") {
            Some(value) => value
                .parse::<Environment>()
                .map_err(|_| ConfigError::Invalid {
                    name: "WALLET_ENV".to_string(),
                    value,
                })?,
            None => Environment::default(),
        };

        let mut config = Self::for_environment(environment);

        for service in ServiceName::ALL {
            if let Some(host) = get(host_variable(service)) {
                config = config.with_host(service, host);
            }
        }

        if let Some(value) = get("WALLET_TIMEOUT_MS") {
            config.default_timeout_ms = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or(ConfigError::Invalid {
                    name: "WALLET_TIMEOUT_MS".to_string(),
                    value,
                })?;
        }

        if let Some(ticker) = get("WALLET_CHAIN_TICKER") {
            config.internal_chain.ticker = ticker.trim().to_string();
        }
        if let Some(contract) = get("WALLET_TOKEN_CONTRACT") {
            config.internal_chain.token_contract = contract.trim().to_string();
        }
        config.etherscan_api_key = get("ETHERSCAN_API_KEY").map(SecretString::from);

        Ok(config)
    }

    /// Override one service host. Trailing slashes are dropped.
    #[must_use]
    pub fn with_host(mut self, service: ServiceName, host: impl Into<String>) -> Self {
        let host = host.into();
        self.hosts
            .insert(service, host.trim().trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn with_internal_chain(mut self, internal_chain: InternalChainConfig) -> Self {
        self.internal_chain = internal_chain;
        self
    }

    #[must_use]
    pub fn with_etherscan_api_key(mut self, key: SecretString) -> Self {
        self.etherscan_api_key = Some(key);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl ConfigProvider for ClientConfig {
    fn current_environment(&self) -> Environment {
        self.environment
    }

    fn resolve_service_host(&self, service: ServiceName) -> Result<String, ConfigError> {
        self.hosts
            .get(&service)
            .filter(|host| !host.is_empty())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownService(service.to_string()))
    }
}

/// Environment variable that overrides the host of `service`.
pub fn host_variable(service: ServiceName) -> &'static str {
    match service {
        ServiceName::Api => "WALLET_API_HOST",
        ServiceName::Relay => "WALLET_RELAY_HOST",
        ServiceName::InternalChain => "WALLET_CHAIN_HOST",
        ServiceName::BitcoinApi => "WALLET_BTC_API_HOST",
        ServiceName::BitcoinExplorer => "WALLET_BTC_EXPLORER_HOST",
        ServiceName::EthereumApi => "WALLET_ETH_API_HOST",
        ServiceName::EthereumExplorer => "WALLET_ETH_EXPLORER_HOST",
    }
}

fn default_host(environment: Environment, service: ServiceName) -> &'static str {
    use Environment::*;
    use ServiceName::*;

    match (environment, service) {
        (Develop, Api) => "https://api.dev.wallet.example",
        (Staging, Api) => "https://api.staging.wallet.example",
        (Production, Api) => "https://api.wallet.example",
        (Develop, Relay) => "https://relay.dev.wallet.example",
        (Staging, Relay) => "https://relay.staging.wallet.example",
        (Production, Relay) => "https://relay.wallet.example",
        (Develop | Staging, InternalChain) => "https://jungle4.cryptolions.io",
        (Production, InternalChain) => "https://eos.hyperion.eosrio.io",
        (Develop | Staging, BitcoinApi) => "https://blockstream.info/testnet/api",
        (Production, BitcoinApi) => "https://blockstream.info/api",
        (Develop | Staging, BitcoinExplorer) => "https://blockstream.info/testnet",
        (Production, BitcoinExplorer) => "https://blockstream.info",
        (Develop | Staging, EthereumApi) => "https://api-sepolia.etherscan.io/api",
        (Production, EthereumApi) => "https://api.etherscan.io/api",
        (Develop | Staging, EthereumExplorer) => "https://sepolia.etherscan.io",
        (Production, EthereumExplorer) => "https://etherscan.io",
    }
}
