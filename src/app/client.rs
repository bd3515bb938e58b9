//! Client facade wiring configuration, transport and aggregator together.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::domain::{
    ApiRequest, ChainData, ConfigProvider, DomainError, RequestObserver, RequestResult,
    Transaction, Transport,
};
use crate::infra::transport::request_context;
use crate::infra::{HttpTransport, RetryPolicy, RetryingTransport};

use super::aggregator::BlockchainDataAggregator;
use super::config::ClientConfig;

/// Shared entry point for wallet API calls and chain lookups.
#[derive(Clone)]
pub struct WalletClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    aggregator: Arc<BlockchainDataAggregator>,
}

impl WalletClient {
    /// Client over the real HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, DomainError> {
        Self::with_observer_opt(config, None)
    }

    /// Client over the real HTTP transport with a custom request observer.
    pub fn with_observer(
        config: ClientConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Self, DomainError> {
        Self::with_observer_opt(config, Some(observer))
    }

    fn with_observer_opt(
        config: ClientConfig,
        observer: Option<Arc<dyn RequestObserver>>,
    ) -> Result<Self, DomainError> {
        let config = Arc::new(config);
        let mut http = HttpTransport::new(config.clone())?;
        if let Some(observer) = observer {
            http = http.with_observer(observer);
        }
        Self::with_transport(config, Arc::new(http))
    }

    /// Client configured from `WALLET_*` environment variables.
    pub fn from_env() -> Result<Self, DomainError> {
        let config = ClientConfig::from_env()?;
        info!(
            environment = %config.current_environment(),
            timeout_ms = config.default_timeout_ms,
            "Wallet client configured"
        );
        Self::new(config)
    }

    /// Client over any transport, e.g. a mock in tests.
    pub fn with_transport(
        config: Arc<ClientConfig>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DomainError> {
        let aggregator = BlockchainDataAggregator::from_config(transport.clone(), &config)?;
        Ok(Self {
            config,
            transport,
            aggregator: Arc::new(aggregator),
        })
    }

    /// Wrap the current transport in a [`RetryingTransport`].
    pub fn with_retry(self, policy: RetryPolicy) -> Result<Self, DomainError> {
        let transport: Arc<dyn Transport> =
            Arc::new(RetryingTransport::new(self.transport, policy));
        Self::with_transport(self.config, transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &BlockchainDataAggregator {
        &self.aggregator
    }

    /// Raw envelope for a wallet API call.
    pub async fn execute(&self, request: ApiRequest) -> RequestResult<Value> {
        self.transport.execute(request).await
    }

    /// Wallet API call decoded into `T`.
    ///
    /// A payload that does not fit `T` fails with the request's url and method
    /// in the error context.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> RequestResult<T> {
        let context = request_context(self.config.as_ref(), &request);
        self.execute(request).await.decode_with_context::<T>(&context)
    }

    pub async fn get_balance(&self, coin: &str, address: &str) -> Result<String, DomainError> {
        self.aggregator.get_balance(coin, address).await
    }

    pub async fn get_history(
        &self,
        coin: &str,
        address: &str,
    ) -> Result<Vec<Transaction>, DomainError> {
        self.aggregator.get_history(coin, address).await
    }

    pub async fn query(
        &self,
        coin: &str,
        address: &str,
        action: &str,
    ) -> Result<ChainData, DomainError> {
        self.aggregator.query(coin, address, action).await
    }
}
