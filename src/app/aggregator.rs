//! Blockchain data aggregation across the internal chain, Bitcoin and Ethereum.
//!
//! Each query issues exactly one transport call against the coin's backend:
//! 1. Resolve the ticker to a [`Coin`] (unsupported → `INVALID_INPUT`)
//! 2. Build the backend request through the coin's [`ChainAdapter`]
//! 3. Send it; a failed request is raised as its [`DomainError`]
//! 4. Normalize the payload; a malformed payload degrades to `"0"` / `[]`

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::{
    ApiRequest, ChainAction, ChainData, Coin, ConfigProvider, DomainError, ErrorContext,
    ErrorKind, ServiceName, Transaction, Transport, normalize_unknown,
};
use crate::infra::chains::{BitcoinAdapter, ChainAdapter, EthereumAdapter, InternalChainAdapter};

use super::config::ClientConfig;

/// Balance reported when a backend answers with an unusable payload.
pub const ZERO_BALANCE: &str = "0";

pub struct BlockchainDataAggregator {
    transport: Arc<dyn Transport>,
    internal: InternalChainAdapter,
    bitcoin: BitcoinAdapter,
    ethereum: EthereumAdapter,
    timeout_ms: u64,
}

impl BlockchainDataAggregator {
    pub fn new(
        transport: Arc<dyn Transport>,
        internal: InternalChainAdapter,
        bitcoin: BitcoinAdapter,
        ethereum: EthereumAdapter,
        timeout_ms: u64,
    ) -> Self {
        Self {
            transport,
            internal,
            bitcoin,
            ethereum,
            timeout_ms,
        }
    }

    /// Build all three adapters from the configured hosts.
    pub fn from_config(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
    ) -> Result<Self, DomainError> {
        let internal = InternalChainAdapter::new(
            config.resolve_service_host(ServiceName::InternalChain)?,
            config.internal_chain.clone(),
        );
        let bitcoin = BitcoinAdapter::new(
            config.resolve_service_host(ServiceName::BitcoinApi)?,
            config.resolve_service_host(ServiceName::BitcoinExplorer)?,
        );
        let ethereum = EthereumAdapter::new(
            config.resolve_service_host(ServiceName::EthereumApi)?,
            config.resolve_service_host(ServiceName::EthereumExplorer)?,
            config
                .etherscan_api_key
                .as_ref()
                .map(|key| SecretString::from(key.expose_secret().to_owned())),
        );

        Ok(Self::new(
            transport,
            internal,
            bitcoin,
            ethereum,
            config.default_timeout_ms,
        ))
    }

    /// Swap the transport, keeping the adapters.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Resolve a ticker against the supported coins.
    pub fn resolve_coin(&self, ticker: &str) -> Result<Coin, DomainError> {
        Coin::from_ticker(ticker, self.internal.ticker())
    }

    fn adapter(&self, coin: Coin) -> &dyn ChainAdapter {
        match coin {
            Coin::Internal => &self.internal,
            Coin::Bitcoin => &self.bitcoin,
            Coin::Ethereum => &self.ethereum,
        }
    }

    /// Current balance of `address` as a decimal string.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, coin: &str, address: &str) -> Result<String, DomainError> {
        let coin = self.resolve_coin(coin)?;
        require_address(address)?;
        let adapter = self.adapter(coin);

        let payload = self.fetch(adapter.balance_request(address)?).await?;

        match adapter.parse_balance(&payload) {
            Some(balance) => {
                debug!(chain = adapter.name(), balance = %balance, "Balance fetched");
                Ok(balance)
            }
            None => {
                warn!(
                    chain = adapter.name(),
                    "Unexpected balance response shape, reporting zero"
                );
                Ok(ZERO_BALANCE.to_string())
            }
        }
    }

    /// Recent transactions of `address`, newest first as the backend returns them.
    #[instrument(skip(self))]
    pub async fn get_history(
        &self,
        coin: &str,
        address: &str,
    ) -> Result<Vec<Transaction>, DomainError> {
        let coin = self.resolve_coin(coin)?;
        require_address(address)?;
        let adapter = self.adapter(coin);

        let payload = self.fetch(adapter.history_request(address)?).await?;

        match adapter.parse_history(&payload, address) {
            Some(history) => {
                debug!(
                    chain = adapter.name(),
                    count = history.len(),
                    "History fetched"
                );
                Ok(history)
            }
            None => {
                warn!(
                    chain = adapter.name(),
                    "Unexpected history response shape, reporting no transactions"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Dispatch on a textual action (`balance` or `history`).
    pub async fn query(
        &self,
        coin: &str,
        address: &str,
        action: &str,
    ) -> Result<ChainData, DomainError> {
        let action = action.parse::<ChainAction>().map_err(|e| {
            e.with_context_value("coin", coin)
                .with_context_value("action", action)
        })?;
        match action {
            ChainAction::Balance => self.get_balance(coin, address).await.map(ChainData::Balance),
            ChainAction::History => self.get_history(coin, address).await.map(ChainData::History),
        }
    }

    async fn fetch(&self, request: ApiRequest) -> Result<Value, DomainError> {
        self.transport
            .execute(request.timeout_ms(self.timeout_ms))
            .await
            .into_result()
            .map_err(|error| normalize_unknown(error, ErrorContext::new()))
    }
}

fn require_address(address: &str) -> Result<(), DomainError> {
    if address.trim().is_empty() {
        return Err(DomainError::validation(
            ErrorKind::MissingRequiredField,
            "Address is required",
        ));
    }
    Ok(())
}
