//! Per-chain adapters for balance and history lookups.
//!
//! Each supported [`Coin`](crate::domain::Coin) has one adapter that knows how
//! to build its backend requests and how to reshape that backend's response
//! into the common balance string / [`Transaction`] model. Adding a chain
//! means adding one adapter and one `Coin` variant.

pub mod bitcoin;
pub mod ethereum;
pub mod internal;

use reqwest::Url;
use serde_json::Value;

use crate::domain::{ApiRequest, DomainError, ErrorKind, Transaction};

pub use bitcoin::BitcoinAdapter;
pub use ethereum::EthereumAdapter;
pub use internal::InternalChainAdapter;

/// Maximum number of history entries requested from any backend.
pub const HISTORY_LIMIT: usize = 20;

/// Request building and response normalization for one chain.
///
/// Parsing is pure: `None` means the payload did not have the expected
/// shape, which callers degrade to a zero balance or empty history.
pub trait ChainAdapter: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    fn balance_request(&self, address: &str) -> Result<ApiRequest, DomainError>;

    fn parse_balance(&self, payload: &Value) -> Option<String>;

    fn history_request(&self, address: &str) -> Result<ApiRequest, DomainError>;

    fn parse_history(&self, payload: &Value, address: &str) -> Option<Vec<Transaction>>;
}

/// Build an absolute URL from a host, path segments and query pairs.
///
/// Segments and query values are percent-encoded.
pub(crate) fn endpoint(
    host: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<String, DomainError> {
    let mut url = Url::parse(host).map_err(|e| {
        DomainError::new(
            ErrorKind::InternalError,
            format!("Invalid service host: {}", host),
        )
        .with_cause(e)
    })?;

    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| {
                DomainError::new(
                    ErrorKind::InternalError,
                    format!("Service host cannot carry a path: {}", host),
                )
            })?
            .pop_if_empty()
            .extend(segments);
    }

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url.to_string())
}

pub(crate) fn explorer_tx_url(explorer_host: &str, tx_id: &str) -> String {
    format!("{}/tx/{}", explorer_host.trim_end_matches('/'), tx_id)
}
