//! Wallet gateway client.
//!
//! A request transport that never raises across its boundary, a typed error
//! taxonomy for everything the wallet backends can return, and a blockchain
//! data aggregator for balances and transaction history on the internal
//! chain, Bitcoin and Ethereum.

pub mod app;
pub mod domain;
pub mod infra;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
