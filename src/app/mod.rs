//! Application layer: configuration, chain aggregation and the client facade.

pub mod aggregator;
pub mod client;
pub mod config;

pub use aggregator::{BlockchainDataAggregator, ZERO_BALANCE};
pub use client::WalletClient;
pub use config::ClientConfig;
