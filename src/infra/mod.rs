//! Infrastructure layer implementations.

pub mod chains;
pub mod transport;

pub use chains::{BitcoinAdapter, ChainAdapter, EthereumAdapter, InternalChainAdapter};
pub use transport::{HttpTransport, RetryPolicy, RetryingTransport, TracingObserver};
