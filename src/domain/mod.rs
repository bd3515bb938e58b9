//! Domain layer containing core types, traits, and error definitions.

pub mod amount;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ConfigError, DomainError, ErrorContext, ErrorFamily, ErrorKind, Thrown,
    build_error_from_response, classify, normalize_unknown,
};
pub use traits::{ConfigProvider, ObserverError, RequestEvent, RequestObserver, Transport};
pub use types::{
    Address, ApiRequest, ChainAction, ChainData, Coin, DEFAULT_TIMEOUT_MS, Direction,
    Environment, HttpMethod, InternalChainConfig, PublicKeyCredential, RequestResult, ServiceName,
    Transaction, sort_addresses,
};
