//! Domain traits defining contracts for external systems.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::error::{ConfigError, DomainError};
use super::types::{ApiRequest, Environment, HttpMethod, RequestResult, ServiceName};

/// The single path to the network.
///
/// Implementations never return `Err` and never panic on remote failures:
/// every outcome is a [`RequestResult`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request and return the parsed JSON payload or failure.
    async fn execute(&self, request: ApiRequest) -> RequestResult<Value>;
}

/// Error returned by an observer hook. The transport discards it.
#[derive(Debug, Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// What the transport tells its observer about a request.
#[derive(Debug, Clone)]
pub struct RequestEvent<'a> {
    pub request_id: &'a str,
    pub method: HttpMethod,
    /// URL with secrets masked
    pub url: &'a str,
}

/// Best-effort telemetry hooks invoked around each request.
pub trait RequestObserver: Send + Sync {
    fn on_request_start(&self, event: &RequestEvent<'_>) -> Result<(), ObserverError>;

    fn on_response(
        &self,
        event: &RequestEvent<'_>,
        status: u16,
        elapsed_ms: u128,
    ) -> Result<(), ObserverError>;

    fn on_error(&self, event: &RequestEvent<'_>, error: &DomainError) -> Result<(), ObserverError>;
}

/// Read-only source of environment and service hosts.
pub trait ConfigProvider: Send + Sync {
    fn current_environment(&self) -> Environment;

    /// Base URL (without trailing slash) for a service in the current environment.
    fn resolve_service_host(&self, service: ServiceName) -> Result<String, ConfigError>;
}
