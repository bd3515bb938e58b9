//! Default request observer that emits `tracing` events.

use tracing::{debug, info, warn};

use crate::domain::{DomainError, ObserverError, RequestEvent, RequestObserver};

/// Logs request lifecycle events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request_start(&self, event: &RequestEvent<'_>) -> Result<(), ObserverError> {
        debug!(
            request_id = %event.request_id,
            method = %event.method,
            url = %event.url,
            "Sending request"
        );
        Ok(())
    }

    fn on_response(
        &self,
        event: &RequestEvent<'_>,
        status: u16,
        elapsed_ms: u128,
    ) -> Result<(), ObserverError> {
        info!(
            request_id = %event.request_id,
            method = %event.method,
            url = %event.url,
            status = status,
            elapsed_ms = elapsed_ms as u64,
            "Response received"
        );
        Ok(())
    }

    fn on_error(&self, event: &RequestEvent<'_>, error: &DomainError) -> Result<(), ObserverError> {
        warn!(
            request_id = %event.request_id,
            method = %event.method,
            url = %event.url,
            kind = %error.kind(),
            status = ?error.http_status(),
            error = %error,
            "Request failed"
        );
        Ok(())
    }
}
