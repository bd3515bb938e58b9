//! Network transport: the HTTP core, its default observer, secret redaction
//! and the opt-in retry decorator.

pub mod http;
pub mod observer;
pub mod redact;
pub mod retry;

pub use http::{HttpTransport, TIMEOUT_MESSAGE, request_context, resolve_url};
pub use observer::TracingObserver;
pub use redact::{REDACTED, redact_headers, redact_url};
pub use retry::{DEFAULT_RETRYABLE_STATUSES, RetryPolicy, RetryingTransport};
