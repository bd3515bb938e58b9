//! HTTP transport: the only code in the crate that touches the network.
//!
//! Every call goes through [`HttpTransport::send`], which resolves the URL,
//! runs the request under a per-call timeout, classifies the response and
//! folds every failure (HTTP error, unparseable body, connection error,
//! timeout) into a [`RequestResult`]. Nothing is raised across this boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::domain::types::INVALID_JSON_MESSAGE;
use crate::domain::{
    ApiRequest, ConfigProvider, DomainError, ErrorContext, ErrorKind, HttpMethod, ObserverError,
    RequestEvent, RequestObserver, RequestResult, ServiceName, Transport,
    build_error_from_response, normalize_unknown,
};

use super::observer::TracingObserver;
use super::redact::{redact_headers, redact_url};

/// Message of the failure produced when the per-request timer fires.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// HTTP transport over `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: Client,
    config: Arc<dyn ConfigProvider>,
    observer: Arc<dyn RequestObserver>,
}

impl HttpTransport {
    /// Create a transport reading hosts from `config`.
    ///
    /// The client itself has no timeout; each request carries its own.
    pub fn new(config: Arc<dyn ConfigProvider>) -> Result<Self, DomainError> {
        let http_client = Client::builder().build().map_err(|e| {
            DomainError::new(
                ErrorKind::InternalError,
                format!("Failed to create HTTP client: {}", e),
            )
            .with_cause(e)
        })?;

        Ok(Self::with_client(http_client, config))
    }

    #[must_use]
    pub fn with_client(http_client: Client, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            http_client,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the default tracing observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Perform `request` and decode a successful body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> RequestResult<T> {
        let request_id = Uuid::new_v4().to_string();

        let url = match self.resolve_url(&request) {
            Ok(url) => url,
            Err(error) => {
                return RequestResult::failure(
                    error
                        .with_context_value("requestId", request_id.as_str())
                        .with_context_value("method", request.method.as_str()),
                );
            }
        };

        let display_url = redact_url(&url);
        let event = RequestEvent {
            request_id: &request_id,
            method: request.method,
            url: &display_url,
        };
        let context = error_context(&event);
        let span = info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method,
            url = %display_url
        );

        async {
            self.notify(|observer| observer.on_request_start(&event));
            debug!(headers = ?redact_headers(&request.headers), "Request headers");

            let timeout = Duration::from_millis(request.timeout_ms);

            // The timer and the in-flight request live inside this one future:
            // whichever way it completes, dropping it disarms the timer and
            // aborts the request.
            let result = match tokio::time::timeout(
                timeout,
                self.perform::<T>(&url, &request, &event, &context),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => RequestResult::failure(timeout_error(&context, request.timeout_ms)),
            };

            if let Some(error) = result.error() {
                self.notify(|observer| observer.on_error(&event, error));
            }
            result
        }
        .instrument(span)
        .await
    }

    fn resolve_url(&self, request: &ApiRequest) -> Result<String, DomainError> {
        resolve_url(self.config.as_ref(), request)
    }

    async fn perform<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &ApiRequest,
        event: &RequestEvent<'_>,
        context: &ErrorContext,
    ) -> RequestResult<T> {
        let headers = match build_headers(&request.headers) {
            Ok(headers) => headers,
            Err(error) => return RequestResult::failure(error.with_context(context.clone())),
        };

        let mut builder = self
            .http_client
            .request(request.method.into(), url)
            .headers(headers);

        if request.method.allows_body() {
            if let Some(body) = request.body.as_ref() {
                match serde_json::to_vec(body) {
                    Ok(bytes) => builder = builder.body(bytes),
                    Err(e) => {
                        return RequestResult::failure(normalize_unknown(e, context.clone()));
                    }
                }
            }
        }

        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return RequestResult::failure(timeout_error(context, request.timeout_ms));
            }
            Err(e) => {
                return RequestResult::failure(normalize_unknown(e.without_url(), context.clone()));
            }
        };

        let status = response.status();
        let response_headers = collect_headers(response.headers());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return RequestResult::failure(normalize_unknown(e.without_url(), context.clone()));
            }
        };

        self.notify(|observer| {
            observer.on_response(event, status.as_u16(), started.elapsed().as_millis())
        });

        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| {
                json!({
                    "error": format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown Status")
                    )
                })
            });
            return RequestResult::failure(build_error_from_response(
                status.as_u16(),
                &body,
                context.clone(),
            ));
        }

        let empty_allowed =
            request.method == HttpMethod::Head || status == StatusCode::NO_CONTENT;
        match decode_body::<T>(&bytes, empty_allowed) {
            Ok(data) => RequestResult::success(data, response_headers),
            Err(e) => RequestResult::failure(
                DomainError::network(INVALID_JSON_MESSAGE)
                    .with_cause(e)
                    .with_context(context.clone())
                    .with_context_value("httpStatus", status.as_u16()),
            ),
        }
    }

    /// Observer failures are logged and dropped; they never reach the caller.
    fn notify<F>(&self, hook: F)
    where
        F: FnOnce(&dyn RequestObserver) -> Result<(), ObserverError>,
    {
        if let Err(e) = hook(self.observer.as_ref()) {
            debug!(error = %e, "Request observer error ignored");
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> RequestResult<Value> {
        self.send::<Value>(request).await
    }
}

/// Full URL for `request`: its path verbatim when absolute, otherwise the
/// primary or relay host followed by the path.
pub fn resolve_url(
    config: &dyn ConfigProvider,
    request: &ApiRequest,
) -> Result<String, DomainError> {
    if request.is_absolute_url {
        return Ok(request.path.clone());
    }

    let service = if request.use_relay_host {
        ServiceName::Relay
    } else {
        ServiceName::Api
    };
    let host = config.resolve_service_host(service)?;
    Ok(format!("{}{}", host, request.path))
}

/// Redacted url and method of `request`, for errors raised after the
/// transport has returned.
pub fn request_context(config: &dyn ConfigProvider, request: &ApiRequest) -> ErrorContext {
    let url = resolve_url(config, request).unwrap_or_else(|_| request.path.clone());
    let mut context = ErrorContext::new();
    context.insert("url".to_string(), Value::String(redact_url(&url)));
    context.insert(
        "method".to_string(),
        Value::String(request.method.as_str().to_string()),
    );
    context
}

fn error_context(event: &RequestEvent<'_>) -> ErrorContext {
    let mut context = ErrorContext::new();
    context.insert("url".to_string(), Value::String(event.url.to_string()));
    context.insert(
        "method".to_string(),
        Value::String(event.method.as_str().to_string()),
    );
    context.insert(
        "requestId".to_string(),
        Value::String(event.request_id.to_string()),
    );
    context
}

fn timeout_error(context: &ErrorContext, timeout_ms: u64) -> DomainError {
    DomainError::timeout(TIMEOUT_MESSAGE)
        .with_context(context.clone())
        .with_context_value("timeoutMs", timeout_ms)
}

/// Caller headers merged over the default JSON content type.
fn build_headers(custom: &HashMap<String, String>) -> Result<HeaderMap, DomainError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in custom {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            DomainError::invalid_input(format!("Invalid header name: {}", name)).with_cause(e)
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            DomainError::invalid_input(format!("Invalid value for header {}", name)).with_cause(e)
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Flatten response headers. Repeated headers are joined with `", "`;
/// non-UTF-8 bytes are replaced lossily.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    collected
}

/// Decode a 2xx body. An empty body is invalid JSON unless the response
/// cannot carry one (HEAD, 204), in which case it decodes as `null`.
fn decode_body<T: DeserializeOwned>(
    bytes: &[u8],
    empty_allowed: bool,
) -> Result<T, serde_json::Error> {
    if empty_allowed && bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null);
    }
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::ClientConfig;

    fn transport(config: ClientConfig) -> HttpTransport {
        HttpTransport::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_resolve_url_primary_and_relay() {
        let config = ClientConfig::default()
            .with_host(ServiceName::Api, "https://api.test")
            .with_host(ServiceName::Relay, "https://relay.test/");
        let transport = transport(config);

        let url = transport.resolve_url(&ApiRequest::get("/users/me")).unwrap();
        assert_eq!(url, "https://api.test/users/me");

        let url = transport
            .resolve_url(&ApiRequest::get("/attest").relay())
            .unwrap();
        assert_eq!(url, "https://relay.test/attest");

        let url = transport
            .resolve_url(&ApiRequest::get("https://other.test/x").absolute())
            .unwrap();
        assert_eq!(url, "https://other.test/x");
    }

    #[test]
    fn test_build_headers_defaults_and_overrides() {
        let headers = build_headers(&HashMap::new()).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");

        let mut custom = HashMap::new();
        custom.insert("content-type".to_string(), "text/plain".to_string());
        custom.insert("X-Client".to_string(), "wallet".to_string());
        let headers = build_headers(&custom).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(headers["x-client"], "wallet");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_build_headers_rejects_invalid_name() {
        let mut custom = HashMap::new();
        custom.insert("bad header".to_string(), "x".to_string());
        let err = build_headers(&custom).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_decode_body_empty_only_when_allowed() {
        let value: Value = decode_body(b"", true).unwrap();
        assert_eq!(value, Value::Null);
        assert!(decode_body::<Value>(b"", false).is_err());
        assert!(decode_body::<Vec<String>>(b"  ", true).is_err());
        assert!(decode_body::<Value>(b"<html>", true).is_err());
    }

    #[test]
    fn test_collect_headers_joins_repeats_and_keeps_non_utf8() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let collected = collect_headers(&headers);

        assert_eq!(collected["set-cookie"], "a=1, b=2");
        assert_eq!(collected["x-raw"], "caf\u{fffd}");
    }

    #[test]
    fn test_request_context_redacts_url() {
        let config = ClientConfig::default().with_host(ServiceName::Api, "https://api.test");

        let context = request_context(&config, &ApiRequest::post("/otp?token=abc", json!({})));
        assert_eq!(context["url"], "https://api.test/otp?token=[REDACTED]");
        assert_eq!(context["method"], "POST");

        let unresolvable = ClientConfig::default().with_host(ServiceName::Api, "");
        let context = request_context(&unresolvable, &ApiRequest::get("/me"));
        assert_eq!(context["url"], "/me");
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_failure_envelope() {
        let config = ClientConfig::default().with_host(ServiceName::Api, "");
        let result = transport(config).send::<Value>(ApiRequest::get("/x")).await;
        let err = result.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(err.context()["method"], "GET");
    }
}
