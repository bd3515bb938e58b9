//! Error taxonomy shared by the transport, the aggregator and feature wrappers.
//!
//! Every failure in this crate is a [`DomainError`] tagged with one of the
//! closed set of [`ErrorKind`]s. HTTP statuses are mapped onto kinds by
//! [`classify`], error bodies by [`build_error_from_response`], and anything
//! else that was raised by [`normalize_unknown`].

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured context attached to an error for log correlation.
pub type ErrorContext = Map<String, Value>;

/// Message used when the raised value carries no error information at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Closed enumeration of every failure kind the client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NetworkError,
    ApiError,
    TimeoutError,
    RateLimitError,
    InvalidCredentials,
    AuthenticationFailed,
    SessionExpired,
    Unauthorized,
    InvalidPhoneNumber,
    #[serde(rename = "INVALID_OTP")]
    InvalidOtp,
    #[serde(rename = "OTP_EXPIRED")]
    OtpExpired,
    #[serde(rename = "OTP_SEND_FAILED")]
    OtpSendFailed,
    #[serde(rename = "OTP_VERIFY_FAILED")]
    OtpVerifyFailed,
    #[serde(rename = "WEBAUTHN_NOT_SUPPORTED")]
    WebAuthnNotSupported,
    PasskeyCreationFailed,
    PasskeyAuthenticationFailed,
    UserCancelled,
    InvalidInput,
    MissingRequiredField,
    InvalidFormat,
    UnknownError,
    InternalError,
    ServiceUnavailable,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 23] = [
        Self::NetworkError,
        Self::ApiError,
        Self::TimeoutError,
        Self::RateLimitError,
        Self::InvalidCredentials,
        Self::AuthenticationFailed,
        Self::SessionExpired,
        Self::Unauthorized,
        Self::InvalidPhoneNumber,
        Self::InvalidOtp,
        Self::OtpExpired,
        Self::OtpSendFailed,
        Self::OtpVerifyFailed,
        Self::WebAuthnNotSupported,
        Self::PasskeyCreationFailed,
        Self::PasskeyAuthenticationFailed,
        Self::UserCancelled,
        Self::InvalidInput,
        Self::MissingRequiredField,
        Self::InvalidFormat,
        Self::UnknownError,
        Self::InternalError,
        Self::ServiceUnavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiError => "API_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::RateLimitError => "RATE_LIMIT_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpSendFailed => "OTP_SEND_FAILED",
            Self::OtpVerifyFailed => "OTP_VERIFY_FAILED",
            Self::WebAuthnNotSupported => "WEBAUTHN_NOT_SUPPORTED",
            Self::PasskeyCreationFailed => "PASSKEY_CREATION_FAILED",
            Self::PasskeyAuthenticationFailed => "PASSKEY_AUTHENTICATION_FAILED",
            Self::UserCancelled => "USER_CANCELLED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// The family a kind conventionally belongs to.
    pub fn family(&self) -> ErrorFamily {
        match self {
            Self::InvalidCredentials
            | Self::AuthenticationFailed
            | Self::SessionExpired
            | Self::Unauthorized => ErrorFamily::Authentication,
            Self::InvalidPhoneNumber
            | Self::InvalidInput
            | Self::MissingRequiredField
            | Self::InvalidFormat => ErrorFamily::Validation,
            Self::InvalidOtp | Self::OtpExpired | Self::OtpSendFailed | Self::OtpVerifyFailed => {
                ErrorFamily::Otp
            }
            Self::WebAuthnNotSupported
            | Self::PasskeyCreationFailed
            | Self::PasskeyAuthenticationFailed
            | Self::UserCancelled => ErrorFamily::WebAuthn,
            Self::NetworkError | Self::TimeoutError => ErrorFamily::Network,
            Self::ApiError | Self::RateLimitError | Self::ServiceUnavailable => ErrorFamily::Api,
            Self::UnknownError | Self::InternalError => ErrorFamily::General,
        }
    }

    /// Whether a request failing with this kind may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TimeoutError | Self::NetworkError | Self::RateLimitError | Self::ServiceUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Invalid error kind: {}", s))
    }
}

/// Coarse grouping of kinds so callers can match on "what sort of failure".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    Authentication,
    Validation,
    Otp,
    WebAuthn,
    Network,
    Api,
    General,
}

/// The single structured error type used throughout the client.
///
/// Values are immutable after construction: the builder-style `with_*`
/// methods consume and return a new value and are only used while the error
/// is being assembled at the point of failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    http_status: Option<u16>,
    #[source]
    cause: Option<Arc<dyn StdError + Send + Sync>>,
    context: ErrorContext,
    created_at: DateTime<Utc>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            cause: None,
            context: ErrorContext::new(),
            created_at: Utc::now(),
        }
    }

    /// Authentication family, default status 401.
    pub fn authentication(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_status(401)
    }

    /// Validation family, default status 400.
    pub fn validation(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_status(400)
    }

    /// OTP family, default status 400.
    pub fn otp(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_status(400)
    }

    /// WebAuthn family, default status 400.
    pub fn webauthn(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message).with_status(400)
    }

    /// Transport-level failure without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    /// Failure reported by a remote API.
    pub fn api(message: impl Into<String>, http_status: Option<u16>) -> Self {
        let mut error = Self::new(ErrorKind::ApiError, message);
        error.http_status = http_status;
        error
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimeoutError, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::validation(ErrorKind::InvalidInput, message)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    #[must_use]
    pub fn with_shared_cause(mut self, cause: Arc<dyn StdError + Send + Sync>) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Merge entries into the context; existing keys are overwritten.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context.extend(context);
        self
    }

    #[must_use]
    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn family(&self) -> ErrorFamily {
        self.kind.family()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Anything that can be "raised" and later handed to [`normalize_unknown`].
#[derive(Debug)]
pub enum Thrown {
    /// Already typed; normalization returns it untouched.
    Domain(DomainError),
    /// A regular error object.
    Error(Box<dyn StdError + Send + Sync>),
    /// A value that is not an error at all (string, null, number, object).
    Value(Value),
}

impl From<DomainError> for Thrown {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

impl From<reqwest::Error> for Thrown {
    fn from(error: reqwest::Error) -> Self {
        Self::Error(Box::new(error))
    }
}

impl From<serde_json::Error> for Thrown {
    fn from(error: serde_json::Error) -> Self {
        Self::Error(Box::new(error))
    }
}

impl From<Box<dyn StdError + Send + Sync>> for Thrown {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        Self::Error(error)
    }
}

impl From<Value> for Thrown {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Thrown {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Thrown {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

/// Map an HTTP status code onto an error kind. Total over all inputs.
pub fn classify(http_status: u16) -> ErrorKind {
    match http_status {
        400 => ErrorKind::InvalidInput,
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::AuthenticationFailed,
        404 => ErrorKind::ApiError,
        408 => ErrorKind::TimeoutError,
        429 => ErrorKind::RateLimitError,
        500 | 502 | 503 => ErrorKind::ServiceUnavailable,
        504 => ErrorKind::TimeoutError,
        _ => ErrorKind::ApiError,
    }
}

/// Build an error from a non-2xx response and its (possibly synthesized) body.
///
/// The message comes from `body.error`, then `body.message`, then falls back
/// to `"HTTP {status} error"`. The raw body is kept under `responseData`.
pub fn build_error_from_response(
    http_status: u16,
    body: &Value,
    context: ErrorContext,
) -> DomainError {
    let message = message_field(body, "error")
        .or_else(|| message_field(body, "message"))
        .unwrap_or_else(|| format!("HTTP {} error", http_status));

    DomainError::new(classify(http_status), message)
        .with_status(http_status)
        .with_context(context)
        .with_context_value("responseData", body.clone())
}

fn message_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null => None,
        Value::String(_) => None,
        // Some backends nest the message, e.g. {"error": {"message": "..."}}
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        other => Some(other.to_string()),
    }
}

/// Turn an arbitrary raised value into a [`DomainError`].
///
/// Already-typed errors are returned as they are, never re-wrapped.
pub fn normalize_unknown(thrown: impl Into<Thrown>, context: ErrorContext) -> DomainError {
    match thrown.into() {
        Thrown::Domain(error) => error,
        Thrown::Error(error) => {
            let message = error.to_string();
            DomainError::new(ErrorKind::UnknownError, message)
                .with_shared_cause(Arc::from(error))
                .with_context(context)
        }
        Thrown::Value(value) => DomainError::new(ErrorKind::UnknownError, UNKNOWN_ERROR_MESSAGE)
            .with_context(context)
            .with_context_value("originalError", value),
    }
}

/// Errors raised while loading or resolving client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
    #[error("No host configured for service {0}")]
    UnknownService(String),
}

impl From<ConfigError> for DomainError {
    fn from(error: ConfigError) -> Self {
        let message = error.to_string();
        DomainError::new(ErrorKind::InternalError, message).with_cause(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(400), ErrorKind::InvalidInput);
        assert_eq!(classify(401), ErrorKind::Unauthorized);
        assert_eq!(classify(403), ErrorKind::AuthenticationFailed);
        assert_eq!(classify(404), ErrorKind::ApiError);
        assert_eq!(classify(408), ErrorKind::TimeoutError);
        assert_eq!(classify(429), ErrorKind::RateLimitError);
        assert_eq!(classify(500), ErrorKind::ServiceUnavailable);
        assert_eq!(classify(502), ErrorKind::ServiceUnavailable);
        assert_eq!(classify(503), ErrorKind::ServiceUnavailable);
        assert_eq!(classify(504), ErrorKind::TimeoutError);
        assert_eq!(classify(418), ErrorKind::ApiError);
    }

    #[test]
    fn test_classify_is_total() {
        for status in 0..=u16::MAX {
            let kind = classify(status);
            assert!(ErrorKind::ALL.contains(&kind));
        }
    }

    #[test]
    fn test_error_kind_string_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.as_str().parse::<ErrorKind>().unwrap(), kind);
            let serialized = serde_json::to_value(kind).unwrap();
            assert_eq!(serialized, json!(kind.as_str()));
        }
        assert!("NOPE".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_build_error_prefers_error_field() {
        let body = json!({"error": "bad token", "message": "ignored"});
        let err = build_error_from_response(401, &body, ErrorContext::new());
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.message(), "bad token");
        assert_eq!(err.http_status(), Some(401));
        assert_eq!(err.context()["responseData"], body);
    }

    #[test]
    fn test_build_error_falls_back_to_message_then_status() {
        let err = build_error_from_response(429, &json!({"message": "slow down"}), ErrorContext::new());
        assert_eq!(err.message(), "slow down");
        assert_eq!(err.kind(), ErrorKind::RateLimitError);

        let err = build_error_from_response(503, &json!({}), ErrorContext::new());
        assert_eq!(err.message(), "HTTP 503 error");
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_build_error_merges_caller_context() {
        let mut context = ErrorContext::new();
        context.insert("url".to_string(), json!("https://api.test/login"));
        let err = build_error_from_response(400, &json!({"error": "x"}), context);
        assert_eq!(err.context()["url"], json!("https://api.test/login"));
        assert!(err.context().contains_key("responseData"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let original = DomainError::authentication(ErrorKind::SessionExpired, "expired");
        let created_at = original.created_at();
        let normalized = normalize_unknown(original, ErrorContext::new());
        assert_eq!(normalized.kind(), ErrorKind::SessionExpired);
        assert_eq!(normalized.message(), "expired");
        assert_eq!(normalized.http_status(), Some(401));
        assert_eq!(normalized.created_at(), created_at);

        let twice = normalize_unknown(normalized, ErrorContext::new());
        assert_eq!(twice.kind(), ErrorKind::SessionExpired);
        assert!(twice.context().is_empty());
    }

    #[test]
    fn test_normalize_wraps_error_objects() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(io);
        let err = normalize_unknown(boxed, ErrorContext::new());
        assert_eq!(err.kind(), ErrorKind::UnknownError);
        assert_eq!(err.message(), "refused");
        assert!(err.cause().is_some());
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn test_normalize_wraps_plain_values() {
        let err = normalize_unknown("boom", ErrorContext::new());
        assert_eq!(err.kind(), ErrorKind::UnknownError);
        assert_eq!(err.message(), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(err.context()["originalError"], json!("boom"));

        let err = normalize_unknown(Value::Null, ErrorContext::new());
        assert_eq!(err.context()["originalError"], Value::Null);
    }

    #[test]
    fn test_family_constructors_default_status() {
        assert_eq!(
            DomainError::authentication(ErrorKind::InvalidCredentials, "x").http_status(),
            Some(401)
        );
        assert_eq!(
            DomainError::validation(ErrorKind::MissingRequiredField, "x").http_status(),
            Some(400)
        );
        assert_eq!(DomainError::otp(ErrorKind::InvalidOtp, "x").http_status(), Some(400));
        assert_eq!(
            DomainError::webauthn(ErrorKind::UserCancelled, "x").family(),
            ErrorFamily::WebAuthn
        );
        assert_eq!(DomainError::network("x").http_status(), None);
        assert_eq!(DomainError::network("x").family(), ErrorFamily::Network);
    }

    #[test]
    fn test_config_error_converts_to_internal() {
        let err: DomainError = ConfigError::Missing("WALLET_API_HOST".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.message().contains("WALLET_API_HOST"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(DomainError::timeout("t").is_retryable());
        assert!(!DomainError::invalid_input("i").is_retryable());
    }
}
