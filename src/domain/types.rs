//! Domain types: the transport envelope, normalized ledger entries, coins,
//! wallet addresses and the externally produced passkey credential.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::error::{DomainError, ErrorContext, ErrorKind};

/// HTTP verbs supported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// GET and HEAD never carry a request body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// A single request handed to the transport.
///
/// `path` is appended to the primary API host, or to the relay host when
/// `use_relay_host` is set, unless `is_absolute_url` says it is already a
/// full URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
    pub use_relay_host: bool,
    pub is_absolute_url: bool,
    pub timeout_ms: u64,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            headers: HashMap::new(),
            use_relay_host: false,
            is_absolute_url: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Head, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach an `Authorization: Bearer` header. Logged only in redacted form.
    #[must_use]
    pub fn bearer_token(self, token: &secrecy::SecretString) -> Self {
        use secrecy::ExposeSecret;
        let value = format!("Bearer {}", token.expose_secret());
        self.with_header("Authorization", value)
    }

    /// Route to the relay/enclave host instead of the primary API host.
    #[must_use]
    pub fn relay(mut self) -> Self {
        self.use_relay_host = true;
        self
    }

    /// Treat `path` as a complete URL.
    #[must_use]
    pub fn absolute(mut self) -> Self {
        self.is_absolute_url = true;
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Deployment environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Develop,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Develop => "develop",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "develop" | "dev" | "development" => Ok(Self::Develop),
            "staging" | "stage" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote services whose hosts depend on the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    /// Primary wallet/identity API
    Api,
    /// Relay/enclave service for attestation and key encryption
    Relay,
    /// Internal chain node API
    InternalChain,
    BitcoinApi,
    /// Public web explorer used for transaction links
    BitcoinExplorer,
    EthereumApi,
    EthereumExplorer,
}

impl ServiceName {
    pub const ALL: [ServiceName; 7] = [
        Self::Api,
        Self::Relay,
        Self::InternalChain,
        Self::BitcoinApi,
        Self::BitcoinExplorer,
        Self::EthereumApi,
        Self::EthereumExplorer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Relay => "relay",
            Self::InternalChain => "internal-chain",
            Self::BitcoinApi => "bitcoin-api",
            Self::BitcoinExplorer => "bitcoin-explorer",
            Self::EthereumApi => "ethereum-api",
            Self::EthereumExplorer => "ethereum-explorer",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform envelope returned by the transport instead of raising.
///
/// Exactly one branch exists per value, so success data and failure details
/// can never be present together. The failure message and status are read
/// from the error itself and cannot disagree with it.
#[derive(Debug, Clone)]
pub enum RequestResult<T> {
    Success {
        data: T,
        headers: HashMap<String, String>,
    },
    Failure { error: DomainError },
}

impl<T> RequestResult<T> {
    pub fn success(data: T, headers: HashMap<String, String>) -> Self {
        Self::Success { data, headers }
    }

    pub fn failure(error: DomainError) -> Self {
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Success { headers, .. } => Some(headers),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DomainError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error().map(DomainError::message)
    }

    pub fn http_status(&self) -> Option<u16> {
        self.error().and_then(DomainError::http_status)
    }

    /// Cross the boundary from "failures as data" to "failures as errors".
    pub fn into_result(self) -> Result<T, DomainError> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }

    pub fn map<U, F>(self, f: F) -> RequestResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success { data, headers } => RequestResult::Success {
                data: f(data),
                headers,
            },
            Self::Failure { error } => RequestResult::Failure { error },
        }
    }
}

impl RequestResult<Value> {
    /// Decode the JSON payload into a concrete type.
    ///
    /// A payload that does not fit `U` is reported like an unparseable body.
    pub fn decode<U: DeserializeOwned>(self) -> RequestResult<U> {
        self.decode_with_context(&ErrorContext::new())
    }

    /// Like [`decode`](Self::decode), attaching `context` (url, method) to a
    /// decode failure. Failures coming from the transport are left untouched.
    pub fn decode_with_context<U: DeserializeOwned>(
        self,
        context: &ErrorContext,
    ) -> RequestResult<U> {
        match self {
            Self::Success { data, headers } => match serde_json::from_value::<U>(data) {
                Ok(decoded) => RequestResult::Success {
                    data: decoded,
                    headers,
                },
                Err(e) => RequestResult::failure(
                    DomainError::network(INVALID_JSON_MESSAGE)
                        .with_cause(e)
                        .with_context(context.clone()),
                ),
            },
            Self::Failure { error } => RequestResult::Failure { error },
        }
    }
}

/// Message reported when a successful response has an unusable body.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response from server";

/// Direction of a ledger entry relative to the queried address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized ledger entry produced by history aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Chain-native transaction identifier
    pub id: String,
    pub direction: Direction,
    /// Decimal amount in chain-native precision
    pub amount: String,
    /// Public explorer link, empty when the chain has none
    pub explorer_url: String,
}

impl Transaction {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        direction: Direction,
        amount: impl Into<String>,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            amount: amount.into(),
            explorer_url: explorer_url.into(),
        }
    }
}

/// A derived wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address: String,
    pub derivation_path: String,
    /// Coin ticker
    pub coin: String,
}

/// Order addresses for display: the internal chain's coin first, then by address.
pub fn sort_addresses(addresses: &mut [Address], native_ticker: &str) {
    addresses.sort_by(|a, b| {
        let a_native = a.coin.eq_ignore_ascii_case(native_ticker);
        let b_native = b.coin.eq_ignore_ascii_case(native_ticker);
        b_native
            .cmp(&a_native)
            .then_with(|| a.address.cmp(&b.address))
    });
}

pub const DEFAULT_CHAIN_TICKER: &str = "EOS";
pub const DEFAULT_TOKEN_CONTRACT: &str = "eosio.token";

/// Settings for the ledger-style internal chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalChainConfig {
    /// Native coin ticker, e.g. `EOS`
    pub ticker: String,
    /// Account of the token contract whose transfers make up history
    pub token_contract: String,
}

impl Default for InternalChainConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_CHAIN_TICKER.to_string(),
            token_contract: DEFAULT_TOKEN_CONTRACT.to_string(),
        }
    }
}

/// Chains the aggregator knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coin {
    /// The ledger-style internal chain
    Internal,
    Bitcoin,
    Ethereum,
}

impl Coin {
    /// Resolve a ticker. The internal ticker comes from configuration.
    pub fn from_ticker(ticker: &str, internal_ticker: &str) -> Result<Self, DomainError> {
        if ticker == internal_ticker {
            return Ok(Self::Internal);
        }
        match ticker.to_ascii_uppercase().as_str() {
            "BTC" => Ok(Self::Bitcoin),
            "ETH" => Ok(Self::Ethereum),
            _ => Err(DomainError::invalid_input(format!("Unsupported coin: {}", ticker))
                .with_context_value("coin", ticker)),
        }
    }
}

/// What to fetch for a coin/address pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAction {
    Balance,
    History,
}

impl ChainAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::History => "history",
        }
    }
}

impl std::str::FromStr for ChainAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(Self::Balance),
            "history" => Ok(Self::History),
            _ => Err(DomainError::invalid_input(format!("Unsupported action: {}", s))),
        }
    }
}

/// Result of an aggregated chain query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainData {
    Balance(String),
    History(Vec<Transaction>),
}

/// Literal `type` of a WebAuthn public-key credential.
pub const PUBLIC_KEY_CREDENTIAL_TYPE: &str = "public-key";

/// Authenticator response carried by a credential. Only presence is checked.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponse {
    #[serde(rename = "clientDataJSON")]
    #[validate(length(min = 1, message = "clientDataJSON is required"))]
    pub client_data_json: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Credential produced by an external WebAuthn ceremony, passed through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    #[validate(length(min = 1, message = "Credential id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "Credential rawId is required"))]
    pub raw_id: String,
    pub response: Option<AuthenticatorResponse>,
    #[serde(rename = "type")]
    pub credential_type: String,
}

impl PublicKeyCredential {
    /// Check presence and shape without interpreting any cryptographic content.
    pub fn validate_shape(&self) -> Result<(), DomainError> {
        if let Err(errors) = self.validate() {
            return Err(DomainError::validation(
                ErrorKind::MissingRequiredField,
                first_validation_message(&errors),
            ));
        }

        let response = self.response.as_ref().ok_or_else(|| {
            DomainError::validation(
                ErrorKind::MissingRequiredField,
                "Credential response is required",
            )
        })?;

        if let Err(errors) = response.validate() {
            return Err(DomainError::validation(
                ErrorKind::MissingRequiredField,
                first_validation_message(&errors),
            ));
        }

        if self.credential_type != PUBLIC_KEY_CREDENTIAL_TYPE {
            let mut context = ErrorContext::new();
            context.insert("type".to_string(), Value::String(self.credential_type.clone()));
            return Err(DomainError::validation(
                ErrorKind::InvalidFormat,
                format!("Credential type must be '{}'", PUBLIC_KEY_CREDENTIAL_TYPE),
            )
            .with_context(context));
        }

        Ok(())
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid credential".to_string())
}
