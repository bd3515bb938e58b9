//! Masking of secrets before they reach logs or error context.

use std::collections::{BTreeMap, HashMap};

pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "proxy-authorization",
];

const SENSITIVE_QUERY_KEYS: &[&str] = &[
    "apikey",
    "api_key",
    "key",
    "token",
    "access_token",
    "refresh_token",
];

/// Copy of `headers` with sensitive values replaced, sorted for stable output.
pub fn redact_headers(headers: &HashMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Mask the values of sensitive query parameters in a URL.
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let (query, fragment) = match query.split_once('#') {
        Some((q, f)) => (q, Some(f)),
        None => (query, None),
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str()) => {
                format!("{}={}", key, REDACTED)
            }
            _ => pair.to_string(),
        })
        .collect();

    let mut out = format!("{}?{}", base, masked.join("&"));
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_headers() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        headers.insert("X-Request-Source".to_string(), "app".to_string());
        let redacted = redact_headers(&headers);
        assert_eq!(redacted["Authorization"], REDACTED);
        assert_eq!(redacted["X-Request-Source"], "app");
    }

    #[test]
    fn test_redact_url_masks_keys() {
        let url = "https://api.etherscan.io/api?module=account&apikey=SECRET&address=0x1";
        assert_eq!(
            redact_url(url),
            "https://api.etherscan.io/api?module=account&apikey=[REDACTED]&address=0x1"
        );
    }

    #[test]
    fn test_redact_url_without_query() {
        assert_eq!(redact_url("https://a.test/x"), "https://a.test/x");
        assert_eq!(
            redact_url("https://a.test/x?token=t#frag"),
            "https://a.test/x?token=[REDACTED]#frag"
        );
    }
}
