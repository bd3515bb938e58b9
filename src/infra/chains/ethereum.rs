//! Ethereum via an Etherscan-compatible explorer proxy.
//!
//! Responses look like `{"status": "1", "message": "OK", "result": ...}`.
//! On errors the proxy still answers 200 with `status: "0"` and a text
//! `result`, which the parsers treat as a malformed payload.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::domain::amount::{ETH_DECIMALS, format_base_units, parse_integer_amount};
use crate::domain::{ApiRequest, Direction, DomainError, Transaction};

use super::{ChainAdapter, HISTORY_LIMIT, endpoint, explorer_tx_url};

pub struct EthereumAdapter {
    api_host: String,
    explorer_host: String,
    api_key: Option<SecretString>,
}

impl EthereumAdapter {
    pub fn new(
        api_host: impl Into<String>,
        explorer_host: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            api_host: api_host.into(),
            explorer_host: explorer_host.into(),
            api_key,
        }
    }

    fn account_url(&self, action: &str, address: &str, extra: &[(&str, &str)]) -> Result<String, DomainError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("module", "account"),
            ("action", action),
            ("address", address),
        ];
        query.extend_from_slice(extra);
        if let Some(key) = self.api_key.as_ref() {
            query.push(("apikey", key.expose_secret()));
        }
        endpoint(&self.api_host, &[], &query)
    }
}

impl ChainAdapter for EthereumAdapter {
    fn name(&self) -> &'static str {
        "ethereum"
    }

    fn balance_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let url = self.account_url("balance", address, &[("tag", "latest")])?;
        Ok(ApiRequest::get(url).absolute())
    }

    fn parse_balance(&self, payload: &Value) -> Option<String> {
        let wei = parse_integer_amount(payload.get("result")?)?;
        Some(format_base_units(wei, ETH_DECIMALS))
    }

    fn history_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let offset = HISTORY_LIMIT.to_string();
        let url = self.account_url(
            "txlist",
            address,
            &[
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", &offset),
                ("sort", "desc"),
            ],
        )?;
        Ok(ApiRequest::get(url).absolute())
    }

    fn parse_history(&self, payload: &Value, address: &str) -> Option<Vec<Transaction>> {
        let txs = payload.get("result")?.as_array()?;
        Some(
            txs.iter()
                .filter_map(|tx| {
                    let hash = tx.get("hash")?.as_str()?;
                    let incoming = tx
                        .get("to")
                        .and_then(Value::as_str)
                        .is_some_and(|to| to.eq_ignore_ascii_case(address));
                    let direction = if incoming { Direction::In } else { Direction::Out };
                    let wei = tx
                        .get("value")
                        .and_then(parse_integer_amount)
                        .unwrap_or(0);
                    Some(Transaction::new(
                        hash,
                        direction,
                        format_base_units(wei, ETH_DECIMALS),
                        explorer_tx_url(&self.explorer_host, hash),
                    ))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0xAbCdEf0000000000000000000000000000000001";

    fn adapter() -> EthereumAdapter {
        EthereumAdapter::new("https://api.etherscan.io/api", "https://etherscan.io", None)
    }

    #[test]
    fn test_parse_balance() {
        let payload = json!({"status": "1", "message": "OK", "result": "1000000000000000000"});
        assert_eq!(adapter().parse_balance(&payload), Some("1.00000000".to_string()));
    }

    #[test]
    fn test_parse_balance_missing_or_error_result() {
        assert_eq!(adapter().parse_balance(&json!({"status": "1"})), None);
        assert_eq!(
            adapter().parse_balance(&json!({"status": "0", "result": "Invalid API Key"})),
            None
        );
    }

    #[test]
    fn test_balance_request_includes_api_key() {
        let adapter = EthereumAdapter::new(
            "https://api.etherscan.io/api",
            "https://etherscan.io",
            Some(SecretString::from("KEY123".to_string())),
        );
        let request = adapter.balance_request(ADDR).unwrap();
        assert_eq!(
            request.path,
            format!(
                "https://api.etherscan.io/api?module=account&action=balance&address={}&tag=latest&apikey=KEY123",
                ADDR
            )
        );
    }

    #[test]
    fn test_parse_history_direction_is_case_insensitive() {
        let payload = json!({
            "status": "1",
            "result": [
                {"hash": "0x01", "from": "0xbob", "to": ADDR.to_lowercase(), "value": "2500000000000000000"},
                {"hash": "0x02", "from": ADDR, "to": "0xcarol", "value": "100000000000000"},
                {"hash": "0x03", "from": ADDR, "to": "", "value": "0"}
            ]
        });

        let history = adapter().parse_history(&payload, ADDR).unwrap();
        assert_eq!(
            history,
            vec![
                Transaction::new("0x01", Direction::In, "2.50000000", "https://etherscan.io/tx/0x01"),
                Transaction::new("0x02", Direction::Out, "0.00010000", "https://etherscan.io/tx/0x02"),
                Transaction::new("0x03", Direction::Out, "0.00000000", "https://etherscan.io/tx/0x03"),
            ]
        );
    }

    #[test]
    fn test_parse_history_error_result() {
        let payload = json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"});
        assert!(adapter().parse_history(&payload, ADDR).is_none());
    }
}
