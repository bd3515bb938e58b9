//! Internal ledger-style chain (account/action model, EOSIO-compatible API).
//!
//! Balances come from `POST /v1/chain/get_currency_balance`, which returns an
//! array of `"<amount> <symbol>"` strings. History comes from the Hyperion
//! `GET /v2/history/get_actions` endpoint; only token transfers of the
//! configured contract are kept. The chain has no public explorer, so
//! `explorer_url` is always empty.

use serde_json::{Value, json};

use crate::domain::amount::asset_amount;
use crate::domain::{ApiRequest, Direction, DomainError, InternalChainConfig, Transaction};

use super::{ChainAdapter, HISTORY_LIMIT, endpoint};

const TRANSFER_ACTION: &str = "transfer";

pub struct InternalChainAdapter {
    api_host: String,
    config: InternalChainConfig,
}

impl InternalChainAdapter {
    pub fn new(api_host: impl Into<String>, config: InternalChainConfig) -> Self {
        Self {
            api_host: api_host.into(),
            config,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.config.ticker
    }

    /// Pull one transfer out of an action record.
    ///
    /// Hyperion v2 returns flat records (`{trx_id, act}`); v1-style nodes wrap
    /// them in `action_trace`. Both are accepted.
    fn transfer_from_action(&self, item: &Value, address: &str) -> Option<Transaction> {
        let trace = item.get("action_trace").unwrap_or(item);
        let act = trace.get("act")?;

        if act.get("account")?.as_str()? != self.config.token_contract
            || act.get("name")?.as_str()? != TRANSFER_ACTION
        {
            return None;
        }

        let data = act.get("data")?;
        let trx_id = trace
            .get("trx_id")
            .or_else(|| item.get("trx_id"))?
            .as_str()?;
        let quantity = data.get("quantity")?.as_str()?;
        let amount = asset_amount(quantity)?;

        let direction = if data.get("to").and_then(Value::as_str) == Some(address) {
            Direction::In
        } else {
            Direction::Out
        };

        Some(Transaction::new(trx_id, direction, amount, ""))
    }
}

impl ChainAdapter for InternalChainAdapter {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn balance_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let url = endpoint(
            &self.api_host,
            &["v1", "chain", "get_currency_balance"],
            &[],
        )?;
        let body = json!({
            "account": address,
            "code": self.config.token_contract,
            "symbol": self.config.ticker,
        });
        Ok(ApiRequest::post(url, body).absolute())
    }

    fn parse_balance(&self, payload: &Value) -> Option<String> {
        let balances = payload.as_array()?;
        match balances.first() {
            None => Some("0".to_string()),
            Some(first) => asset_amount(first.as_str()?).map(str::to_string),
        }
    }

    fn history_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let filter = format!("{}:{}", self.config.token_contract, TRANSFER_ACTION);
        let limit = HISTORY_LIMIT.to_string();
        let url = endpoint(
            &self.api_host,
            &["v2", "history", "get_actions"],
            &[
                ("account", address),
                ("filter", &filter),
                ("limit", &limit),
                ("sort", "desc"),
            ],
        )?;
        Ok(ApiRequest::get(url).absolute())
    }

    fn parse_history(&self, payload: &Value, address: &str) -> Option<Vec<Transaction>> {
        let actions = payload.get("actions")?.as_array()?;
        Some(
            actions
                .iter()
                .filter_map(|item| self.transfer_from_action(item, address))
                .take(HISTORY_LIMIT)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> InternalChainAdapter {
        InternalChainAdapter::new("https://chain.test", InternalChainConfig::default())
    }

    fn transfer(trx_id: &str, contract: &str, from: &str, to: &str, quantity: &str) -> Value {
        json!({
            "trx_id": trx_id,
            "act": {
                "account": contract,
                "name": "transfer",
                "data": {"from": from, "to": to, "quantity": quantity, "memo": ""}
            }
        })
    }

    #[test]
    fn test_balance_request_shape() {
        let request = adapter().balance_request("alice").unwrap();
        assert_eq!(request.path, "https://chain.test/v1/chain/get_currency_balance");
        assert!(request.is_absolute_url);
        assert_eq!(
            request.body,
            Some(json!({"account": "alice", "code": "eosio.token", "symbol": "EOS"}))
        );
    }

    #[test]
    fn test_parse_balance() {
        let adapter = adapter();
        assert_eq!(
            adapter.parse_balance(&json!(["12.3456 EOS"])),
            Some("12.3456".to_string())
        );
        assert_eq!(adapter.parse_balance(&json!([])), Some("0".to_string()));
        assert_eq!(adapter.parse_balance(&json!({"error": "x"})), None);
        assert_eq!(adapter.parse_balance(&json!([42])), None);
    }

    #[test]
    fn test_history_request_query() {
        let request = adapter().history_request("alice").unwrap();
        assert_eq!(
            request.path,
            "https://chain.test/v2/history/get_actions?account=alice&filter=eosio.token%3Atransfer&limit=20&sort=desc"
        );
    }

    #[test]
    fn test_parse_history_filters_and_directs() {
        let payload = json!({
            "actions": [
                transfer("t1", "eosio.token", "bob", "alice", "5.0000 EOS"),
                transfer("t2", "eosio.token", "alice", "carol", "1.5000 EOS"),
                transfer("t3", "fake.token", "mallory", "alice", "999.0000 EOS"),
                {"trx_id": "t4", "act": {"account": "eosio.token", "name": "issue", "data": {}}},
                {"action_trace": {
                    "trx_id": "t5",
                    "act": {
                        "account": "eosio.token",
                        "name": "transfer",
                        "data": {"from": "dave", "to": "alice", "quantity": "0.0001 EOS"}
                    }
                }}
            ]
        });

        let history = adapter().parse_history(&payload, "alice").unwrap();
        assert_eq!(
            history,
            vec![
                Transaction::new("t1", Direction::In, "5.0000", ""),
                Transaction::new("t2", Direction::Out, "1.5000", ""),
                Transaction::new("t5", Direction::In, "0.0001", ""),
            ]
        );
    }

    #[test]
    fn test_parse_history_caps_at_limit() {
        let actions: Vec<Value> = (0..30)
            .map(|i| transfer(&format!("t{}", i), "eosio.token", "bob", "alice", "1.0000 EOS"))
            .collect();
        let history = adapter()
            .parse_history(&json!({ "actions": actions }), "alice")
            .unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_parse_history_malformed() {
        assert!(adapter().parse_history(&json!([]), "alice").is_none());
        assert!(adapter().parse_history(&json!({"actions": "nope"}), "alice").is_none());
    }
}
