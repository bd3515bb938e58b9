//! Bitcoin via an Esplora-compatible block explorer API.

use serde_json::Value;

use crate::domain::amount::{BTC_DECIMALS, format_base_units, parse_integer_amount};
use crate::domain::{ApiRequest, Direction, DomainError, Transaction};

use super::{ChainAdapter, explorer_tx_url, endpoint};

pub struct BitcoinAdapter {
    api_host: String,
    explorer_host: String,
}

impl BitcoinAdapter {
    pub fn new(api_host: impl Into<String>, explorer_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            explorer_host: explorer_host.into(),
        }
    }
}

fn pays_to(output: &Value, address: &str) -> bool {
    output.get("scriptpubkey_address").and_then(Value::as_str) == Some(address)
}

fn output_value(output: &Value) -> i128 {
    output
        .get("value")
        .and_then(parse_integer_amount)
        .unwrap_or(0)
}

/// Incoming if any output pays the address, with that output's value.
/// Otherwise outgoing, valued at the spent input that belonged to the address.
fn classify_tx(tx: &Value, address: &str) -> (Direction, i128) {
    let received = tx
        .get("vout")
        .and_then(Value::as_array)
        .and_then(|outputs| outputs.iter().find(|output| pays_to(output, address)));

    if let Some(output) = received {
        return (Direction::In, output_value(output));
    }

    let spent = tx
        .get("vin")
        .and_then(Value::as_array)
        .and_then(|inputs| {
            inputs
                .iter()
                .filter_map(|input| input.get("prevout"))
                .find(|prevout| pays_to(prevout, address))
        })
        .map(output_value)
        .unwrap_or(0);

    (Direction::Out, spent)
}

impl ChainAdapter for BitcoinAdapter {
    fn name(&self) -> &'static str {
        "bitcoin"
    }

    fn balance_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let url = endpoint(&self.api_host, &["address", address], &[])?;
        Ok(ApiRequest::get(url).absolute())
    }

    fn parse_balance(&self, payload: &Value) -> Option<String> {
        let stats = payload.get("chain_stats")?;
        let funded = parse_integer_amount(stats.get("funded_txo_sum")?)?;
        let spent = parse_integer_amount(stats.get("spent_txo_sum")?)?;
        Some(format_base_units(funded - spent, BTC_DECIMALS))
    }

    fn history_request(&self, address: &str) -> Result<ApiRequest, DomainError> {
        let url = endpoint(&self.api_host, &["address", address, "txs"], &[])?;
        Ok(ApiRequest::get(url).absolute())
    }

    fn parse_history(&self, payload: &Value, address: &str) -> Option<Vec<Transaction>> {
        let txs = payload.as_array()?;
        Some(
            txs.iter()
                .filter_map(|tx| {
                    let txid = tx.get("txid")?.as_str()?;
                    let (direction, value) = classify_tx(tx, address);
                    Some(Transaction::new(
                        txid,
                        direction,
                        format_base_units(value, BTC_DECIMALS),
                        explorer_tx_url(&self.explorer_host, txid),
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

    const ADDR: &str = "bc1qalice";

    fn adapter() -> BitcoinAdapter {
        BitcoinAdapter::new("https://blockstream.info/api", "https://blockstream.info")
    }

    #[test]
    fn test_parse_balance() {
        let payload = json!({
            "address": ADDR,
            "chain_stats": {"funded_txo_sum": 200000000, "spent_txo_sum": 100000000}
        });
        assert_eq!(adapter().parse_balance(&payload), Some("1.00000000".to_string()));
    }

    #[test]
    fn test_parse_balance_malformed() {
        assert_eq!(adapter().parse_balance(&json!({"address": ADDR})), None);
        assert_eq!(
            adapter().parse_balance(&json!({"chain_stats": {"funded_txo_sum": "x"}})),
            None
        );
    }

    #[test]
    fn test_requests() {
        assert_eq!(
            adapter().balance_request(ADDR).unwrap().path,
            "https://blockstream.info/api/address/bc1qalice"
        );
        assert_eq!(
            adapter().history_request(ADDR).unwrap().path,
            "https://blockstream.info/api/address/bc1qalice/txs"
        );
    }

    #[test]
    fn test_parse_history_in_and_out() {
        let payload = json!([
            {
                "txid": "aaa",
                "vin": [{"prevout": {"scriptpubkey_address": "bc1qbob", "value": 90000}}],
                "vout": [
                    {"scriptpubkey_address": "bc1qbob", "value": 10000},
                    {"scriptpubkey_address": ADDR, "value": 75000}
                ]
            },
            {
                "txid": "bbb",
                "vin": [
                    {"prevout": {"scriptpubkey_address": "bc1qcarol", "value": 1}},
                    {"prevout": {"scriptpubkey_address": ADDR, "value": 150000000}}
                ],
                "vout": [{"scriptpubkey_address": "bc1qcarol", "value": 149990000}]
            },
            {
                "txid": "ccc",
                "vin": [{"is_coinbase": true}],
                "vout": [{"scriptpubkey_address": "bc1qminer", "value": 5}]
            }
        ]);

        let history = adapter().parse_history(&payload, ADDR).unwrap();
        assert_eq!(
            history,
            vec![
                Transaction::new("aaa", Direction::In, "0.00075000", "https://blockstream.info/tx/aaa"),
                Transaction::new("bbb", Direction::Out, "1.50000000", "https://blockstream.info/tx/bbb"),
                Transaction::new("ccc", Direction::Out, "0.00000000", "https://blockstream.info/tx/ccc"),
            ]
        );
    }

    #[test]
    fn test_parse_history_malformed() {
        assert!(adapter().parse_history(&json!({"error": "x"}), ADDR).is_none());
        let history = adapter().parse_history(&json!([{"vout": []}]), ADDR).unwrap();
        assert!(history.is_empty());
    }
}
