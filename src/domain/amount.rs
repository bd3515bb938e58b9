//! Integer-only conversion from chain base units to display decimals.

use serde_json::Value;

/// Number of fractional digits shown for BTC and ETH amounts.
pub const DISPLAY_DECIMALS: u32 = 8;

/// Satoshis per bitcoin (10^8).
pub const BTC_DECIMALS: u32 = 8;

/// Wei per ether (10^18).
pub const ETH_DECIMALS: u32 = 18;

/// Format `raw` base units of a coin with `decimals` places as a decimal
/// string with exactly [`DISPLAY_DECIMALS`] fractional digits.
///
/// Extra precision is rounded half up, away from zero.
///
/// ```
/// use wallet_gateway_client::domain::amount::format_base_units;
///
/// assert_eq!(format_base_units(100_000_000, 8), "1.00000000");
/// assert_eq!(format_base_units(1_000_000_000_000_000_000, 18), "1.00000000");
/// ```
pub fn format_base_units(raw: i128, decimals: u32) -> String {
    let magnitude = raw.unsigned_abs();

    let scaled = if decimals > DISPLAY_DECIMALS {
        match 10u128.checked_pow(decimals - DISPLAY_DECIMALS) {
            Some(divisor) => {
                let quotient = magnitude / divisor;
                let remainder = magnitude % divisor;
                if remainder >= divisor - remainder {
                    quotient + 1
                } else {
                    quotient
                }
            }
            None => 0,
        }
    } else {
        magnitude.saturating_mul(10u128.pow(DISPLAY_DECIMALS - decimals))
    };

    let unit = 10u128.pow(DISPLAY_DECIMALS);
    let sign = if raw < 0 && scaled != 0 { "-" } else { "" };
    format!(
        "{}{}.{:0width$}",
        sign,
        scaled / unit,
        scaled % unit,
        width = DISPLAY_DECIMALS as usize
    )
}

/// Read an integer amount that explorers send either as a JSON number or a
/// decimal string.
pub fn parse_integer_amount(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

/// Numeric part of an `"<amount> <symbol>"` asset string.
pub fn asset_amount(asset: &str) -> Option<&str> {
    asset.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_btc_scale_is_exact() {
        assert_eq!(format_base_units(0, BTC_DECIMALS), "0.00000000");
        assert_eq!(format_base_units(1, BTC_DECIMALS), "0.00000001");
        assert_eq!(format_base_units(123_456_789, BTC_DECIMALS), "1.23456789");
        assert_eq!(format_base_units(-50_000_000, BTC_DECIMALS), "-0.50000000");
    }

    #[test]
    fn test_eth_scale_rounds_half_up() {
        assert_eq!(
            format_base_units(1_000_000_000_000_000_000, ETH_DECIMALS),
            "1.00000000"
        );
        // 0.000000005 ETH rounds up to the 8th digit
        assert_eq!(format_base_units(5_000_000_000, ETH_DECIMALS), "0.00000001");
        assert_eq!(format_base_units(4_999_999_999, ETH_DECIMALS), "0.00000000");
        assert_eq!(
            format_base_units(123_456_789_012_345_678_901, ETH_DECIMALS),
            "123.45678901"
        );
    }

    #[test]
    fn test_fewer_decimals_pad() {
        assert_eq!(format_base_units(15, 1), "1.50000000");
    }

    #[test]
    fn test_parse_integer_amount() {
        assert_eq!(parse_integer_amount(&json!(42)), Some(42));
        assert_eq!(
            parse_integer_amount(&json!("1000000000000000000000")),
            Some(1_000_000_000_000_000_000_000)
        );
        assert_eq!(parse_integer_amount(&json!("Max rate limit reached")), None);
        assert_eq!(parse_integer_amount(&json!(1.5)), None);
        assert_eq!(parse_integer_amount(&Value::Null), None);
    }

    #[test]
    fn test_asset_amount() {
        assert_eq!(asset_amount("12.5000 EOS"), Some("12.5000"));
        assert_eq!(asset_amount("  3.0000   EOS "), Some("3.0000"));
        assert_eq!(asset_amount(""), None);
    }
}
