use bitcoin::Amount;

use crate::error::CoreError;

/// Parse a fee rate in coin units per kvB. The daemon reports `-1` when it
/// cannot estimate, which maps to `None`.
pub(super) fn parse_fee_rate(value: &serde_json::Value) -> Result<Option<Amount>, CoreError> {
    if value.as_f64().is_some_and(|rate| rate < 0.0) {
        return Ok(None);
    }
    parse_btc_amount(value).map(Some)
}

/// Parse a coin amount from a JSON value.
///
/// Number values are parsed via `Amount::from_float_in` to support scientific
/// notation, while string values are parsed via `Amount::from_str_in`.
pub(super) fn parse_btc_amount(value: &serde_json::Value) -> Result<Amount, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::InvalidData(format!("invalid amount `{value}`")))?;
            Amount::from_float_in(parsed, bitcoin::Denomination::Bitcoin)
                .map_err(|e| CoreError::InvalidData(format!("invalid amount `{value}`: {e}")))
        }
        serde_json::Value::String(s) => Amount::from_str_in(s, bitcoin::Denomination::Bitcoin)
            .map_err(|e| CoreError::InvalidData(format!("invalid amount `{s}`: {e}"))),
        _ => Err(CoreError::InvalidData(format!(
            "expected numeric amount, got: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_parse_from_numbers_strings_and_exponents() {
        let cases = [
            (serde_json::json!(0.00001), 1_000),
            (serde_json::json!("0.5"), 50_000_000),
            (serde_json::json!(6.6e-6), 660),
            (serde_json::json!(12), 1_200_000_000),
        ];
        for (raw, sats) in cases {
            let amount = parse_btc_amount(&raw).expect("amount must parse");
            assert_eq!(amount, Amount::from_sat(sats), "for {raw}");
        }
    }

    #[test]
    fn non_numeric_amount_is_invalid_data() {
        let err = parse_btc_amount(&serde_json::json!(true)).expect_err("bool is not an amount");
        assert!(matches!(err, CoreError::InvalidData(_)));
    }

    #[test]
    fn fee_rate_of_minus_one_means_no_estimate() {
        assert_eq!(parse_fee_rate(&serde_json::json!(-1)).expect("must parse"), None);
        assert_eq!(
            parse_fee_rate(&serde_json::json!(0.0002)).expect("must parse"),
            Some(Amount::from_sat(20_000))
        );
    }
}
