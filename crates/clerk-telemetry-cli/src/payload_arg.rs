//! `--payload key=value` 인자 파싱.
//!
//! 값은 bool → 정수 → 실수 → 문자열 순으로 해석한다.

use clerk_telemetry_core::models::event::PayloadValue;

/// `key=value` 한 쌍 파싱 (clap `value_parser`)
pub fn parse_payload_field(raw: &str) -> Result<(String, PayloadValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("key=value 형식이어야 합니다: {raw}"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("키가 비어 있습니다: {raw}"));
    }

    Ok((key.to_string(), parse_value(value)))
}

fn parse_value(value: &str) -> PayloadValue {
    match value {
        "true" => return PayloadValue::Bool(true),
        "false" => return PayloadValue::Bool(false),
        _ => {}
    }

    if let Ok(n) = value.parse::<i64>() {
        return PayloadValue::from(n);
    }

    value
        .parse::<f64>()
        .ok()
        .and_then(PayloadValue::float)
        .unwrap_or_else(|| PayloadValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values() {
        assert_eq!(
            parse_payload_field("appearanceProp=true").unwrap(),
            ("appearanceProp".to_string(), PayloadValue::Bool(true))
        );
        assert_eq!(
            parse_payload_field("count=3").unwrap().1,
            PayloadValue::from(3)
        );
        assert_eq!(
            parse_payload_field("ratio=0.25").unwrap().1,
            PayloadValue::float(0.25).unwrap()
        );
        assert_eq!(
            parse_payload_field("component=SignIn").unwrap().1,
            PayloadValue::from("SignIn")
        );
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let (key, value) = parse_payload_field("query=a=b").unwrap();
        assert_eq!(key, "query");
        assert_eq!(value, PayloadValue::from("a=b"));
    }

    #[test]
    fn non_finite_numbers_stay_strings() {
        assert_eq!(
            parse_payload_field("x=NaN").unwrap().1,
            PayloadValue::from("NaN")
        );
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert!(parse_payload_field("novalue").is_err());
        assert!(parse_payload_field("=value").is_err());
    }
}
