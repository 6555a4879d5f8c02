//! Field parsers for the order table.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sales_core::types::start_of_day;
use std::str::FromStr;

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an order timestamp and normalize it to UTC.
///
/// Offset-bearing values are converted; naive values are taken as UTC.
pub fn parse_order_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(start_of_day(day));
    }
    Err(format!("orderDate `{raw}` is not a recognised timestamp"))
}

/// Parse a per-unit price.
pub fn parse_money(column: &str, raw: &str) -> Result<Decimal, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(format!("{column} is empty"));
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| format!("{column} `{raw}` is not a number"))
}

/// Parse a non-negative whole quantity. `3.0` is accepted, `2.5` is not.
pub fn parse_quantity(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if let Ok(q) = raw.parse::<u32>() {
        return Ok(q);
    }
    let value = Decimal::from_str(raw).map_err(|_| format!("quantity `{raw}` is not a number"))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("quantity `{raw}` must be non-negative"));
    }
    if !value.fract().is_zero() {
        return Err(format!("quantity `{raw}` is not a whole number"));
    }
    value
        .to_u32()
        .ok_or_else(|| format!("quantity `{raw}` is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(parse_order_date("2024-03-05T14:30:00Z").unwrap(), expected);
        assert_eq!(parse_order_date("2024-03-05 14:30:00").unwrap(), expected);
        assert_eq!(parse_order_date("2024-03-05T14:30:00").unwrap(), expected);
        assert_eq!(parse_order_date("2024-03-05 14:30").unwrap(), expected);
        assert_eq!(parse_order_date("2024-03-05 16:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_order_date(" 2024-03-05 14:30:00.000 ").unwrap(), expected);
        assert_eq!(
            parse_order_date("2024-03-05").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = parse_order_date("2024-03-05T23:30:00-05:00").unwrap();
        let twice = parse_order_date(&once.to_rfc3339()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, Utc.with_ymd_and_hms(2024, 3, 6, 4, 30, 0).unwrap());
    }

    #[test]
    fn test_bad_timestamp() {
        let err = parse_order_date("05/03/2024").unwrap_err();
        assert!(err.contains("orderDate"));
        assert!(parse_order_date("").is_err());
    }

    #[test]
    fn test_money() {
        assert_eq!(parse_money("sellingPrice", "12.50").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_money("sellingPrice", "1e2").unwrap(), Decimal::from(100));
        assert!(parse_money("costPrice", "").unwrap_err().contains("costPrice"));
        assert!(parse_money("costPrice", "abc").is_err());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(parse_quantity("4").unwrap(), 4);
        assert_eq!(parse_quantity("0").unwrap(), 0);
        assert_eq!(parse_quantity("3.0").unwrap(), 3);
        assert!(parse_quantity("-1").unwrap_err().contains("non-negative"));
        assert!(parse_quantity("2.5").unwrap_err().contains("whole"));
        assert!(parse_quantity("many").is_err());
    }
}
