//! pt-BR locale normalization for scraped numbers and dates.
//!
//! The source renders "R$ 1.234,56", "12,5%", "1,2 M" and "10/05/2024";
//! everything here turns those into `Decimal`/`NaiveDate` or reports a
//! consistency fault for the caller to skip.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

use crate::indicators::indicators_errors::{IndicatorError, Result};

lazy_static! {
    static ref NUMBER_RE: Regex =
        Regex::new(r"^(?P<number>-?[0-9]{1,3}(?:\.[0-9]{3})*(?:,[0-9]+)?|-?[0-9]+(?:,[0-9]+)?)\s*(?P<suffix>(?i:mil|bi|mi|k|m|b))?$")
            .unwrap();
}

fn normalization_failed(raw: &str, reason: &str) -> IndicatorError {
    IndicatorError::NormalizationFailed {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a pt-BR formatted number, tolerating currency/percent adornment
/// and magnitude suffixes ("1,2 M" -> 1200000).
pub fn parse_decimal_br(raw: &str) -> Result<Decimal> {
    let cleaned = raw
        .replace('\u{a0}', " ")
        .replace("R$", "")
        .replace('%', "")
        .trim()
        .to_string();

    if cleaned.is_empty() || cleaned == "-" || cleaned.eq_ignore_ascii_case("n/a") {
        return Err(normalization_failed(raw, "empty value"));
    }

    let captures = NUMBER_RE
        .captures(&cleaned)
        .ok_or_else(|| normalization_failed(raw, "unrecognized number format"))?;

    let number = captures
        .name("number")
        .map(|m| m.as_str().replace('.', "").replace(',', "."))
        .ok_or_else(|| normalization_failed(raw, "missing numeric part"))?;

    let value = Decimal::from_str(&number)
        .map_err(|e| normalization_failed(raw, &e.to_string()))?;

    let multiplier = match captures.name("suffix").map(|m| m.as_str().to_lowercase()) {
        Some(suffix) if suffix == "mil" || suffix == "k" => dec!(1_000),
        Some(suffix) if suffix == "mi" || suffix == "m" => dec!(1_000_000),
        Some(suffix) if suffix == "bi" || suffix == "b" => dec!(1_000_000_000),
        _ => Decimal::ONE,
    };

    Ok(value * multiplier)
}

/// Parses a whole count such as a holder total ("142.511" -> 142511).
pub fn parse_count_br(raw: &str) -> Result<i64> {
    let value = parse_decimal_br(raw)?;
    value
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| normalization_failed(raw, "count out of range"))
}

/// Parses a dd/mm/yyyy date.
pub fn parse_date_br(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .map_err(|e| normalization_failed(raw, &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_decimal() {
        assert_eq!(parse_decimal_br("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal_br("0,75").unwrap(), dec!(0.75));
        assert_eq!(parse_decimal_br("142").unwrap(), dec!(142));
    }

    #[test]
    fn strips_currency_and_percent() {
        assert_eq!(parse_decimal_br("R$ 10,50").unwrap(), dec!(10.50));
        assert_eq!(parse_decimal_br("12,3%").unwrap(), dec!(12.3));
        assert_eq!(parse_decimal_br("R$\u{a0}98,10").unwrap(), dec!(98.10));
    }

    #[test]
    fn applies_magnitude_suffixes() {
        assert_eq!(parse_decimal_br("1,2 M").unwrap(), dec!(1_200_000));
        assert_eq!(parse_decimal_br("850 mil").unwrap(), dec!(850_000));
        assert_eq!(parse_decimal_br("2,5 bi").unwrap(), dec!(2_500_000_000));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse_decimal_br("").is_err());
        assert!(parse_decimal_br("-").is_err());
        assert!(parse_decimal_br("N/A").is_err());
        assert!(parse_decimal_br("abc").is_err());
    }

    #[test]
    fn parses_counts() {
        assert_eq!(parse_count_br("142.511").unwrap(), 142_511);
    }

    #[test]
    fn parses_br_dates() {
        assert_eq!(
            parse_date_br("10/05/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );
        assert!(parse_date_br("2024-05-10").is_err());
    }
}
