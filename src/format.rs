//! Text conversions shared by the form, exports and the order document.

use crate::error::{ValidationError, ValidationIssue};
use chrono::NaiveDate;

/// Day/month/year, the format used on screen and in every export.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Format a date as dd/mm/yyyy.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date typed as dd/mm/yyyy or yyyy-mm-dd.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| {
            ValidationError::single(ValidationIssue::InvalidDate {
                input: input.to_string(),
            })
        })
}

/// Render a quantity without a trailing `.0` for whole numbers.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.is_finite() && quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{:.0}", quantity)
    } else {
        format!("{}", quantity)
    }
}

/// Parse a quantity typed by the user. Accepts a decimal comma.
///
/// Only the text-to-number step happens here; positivity is checked where
/// the whole submission is validated.
pub fn parse_quantity(input: &str) -> Result<f64, ValidationError> {
    let normalized = input.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::single(ValidationIssue::InvalidQuantity {
            input: input.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_roundtrip_formats() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(format_date(date), "09/01/2026");
        assert_eq!(parse_date("09/01/2026").unwrap(), date);
        assert_eq!(parse_date(" 2026-01-09 ").unwrap(), date);
        assert!(parse_date("9 Jan").is_err());
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(5.0), "5");
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(0.125), "0.125");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3.0);
        assert_eq!(parse_quantity(" 1,5 ").unwrap(), 1.5);
        let err = parse_quantity("abc").unwrap_err();
        assert!(matches!(
            err.issues[0],
            ValidationIssue::InvalidQuantity { .. }
        ));
        assert!(parse_quantity("inf").is_err());
    }
}
