//! Numeric values as the MP71077x accepts and reports them.
//!
//! The load keeps at most five significant digits, so every value written to
//! it goes through [`round_to_valid_digits`] first. The same rounded value is
//! what a verifying re-query must return.

use crate::{Error, Result, ScpiDeserialize, ScpiSerialize, read_all};

/// Most significant decimal digits the device keeps.
pub const VALID_DIGITS: usize = 5;

/// Rounds `x` to the number of fractional digits that fit in
/// [`VALID_DIGITS`] for its magnitude.
///
/// Rounds the exact binary value, ties to even, so `1.03125` becomes
/// `1.0312` and `100.125` becomes `100.12`.
pub fn round_to_valid_digits(x: f64) -> f64 {
    let decimals = if x < 10.0 {
        4
    } else if x < 100.0 {
        3
    } else {
        2
    };
    format!("{x:.decimals$}").parse().unwrap_or(x)
}

/// Number of digits in the shortest textual form of `x`.
pub fn digit_count(x: f64) -> usize {
    format_value(x).chars().filter(char::is_ascii_digit).count()
}

/// Shortest round-trip text for `x`, always carrying a decimal point.
fn format_value(x: f64) -> String {
    let mut out = format!("{x}");
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

/// Pulls the number out of a reply such as `12.500V` or `12.500 V`.
///
/// Everything except ASCII digits and `.` is discarded before parsing, so
/// unit suffixes and prefixes do not matter.
pub fn extract_number(reply: &str) -> Result<f64> {
    let digits: String = reply
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() {
        return Err(Error::ResponseDecoding(format!(
            "No numeric value in `{}`",
            reply.trim_end()
        )));
    }

    digits
        .parse()
        .map_err(|_| Error::ResponseDecoding(format!("Number parsing failed: {digits}")))
}

/// A value already rounded to the device's precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading(f64);

impl Reading {
    pub fn rounded(value: f64) -> Reading {
        Reading(round_to_valid_digits(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<Reading> for f64 {
    fn from(value: Reading) -> Self {
        value.0
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::rounded(value)
    }
}

impl ScpiSerialize for Reading {
    fn serialize(&self, out: &mut String) {
        out.push_str(&format_value(self.0));
    }
}

/// A queried value, taken verbatim from the reply without re-rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericResponse(pub f64);

impl ScpiDeserialize for NumericResponse {
    fn deserialize(input: &mut &str) -> Result<Self> {
        extract_number(read_all(input)).map(NumericResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_by_magnitude() {
        assert_eq!(round_to_valid_digits(4.123456), 4.1235);
        assert_eq!(round_to_valid_digits(12.34567), 12.346);
        assert_eq!(round_to_valid_digits(123.456), 123.46);
        assert_eq!(round_to_valid_digits(40.0), 40.0);
        assert_eq!(round_to_valid_digits(9.99994), 9.9999);
        assert_eq!(round_to_valid_digits(7500.0), 7500.0);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(round_to_valid_digits(1.03125), 1.0312);
        assert_eq!(round_to_valid_digits(12.3455), 12.345);
        assert_eq!(round_to_valid_digits(100.125), 100.12);
        assert_eq!(round_to_valid_digits(2.71875), 2.7188);
    }

    #[test]
    fn test_rounding_bucket_boundaries() {
        assert_eq!(round_to_valid_digits(9.99996), 10.0);
        assert_eq!(round_to_valid_digits(10.0), 10.0);
        assert_eq!(round_to_valid_digits(10.00049), 10.0);
        assert_eq!(round_to_valid_digits(99.99949), 99.999);
        assert_eq!(round_to_valid_digits(99.9996), 100.0);
        assert_eq!(round_to_valid_digits(100.0), 100.0);
        assert_eq!(round_to_valid_digits(100.004), 100.0);
    }

    #[test]
    fn test_rounding_fraction_width() {
        for (x, max) in [(0.123456789, 4), (56.789123, 3), (999.98765, 2)] {
            let text = format_value(round_to_valid_digits(x));
            let fraction = text.split('.').nth(1).unwrap();
            assert!(fraction.len() <= max, "{x} -> {text}");
        }
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(40.0), 3);
        assert_eq!(digit_count(12.34567), 7);
        assert_eq!(digit_count(1.5), 2);
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("12.500V").unwrap(), 12.5);
        assert_eq!(extract_number("12.500 V").unwrap(), 12.5);
        assert_eq!(extract_number("12.500").unwrap(), 12.5);
        assert_eq!(extract_number("7500.00OHM\n").unwrap(), 7500.0);
    }

    #[test]
    fn test_extract_number_rejects_non_numeric() {
        assert!(matches!(
            extract_number("OFF\n"),
            Err(Error::ResponseDecoding(_))
        ));
        assert!(matches!(extract_number(""), Err(Error::ResponseDecoding(_))));
        assert!(matches!(
            extract_number("1.2.3"),
            Err(Error::ResponseDecoding(_))
        ));
    }

    #[test]
    fn test_serialize() {
        let mut out = String::new();
        Reading::rounded(40.0).serialize(&mut out);
        assert_eq!(out, "40.0");

        let mut out = String::new();
        Reading::rounded(12.34567).serialize(&mut out);
        assert_eq!(out, "12.346");
    }

    #[test]
    fn test_deserialize_consumes_reply() {
        let input = &mut "150.00V\n";
        assert_eq!(NumericResponse::deserialize(input).unwrap().0, 150.0);
        assert!(input.is_empty());
    }
}
