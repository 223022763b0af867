//! Parsers for the three input grammars.
//!
//! Nothing here touches the store; ingestors turn parsed values into rows.

pub mod binary;
pub mod fido;
pub mod xml;

use crate::error::IngestError;

pub use binary::{decode_binary, decode_binary_i64, encode_binary, is_binary_literal};
pub use xml::{parse_document, Element};

pub fn parse_integer(what: &'static str, token: &str) -> Result<i64, IngestError> {
    token
        .trim()
        .parse()
        .map_err(|_| IngestError::invalid(what, token))
}

/// Parse a real number; an empty token means "not given"
pub fn parse_optional_real(what: &'static str, token: &str) -> Result<Option<f64>, IngestError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    token
        .parse()
        .map(Some)
        .map_err(|_| IngestError::invalid(what, token))
}

/// Parse a hexadecimal integer with an optional `0x` prefix
pub fn parse_hex(what: &'static str, token: &str) -> Result<i64, IngestError> {
    let trimmed = token.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    i64::from_str_radix(digits, 16).map_err(|_| IngestError::invalid(what, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("size", " 32 ").unwrap(), 32);
        assert!(matches!(
            parse_integer("size", "4.5"),
            Err(IngestError::InvalidValue { what: "size", .. })
        ));
    }

    #[test]
    fn test_parse_optional_real() {
        assert_eq!(parse_optional_real("min", "").unwrap(), None);
        assert_eq!(parse_optional_real("min", "-1.5").unwrap(), Some(-1.5));
        assert!(parse_optional_real("min", "low").is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("monitor point", "1F").unwrap(), 31);
        assert_eq!(parse_hex("monitor point", "0x10").unwrap(), 16);
        assert!(parse_hex("monitor point", "zz").is_err());
    }
}
