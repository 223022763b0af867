//! ARINC-429 text grammars: the pipe-delimited bus configuration and the
//! `!`-delimited fido definition files it points at.

use once_cell::sync::Lazy;
use regex::Regex;

use super::binary::decode_binary_i64;
use super::parse_optional_real;
use crate::error::IngestError;

/// Fido lines with fewer fields than this carry no definition
pub const MIN_FIDO_FIELDS: usize = 18;

const LABEL: usize = 3;
const NAME: usize = 9;
const DESCRIPTION: usize = 10;
const TYPE: usize = 11;
const LENGTH: usize = 12;
const OFFSET: usize = 13;
const UNIT: usize = 14;
const MIN_MAX: usize = 15;
const SCALE: usize = 16;

/// ARINC word encodings and the parameter type each one is stored as
const ARINC_TYPES: &[(&str, &str)] = &[
    ("DIS", "discrete"),
    ("BIN", "binary"),
    ("BCD", "bcd"),
    ("TOR", "bool"),
    ("BNR", "binary"),
];

/// Leading bit pattern, whitespace, then the discrete's name
static DISCRETE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s+(.+)$").expect("discrete pattern is valid"));

/// One `|bus|...|fido file|` line of the bus configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BusEntry<'a> {
    pub bus: &'a str,
    pub fido_file: &'a str,
}

/// Parse a bus configuration line; anything not starting with `|` is skipped
pub fn parse_bus_line(line: &str) -> Option<BusEntry<'_>> {
    if !line.starts_with('|') {
        return None;
    }
    let parts: Vec<&str> = line.trim().split('|').map(str::trim).collect();
    match (parts.get(1).copied(), parts.get(3).copied()) {
        (Some(bus), Some(fido_file)) if !bus.is_empty() => Some(BusEntry { bus, fido_file }),
        _ => None,
    }
}

/// Positional fields of one fido line
#[derive(Debug, Clone, PartialEq)]
pub struct FidoLine<'a> {
    /// Line starts with `*` and names a parameter: a new label block
    pub opens_label: bool,
    pub label: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub type_token: &'a str,
    pub length: &'a str,
    pub offset: &'a str,
    pub unit: &'a str,
    pub min_max: &'a str,
    pub scale: &'a str,
}

/// What a fido line describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FidoRecord {
    Parameter,
    Discrete,
    Blank,
}

impl<'a> FidoLine<'a> {
    /// Split a line on `!`; comments and short lines yield `None`
    pub fn split(line: &'a str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().split('!').map(str::trim).collect();
        if parts.len() < MIN_FIDO_FIELDS || parts[0].starts_with('#') {
            return None;
        }

        Some(Self {
            opens_label: line.starts_with('*') && !parts[NAME].is_empty(),
            label: parts[LABEL],
            name: parts[NAME],
            description: parts[DESCRIPTION],
            type_token: parts[TYPE],
            length: parts[LENGTH],
            offset: parts[OFFSET],
            unit: parts[UNIT],
            min_max: parts[MIN_MAX],
            scale: parts[SCALE],
        })
    }

    pub fn record(&self) -> FidoRecord {
        if !self.name.is_empty() {
            FidoRecord::Parameter
        } else if !self.description.is_empty() {
            FidoRecord::Discrete
        } else {
            FidoRecord::Blank
        }
    }
}

/// Map an ARINC encoding token to its parameter type
pub fn arinc_type(token: &str) -> Result<&'static str, IngestError> {
    ARINC_TYPES
        .iter()
        .find(|(arinc, _)| *arinc == token)
        .map(|(_, db_type)| *db_type)
        .ok_or_else(|| IngestError::lookup("ARINC parameter type", token))
}

/// `S.U.` (sans unité) is stored as `unitless`
pub fn normalize_unit(token: &str) -> &str {
    if token == "S.U." {
        "unitless"
    } else {
        token
    }
}

/// Parse the `min max` domain; an empty string means no domain
pub fn parse_min_max(token: &str) -> Result<(Option<f64>, Option<f64>), IngestError> {
    let bounds: Vec<&str> = token.split_whitespace().collect();
    match bounds.as_slice() {
        [] => Ok((None, None)),
        [min, max] => Ok((
            parse_optional_real("minimum", min)?,
            parse_optional_real("maximum", max)?,
        )),
        _ => Err(IngestError::invalid("min-max domain", token)),
    }
}

/// Split a discrete description such as `101 OVERHEAT` into its value and name
pub fn parse_discrete(description: &str) -> Result<(i64, &str), IngestError> {
    let captures = DISCRETE_PATTERN
        .captures(description)
        .ok_or_else(|| IngestError::invalid("discrete description", description))?;
    let (Some(bits), Some(name)) = (captures.get(1), captures.get(2)) else {
        return Err(IngestError::invalid("discrete description", description));
    };
    let value = decode_binary_i64(bits.as_str())?;
    Ok((value, name.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fido(fields: &[(usize, &str)], marker: &str) -> String {
        let mut parts = vec![""; MIN_FIDO_FIELDS];
        parts[0] = marker;
        for (index, value) in fields {
            parts[*index] = *value;
        }
        parts.join("!")
    }

    #[test]
    fn test_parse_bus_line() {
        let entry = parse_bus_line("| BUS_A | 100 | bus_a.fido | x |").unwrap();
        assert_eq!(entry.bus, "BUS_A");
        assert_eq!(entry.fido_file, "bus_a.fido");

        assert!(parse_bus_line("# comment").is_none());
        assert!(parse_bus_line("BUS_A|1|f").is_none());
        assert!(parse_bus_line("|BUS_A|").is_none());
    }

    #[test]
    fn test_split_fido_line() {
        let line = fido(
            &[(LABEL, "123"), (NAME, "TEMP"), (TYPE, "DIS"), (LENGTH, "1"), (OFFSET, "11")],
            "*",
        );
        let parsed = FidoLine::split(&line).unwrap();
        assert!(parsed.opens_label);
        assert_eq!(parsed.label, "123");
        assert_eq!(parsed.record(), FidoRecord::Parameter);

        let discrete = fido(&[(DESCRIPTION, "101 OVERHEAT")], "");
        let parsed = FidoLine::split(&discrete).unwrap();
        assert!(!parsed.opens_label);
        assert_eq!(parsed.record(), FidoRecord::Discrete);
    }

    #[test]
    fn test_short_and_comment_lines_are_skipped() {
        assert!(FidoLine::split("*!1!2!3").is_none());
        assert!(FidoLine::split(&fido(&[(NAME, "X")], "#")).is_none());
    }

    #[test]
    fn test_label_requires_name() {
        let line = fido(&[(LABEL, "200")], "*");
        let parsed = FidoLine::split(&line).unwrap();
        assert!(!parsed.opens_label);
        assert_eq!(parsed.record(), FidoRecord::Blank);
    }

    #[test]
    fn test_arinc_type_table() {
        assert_eq!(arinc_type("DIS").unwrap(), "discrete");
        assert_eq!(arinc_type("BNR").unwrap(), "binary");
        assert_eq!(arinc_type("TOR").unwrap(), "bool");
        assert!(matches!(arinc_type("XYZ"), Err(IngestError::Lookup { .. })));
    }

    #[test]
    fn test_normalize_unit() {
        assert_eq!(normalize_unit("S.U."), "unitless");
        assert_eq!(normalize_unit("deg"), "deg");
    }

    #[test]
    fn test_parse_min_max() {
        assert_eq!(parse_min_max("-10 250.5").unwrap(), (Some(-10.0), Some(250.5)));
        assert_eq!(parse_min_max("").unwrap(), (None, None));
        assert!(parse_min_max("1").is_err());
        assert!(parse_min_max("a b").is_err());
    }

    #[test]
    fn test_parse_discrete() {
        assert_eq!(parse_discrete("101 OVERHEAT").unwrap(), (5, "OVERHEAT"));
        assert_eq!(parse_discrete("01  LOW OIL").unwrap(), (1, "LOW OIL"));
        assert!(matches!(
            parse_discrete("1x1 BAD"),
            Err(IngestError::InvalidBinary { .. })
        ));
        assert!(parse_discrete("OVERHEAT").is_err());
    }
}
