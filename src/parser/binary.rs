use crate::error::IngestError;

/// True if `s` is a non-empty run of `0`/`1` digits
pub fn is_binary_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b == b'0' || b == b'1')
}

/// Decode a binary literal such as `101` into its integer value
pub fn decode_binary(s: &str) -> Result<u64, IngestError> {
    if !is_binary_literal(s) {
        return Err(IngestError::InvalidBinary {
            value: s.to_string(),
        });
    }
    // Only overflow can fail past the alphabet check
    u64::from_str_radix(s, 2).map_err(|_| IngestError::invalid("binary value width", s))
}

/// Decode a binary literal into the signed integer SQLite stores
pub fn decode_binary_i64(s: &str) -> Result<i64, IngestError> {
    let value = decode_binary(s)?;
    i64::try_from(value).map_err(|_| IngestError::invalid("binary value width", s))
}

/// Render `value` as a binary literal zero-padded to `width` digits
pub fn encode_binary(value: u64, width: usize) -> String {
    format!("{:0width$b}", value, width = width)
}
