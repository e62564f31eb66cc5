//! Parses hex-pattern strings (e.g. CLI `--attach`-adjacent scan input, or a
//! GUI's pattern box) into a raw needle for [`crate::pattern::search_offsets`]
//! / [`crate::scanner::Scan::find_bytes`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexParseError {
    #[error("hex pattern length must be even")]
    OddLength,
    #[error("invalid hex byte '{0}'")]
    InvalidByte(String),
}

/// Parses a string like "DEADBEEF" or "DE AD BE EF" into bytes.
/// Whitespace is stripped first; case is irrelevant.
pub fn parse_hex_pattern(s: &str) -> Result<Vec<u8>, HexParseError> {
    let filtered: String = s.chars().filter(|c| !c.is_whitespace()).collect();

    if filtered.len() % 2 != 0 {
        return Err(HexParseError::OddLength);
    }

    let mut bytes = Vec::with_capacity(filtered.len() / 2);
    for i in (0..filtered.len()).step_by(2) {
        let byte_str = &filtered[i..i + 2];
        let b = u8::from_str_radix(byte_str, 16)
            .map_err(|_| HexParseError::InvalidByte(byte_str.to_string()))?;
        bytes.push(b);
    }
    Ok(bytes)
}
