//! Hex offset parsing and formatting utilities.

use anyhow::Result;

/// Parse a hex offset string (with or without 0x prefix).
pub fn parse_hex_offset(s: &str) -> Result<usize> {
    let digits = s.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    usize::from_str_radix(digits, 16)
        .map_err(|e| anyhow::anyhow!("Invalid hex offset '{}': {}", s, e))
}

/// Format an offset as an 8-digit hex string with 0x prefix.
pub fn format_hex_offset(offset: usize) -> String {
    format!("0x{:08X}", offset)
}
