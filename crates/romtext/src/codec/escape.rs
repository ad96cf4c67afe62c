//! `<$HEX$>` escape tokens for bytes the native encoding cannot represent

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening delimiter of an escape token
pub const TOKEN_OPEN: &str = "<$";
/// Closing delimiter of an escape token
pub const TOKEN_CLOSE: &str = "$>";

/// Tokens as the decoder writes them
pub static ESCAPE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\$(?:[0-9A-Fa-f]{2})+\$>").expect("valid escape token regex"));

/// Tokens as a translator may type them (spaces between byte pairs allowed)
pub static LENIENT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\$\s*(?:[0-9A-Fa-f]{2}\s*)+\$>").expect("valid lenient token regex")
});

/// Append the token for `bytes` to `out`
pub fn push_token(out: &mut String, bytes: &[u8]) {
    out.push_str(TOKEN_OPEN);
    for byte in bytes {
        let _ = write!(out, "{:02X}", byte);
    }
    out.push_str(TOKEN_CLOSE);
}

/// Format `bytes` as a standalone token
pub fn format_token(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 4);
    push_token(&mut out, bytes);
    out
}

/// Raw bytes carried by a token matched by [`LENIENT_TOKEN_RE`]
pub fn token_bytes(token: &str) -> Option<Vec<u8>> {
    let inner = token.strip_prefix(TOKEN_OPEN)?.strip_suffix(TOKEN_CLOSE)?;
    let digits: Vec<u8> = inner
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }

    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_token() {
        assert_eq!(format_token(&[0xFF, 0xFE]), "<$FFFE$>");
        assert_eq!(format_token(&[0x0A]), "<$0A$>");
    }

    #[test]
    fn test_token_bytes() {
        assert_eq!(token_bytes("<$FFFE$>"), Some(vec![0xFF, 0xFE]));
        assert_eq!(token_bytes("<$ ff fe $>"), Some(vec![0xFF, 0xFE]));
        assert_eq!(token_bytes("<$FFF$>"), None);
        assert_eq!(token_bytes("<$$>"), None);
        assert_eq!(token_bytes("FFFE"), None);
    }

    #[test]
    fn test_regexes() {
        assert!(ESCAPE_TOKEN_RE.is_match("abc<$01FF$>def"));
        assert!(!ESCAPE_TOKEN_RE.is_match("<$1$>"));
        assert!(!ESCAPE_TOKEN_RE.is_match("<$ 01 $>"));
        assert!(LENIENT_TOKEN_RE.is_match("<$ 01 02 $>"));
        assert!(!LENIENT_TOKEN_RE.is_match("<$012$>"));
    }
}
