//! Shift_JIS text codec

use encoding_rs::SHIFT_JIS;
use regex::Regex;
use tracing::warn;

use super::escape::{ESCAPE_TOKEN_RE, LENIENT_TOKEN_RE, push_token, token_bytes};
use super::{Encoded, TextCodec};
use crate::config::TextConfig;

/// Line starts the dialogue file reserves for its block syntax
pub const RESERVED_LINE_PREFIXES: &[&[u8]] = &[b"<STRING ", b"[DUPLICATE OF"];

/// Shift_JIS with game-specific terminator and newline bytes
#[derive(Debug, Clone)]
pub struct ShiftJisCodec {
    terminator: u8,
    newline: u8,
    replacement: u8,
    /// Named tags and their raw bytes
    tags: Vec<(String, Vec<u8>)>,
    /// Tag names only, longest first; `None` without tags
    tag_re: Option<Regex>,
    /// Escape tokens followed by tag names
    token_re: Regex,
}

impl Default for ShiftJisCodec {
    fn default() -> Self {
        Self::new(&TextConfig::default())
    }
}

impl ShiftJisCodec {
    pub fn new(text: &TextConfig) -> Self {
        let mut tags = text.tag_bytes();
        tags.retain(|(name, _)| !name.is_empty());
        tags.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let names: Vec<String> = tags.iter().map(|(name, _)| regex::escape(name)).collect();
        let tag_re = (!names.is_empty())
            .then(|| Regex::new(&names.join("|")))
            .and_then(|re| re.map_err(|e| warn!("Ignoring text tags: {}", e)).ok());
        let token_re = match &tag_re {
            Some(tag_re) => Regex::new(&format!(
                "(?:{})|{}",
                LENIENT_TOKEN_RE.as_str(),
                tag_re.as_str()
            ))
            .unwrap_or_else(|_| LENIENT_TOKEN_RE.clone()),
            None => LENIENT_TOKEN_RE.clone(),
        };

        Self {
            terminator: text.terminator,
            newline: text.newline,
            replacement: text.replacement,
            tags: if tag_re.is_some() { tags } else { Vec::new() },
            tag_re,
            token_re,
        }
    }

    fn tag_value(&self, name: &str) -> Option<&[u8]> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Lead bytes of two-byte characters
    fn is_lead_byte(byte: u8) -> bool {
        matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
    }

    /// Decode a single character unit, accepting it only if it encodes back to
    /// the same bytes.
    fn decode_unit(unit: &[u8]) -> Option<String> {
        let text = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(unit)?;
        let (bytes, _, had_errors) = SHIFT_JIS.encode(&text);
        (!had_errors && bytes.as_ref() == unit).then(|| text.into_owned())
    }

    /// Decode bytes between two newline bytes
    fn decode_segment(&self, segment: &[u8], out: &mut String) {
        let mut pending: Vec<u8> = Vec::new();
        let mut pos = 0;

        // a line that reads like a block header or duplicate marker would be
        // taken for one when the dialogue file is parsed
        if RESERVED_LINE_PREFIXES
            .iter()
            .any(|prefix| segment.starts_with(prefix))
        {
            pending.push(segment[0]);
            pos = 1;
        }

        while pos < segment.len() {
            let width = if Self::is_lead_byte(segment[pos]) && pos + 1 < segment.len() {
                2
            } else {
                1
            };
            let unit = &segment[pos..pos + width];

            match Self::decode_unit(unit) {
                // a literal "<$" would read back as the start of a token
                Some(text) if text == "<" && segment.get(pos + 1) == Some(&b'$') => {
                    pending.push(b'<');
                }
                // 0x0A only reaches here when it is not the newline byte; a bare
                // carriage return would not survive line ending normalization
                Some(text) if text == "\n" || text == "\r" => pending.push(unit[0]),
                Some(text) => {
                    if !pending.is_empty() {
                        push_token(out, &pending);
                        pending.clear();
                    }
                    out.push_str(&text);
                }
                None => {
                    // an orphaned lead byte is escaped alone; its trail byte
                    // gets its own chance on the next iteration
                    pending.push(segment[pos]);
                    pos += 1;
                    continue;
                }
            }
            pos += width;
        }

        if !pending.is_empty() {
            push_token(out, &pending);
        }
    }

    /// Escape the first character of every literal tag name outside escape
    /// tokens, so the text does not turn into tag bytes when encoded
    fn escape_tag_literals(&self, decoded: String) -> String {
        let Some(tag_re) = &self.tag_re else {
            return decoded;
        };
        if !tag_re.is_match(&decoded) {
            return decoded;
        }

        let mut out = String::with_capacity(decoded.len() + 8);
        let mut last = 0;
        for token in ESCAPE_TOKEN_RE.find_iter(&decoded) {
            Self::escape_tags_in(tag_re, &decoded[last..token.start()], &mut out);
            out.push_str(token.as_str());
            last = token.end();
        }
        Self::escape_tags_in(tag_re, &decoded[last..], &mut out);
        out
    }

    fn escape_tags_in(tag_re: &Regex, mut plain: &str, out: &mut String) {
        while let Some(found) = tag_re.find(plain) {
            let Some(first) = plain[found.start()..].chars().next() else {
                break;
            };
            out.push_str(&plain[..found.start()]);
            let mut buf = [0u8; 4];
            let (bytes, _, _) = SHIFT_JIS.encode(first.encode_utf8(&mut buf));
            push_token(out, &bytes);
            // the rest of the name may still start another tag
            plain = &plain[found.start() + first.len_utf8()..];
        }
        out.push_str(plain);
    }

    fn encode_plain(&self, text: &str, bytes: &mut Vec<u8>, unmappable: &mut Vec<char>) {
        let mut buf = [0u8; 4];
        for c in text.chars() {
            if c == '\n' {
                bytes.push(self.newline);
                continue;
            }

            let encoded: Option<Vec<u8>> = if c.is_ascii() {
                Some(vec![c as u8])
            } else {
                let (encoded, _, had_errors) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
                (!had_errors).then(|| encoded.into_owned())
            };

            match encoded {
                Some(encoded)
                    if encoded != [self.terminator] && encoded != [self.newline] =>
                {
                    bytes.extend_from_slice(&encoded);
                }
                _ => {
                    bytes.push(self.replacement);
                    unmappable.push(c);
                }
            }
        }
    }
}

impl TextCodec for ShiftJisCodec {
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        if bytes.contains(&self.terminator) {
            return None;
        }

        let mut out = String::with_capacity(bytes.len() * 2);
        for (i, segment) in bytes.split(|&b| b == self.newline).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            self.decode_segment(segment, &mut out);
        }
        Some(self.escape_tag_literals(out))
    }

    fn encode(&self, text: &str) -> Encoded {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        let mut unmappable = Vec::new();
        let mut last = 0;

        for token in self.token_re.find_iter(text) {
            let raw = match self.tag_value(token.as_str()) {
                Some(tag) => tag.to_vec(),
                None => match token_bytes(token.as_str()) {
                    Some(raw) => raw,
                    None => continue,
                },
            };
            self.encode_plain(&text[last..token.start()], &mut bytes, &mut unmappable);
            bytes.extend_from_slice(&raw);
            last = token.end();
        }
        self.encode_plain(&text[last..], &mut bytes, &mut unmappable);

        bytes.push(self.terminator);
        Encoded { bytes, unmappable }
    }

    fn terminator(&self) -> u8 {
        self.terminator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ShiftJisCodec {
        ShiftJisCodec::default()
    }

    #[test]
    fn test_decode_japanese_with_newline() {
        // "こんにちは\nABC"
        let bytes = b"\x82\xb1\x82\xf1\x82\xc9\x82\xbf\x82\xcd\x0aABC";
        assert_eq!(codec().decode(bytes).unwrap(), "こんにちは\nABC");
    }

    #[test]
    fn test_unmappable_run_becomes_single_token() {
        let text = codec().decode(&[0xFF, 0xFE]).unwrap();
        assert_eq!(text, "<$FFFE$>");

        let encoded = codec().encode(&text);
        assert_eq!(encoded.bytes, vec![0xFF, 0xFE, 0x00]);
        assert!(encoded.is_lossless());
    }

    #[test]
    fn test_orphaned_lead_byte_is_escaped() {
        // 0x82 followed by a space cannot form a character
        let bytes = b"\x82 \x82\xa0";
        let text = codec().decode(bytes).unwrap();
        assert_eq!(text, "<$82$> あ");
        assert_eq!(codec().encode(&text).bytes, b"\x82 \x82\xa0\x00".to_vec());
    }

    #[test]
    fn test_trailing_lead_byte_is_escaped() {
        let text = codec().decode(b"AB\x82").unwrap();
        assert_eq!(text, "AB<$82$>");
    }

    #[test]
    fn test_literal_token_syntax_survives() {
        let bytes = b"<$41$>";
        let text = codec().decode(bytes).unwrap();
        assert_eq!(text, "<$3C$>$41$>");
        assert_eq!(codec().encode(&text).bytes, b"<$41$>\x00".to_vec());
    }

    #[test]
    fn test_custom_newline_escapes_line_feed() {
        let codec = ShiftJisCodec::new(&TextConfig {
            terminator: 0xFF,
            newline: 0x01,
            replacement: b'?',
            ..Default::default()
        });
        let bytes = [b'A', 0x01, b'B', 0x0A, b'C'];
        let text = codec.decode(&bytes).unwrap();
        assert_eq!(text, "A\nB<$0A$>C");

        let encoded = codec.encode(&text);
        let mut expected = bytes.to_vec();
        expected.push(0xFF);
        assert_eq!(encoded.bytes, expected);
    }

    #[test]
    fn test_decode_rejects_embedded_terminator() {
        assert_eq!(codec().decode(b"AB\x00CD"), None);
    }

    #[test]
    fn test_encode_replaces_unsupported_characters() {
        let encoded = codec().encode("A😀B");
        assert_eq!(encoded.bytes, b"A?B\x00".to_vec());
        assert_eq!(encoded.unmappable, vec!['😀']);
        assert!(!encoded.is_lossless());
    }

    #[test]
    fn test_encode_refuses_terminator_character() {
        let encoded = codec().encode("A\u{0}B");
        assert_eq!(encoded.bytes, b"A?B\x00".to_vec());
        assert_eq!(encoded.unmappable, vec!['\u{0}']);
    }

    #[test]
    fn test_encode_lenient_token() {
        let encoded = codec().encode("<$ 01 02 $>あ");
        assert_eq!(encoded.bytes, vec![0x01, 0x02, 0x82, 0xA0, 0x00]);
    }

    fn tagged_codec() -> ShiftJisCodec {
        let mut text = TextConfig::default();
        text.tags.insert("[PLAYER_NAME]".to_string(), "0201".to_string());
        text.tags.insert("[NAME]".to_string(), "05".to_string());
        text.tags.insert("[WAIT]".to_string(), "03 10".to_string());
        ShiftJisCodec::new(&text)
    }

    #[test]
    fn test_encode_named_tags() {
        let encoded = tagged_codec().encode("[PLAYER_NAME]さん[WAIT]");
        assert_eq!(
            encoded.bytes,
            vec![0x02, 0x01, 0x82, 0xB3, 0x82, 0xF1, 0x03, 0x10, 0x00]
        );
        assert!(encoded.is_lossless());
    }

    #[test]
    fn test_unknown_tag_is_plain_text() {
        let encoded = tagged_codec().encode("[ENEMY]<$01$>");
        assert_eq!(encoded.bytes, b"[ENEMY]\x01\x00".to_vec());
        // no tags configured: the name is just text
        assert_eq!(codec().encode("[WAIT]").bytes, b"[WAIT]\x00".to_vec());
    }

    #[test]
    fn test_literal_tag_name_survives_decode() {
        let codec = tagged_codec();
        let bytes = b"Hi [PLAYER_NAME] and [NAME]";
        let text = codec.decode(bytes).unwrap();
        assert_eq!(text, "Hi <$5B$>PLAYER_NAME] and <$5B$>NAME]");

        let mut expected = bytes.to_vec();
        expected.push(0x00);
        assert_eq!(codec.encode(&text).bytes, expected);
    }

    #[test]
    fn test_reserved_line_starts_are_escaped() {
        let bytes = b"<STRING 0007>\x0a[DUPLICATE OF <STRING 0000>]\x0a x <STRING 1>";
        let text = codec().decode(bytes).unwrap();
        assert_eq!(
            text,
            "<$3C$>STRING 0007>\n<$5B$>DUPLICATE OF <STRING 0000>]\n x <STRING 1>"
        );

        let mut expected = bytes.to_vec();
        expected.push(0x00);
        assert_eq!(codec().encode(&text).bytes, expected);
    }

    #[test]
    fn test_round_trip_law() {
        let runs: Vec<Vec<u8>> = vec![
            b"Hello, world!".to_vec(),
            b"\x82\xb1\x82\xea\x82\xcd\x83\x65\x83\x58\x83\x67\x0a\x82\xc5\x82\xb7".to_vec(),
            vec![0xB1, 0xB2, 0xB3],
            vec![0x80, 0xA0, 0xFD, 0x41],
            vec![0x82, 0x0A, 0x82, 0xA0],
            vec![0x3C, 0x24, 0x3C, 0x24, 0x46, 0x46, 0x24, 0x3E],
            vec![0x0A, 0x0A, 0x41, 0x0A],
            vec![0x41, 0x0D, 0x0A, 0x42],
            vec![0xED, 0x40, 0xFA, 0x5C],
            Vec::new(),
        ];

        for run in runs {
            let text = codec().decode(&run).unwrap();
            let mut expected = run.clone();
            expected.push(0x00);
            assert_eq!(codec().encode(&text).bytes, expected, "run {:02X?}", run);
        }
    }
}
