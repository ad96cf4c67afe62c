//! Character statistics used by the classifier rules

use std::collections::HashSet;

use crate::codec::ESCAPE_TOKEN_RE;
use crate::config::ClassifierConfig;

/// Number of leading characters inspected by the prefix rules
pub const PREFIX_SAMPLE_CHARS: usize = 6;

/// Hiragana, katakana and CJK ideographs
pub fn is_native(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}')
}

/// ASCII printable, CJK punctuation, kana, ideographs and the three whitespace controls
pub fn is_printable(c: char) -> bool {
    matches!(
        c,
        '\u{20}'..='\u{7E}' | '\u{3000}'..='\u{303F}' | '\n' | '\r' | '\t'
    ) || is_native(c)
}

/// Control characters other than the three whitespace controls
pub fn is_control(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\n' | '\r' | '\t')
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStats {
    /// Length in characters
    pub len: usize,
    /// Length after trimming surrounding whitespace
    pub trimmed_len: usize,
    pub escape_tokens: usize,
    /// Characters covered by escape tokens
    pub escape_chars: usize,
    pub printable: usize,
    pub native: usize,
    pub latin_digits: usize,
    pub control: usize,
    pub distinct: usize,
    /// Smallest repeating block size up to the configured maximum
    pub repeat_block: Option<usize>,
    pub first_char_native: bool,
    /// First character is native script and the second a Latin letter or digit
    pub native_then_latin: bool,
    /// Letters or digits at the start of the prefix sample
    pub leading_alnum: usize,
    pub prefix_len: usize,
}

impl TextStats {
    pub fn compute(text: &str, config: &ClassifierConfig) -> Self {
        let chars: Vec<char> = text.chars().collect();

        let mut stats = Self {
            len: chars.len(),
            trimmed_len: text.trim().chars().count(),
            ..Default::default()
        };

        for token in ESCAPE_TOKEN_RE.find_iter(text) {
            stats.escape_tokens += 1;
            stats.escape_chars += token.as_str().chars().count();
        }

        let mut distinct = HashSet::new();
        for &c in &chars {
            if is_printable(c) {
                stats.printable += 1;
            }
            if is_native(c) {
                stats.native += 1;
            }
            if c.is_ascii_alphanumeric() {
                stats.latin_digits += 1;
            }
            if is_control(c) {
                stats.control += 1;
            }
            distinct.insert(c);
        }
        stats.distinct = distinct.len();
        stats.repeat_block = repeat_block(&chars, config.max_pattern_block);

        let prefix = &chars[..chars.len().min(PREFIX_SAMPLE_CHARS)];
        stats.prefix_len = prefix.len();
        stats.first_char_native = prefix.first().is_some_and(|&c| is_native(c));
        stats.native_then_latin = match prefix {
            [first, second, ..] => is_native(*first) && second.is_ascii_alphanumeric(),
            _ => false,
        };
        stats.leading_alnum = prefix
            .iter()
            .take_while(|c| c.is_ascii_alphanumeric())
            .count();

        stats
    }

    pub fn escape_frac(&self) -> f64 {
        self.escape_chars as f64 / self.len.max(1) as f64
    }

    pub fn printable_frac(&self) -> f64 {
        self.printable as f64 / self.len.max(1) as f64
    }

    pub fn control_frac(&self) -> f64 {
        self.control as f64 / self.len.max(1) as f64
    }

    /// The whole string is one character repeated
    pub fn is_single_char(&self) -> bool {
        self.distinct == 1
    }
}

/// Smallest block of at most `max_block` characters that tiles `chars` at least twice
fn repeat_block(chars: &[char], max_block: usize) -> Option<usize> {
    (1..=max_block).find(|&size| {
        chars.len() > size
            && chars.len() % size == 0
            && chars.chunks(size).all(|chunk| chunk == &chars[..size])
    })
}
