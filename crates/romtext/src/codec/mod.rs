//! Conversion between the game's native text bytes and editable text.
//!
//! Decoded text is plain Unicode with two conventions:
//!
//! - the in-band newline byte becomes `'\n'`
//! - any byte sequence the native encoding cannot represent becomes an escape
//!   token such as `<$FFFE$>`
//!
//! Both are reversed by [`TextCodec::encode`], so a decoded string written back
//! unchanged reproduces the original bytes exactly.

mod escape;
mod shift_jis;

pub use escape::{
    ESCAPE_TOKEN_RE, LENIENT_TOKEN_RE, TOKEN_CLOSE, TOKEN_OPEN, format_token, push_token,
    token_bytes,
};
pub use shift_jis::ShiftJisCodec;

/// Result of encoding one logical string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    /// Native bytes, terminator included
    pub bytes: Vec<u8>,
    /// Characters that were replaced because the encoding cannot represent them
    pub unmappable: Vec<char>,
}

impl Encoded {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether every character made it through without replacement
    pub fn is_lossless(&self) -> bool {
        self.unmappable.is_empty()
    }
}

/// A game text encoding
pub trait TextCodec {
    /// Decode a run of bytes that does not include the terminator.
    ///
    /// Returns `None` when the run cannot be treated as text at all.
    fn decode(&self, bytes: &[u8]) -> Option<String>;

    /// Encode logical text, appending the terminator
    fn encode(&self, text: &str) -> Encoded;

    /// Byte that ends every string
    fn terminator(&self) -> u8;
}
