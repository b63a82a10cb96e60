//! Best-effort text decoding for raw remote output.
//!
//! Remote hosts emit bytes in whatever encoding they please, frequently
//! Shift-JIS on legacy network gear. Each chunk is tried against an ordered
//! list of encodings and the first clean decode wins. A chunk that no
//! configured encoding accepts decodes to the empty string — garbled output
//! must never take the session down.
//!
//! Chunks are decoded independently: a multi-byte character split across two
//! reads is not reassembled, so the boundary chunk may decode empty. That
//! matches the observed behavior of the tools this replaces.

use std::borrow::Cow;

/// One entry in the decoding priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    ShiftJis,
    Utf8,
    Ascii,
}

impl TextEncoding {
    /// Decode `bytes` strictly in this encoding, or `None` if any byte
    /// sequence is invalid for it.
    pub fn try_decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::ShiftJis => strict(encoding_rs::SHIFT_JIS, bytes),
            TextEncoding::Utf8 => strict(encoding_rs::UTF_8, bytes),
            TextEncoding::Ascii => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).ok().map(str::to_owned)
                } else {
                    None
                }
            }
        }
    }
}

fn strict(enc: &'static encoding_rs::Encoding, bytes: &[u8]) -> Option<String> {
    enc.decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

/// Default priority order. Shift-JIS first: most pure-ASCII and JIS text
/// decodes identically either way, and legacy gear that matters here is
/// Shift-JIS before it is UTF-8.
pub const DEFAULT_ENCODINGS: &[TextEncoding] =
    &[TextEncoding::ShiftJis, TextEncoding::Utf8, TextEncoding::Ascii];

/// Decode with an explicit priority list. Returns the first successful
/// decode, or an empty string when every encoding rejects the input.
pub fn decode_with(encodings: &[TextEncoding], bytes: &[u8]) -> String {
    for enc in encodings {
        if let Some(text) = enc.try_decode(bytes) {
            return text;
        }
    }
    String::new()
}

/// Decode with the default priority order.
pub fn decode(bytes: &[u8]) -> String {
    decode_with(DEFAULT_ENCODINGS, bytes)
}
