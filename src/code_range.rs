//! Code range classification.
//!
//! A code range says how a byte sequence relates to its encoding: pure
//! 7-bit ASCII, valid, or broken. Ropes compute it on demand and cache it.

use std::fmt;

use encodings::CharLen;
use encodings::Encoding;

use crate::stats;

/// Classification of a byte sequence relative to its encoding.
///
/// Once a rope reports anything other than `Unknown` it reports the same
/// value forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodeRange {
    /// Not computed yet.
    Unknown = 0,
    /// Every byte is below 0x80 and the encoding is ASCII compatible.
    SevenBit = 1,
    /// Every character decodes.
    Valid = 2,
    /// Some position does not decode to a complete character.
    Broken = 3,
}

impl CodeRange {
    #[inline]
    pub(crate) fn from_u8(value: u8) -> CodeRange {
        return match value {
            1 => CodeRange::SevenBit,
            2 => CodeRange::Valid,
            3 => CodeRange::Broken,
            _ => CodeRange::Unknown,
        };
    }

    pub fn is_known(self) -> bool {
        return self != CodeRange::Unknown;
    }

    /// Conservative code range of two sequences placed side by side.
    ///
    /// Unknown if either side is unknown; otherwise equal ranges stay,
    /// `Broken` wins, and a 7-bit/valid mix is valid.
    pub fn join(self, other: CodeRange) -> CodeRange {
        return match (self, other) {
            (CodeRange::Unknown, _) | (_, CodeRange::Unknown) => CodeRange::Unknown,
            (a, b) if a == b => a,
            (CodeRange::Broken, _) | (_, CodeRange::Broken) => CodeRange::Broken,
            _ => CodeRange::Valid,
        };
    }
}

impl fmt::Display for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeRange::Unknown => "unknown",
            CodeRange::SevenBit => "7bit",
            CodeRange::Valid => "valid",
            CodeRange::Broken => "broken",
        };
        return f.write_str(name);
    }
}

/// Length of the first run of bytes below 0x80.
#[inline]
fn ascii_run(bytes: &[u8]) -> usize {
    return bytes.iter().position(|&byte| byte >= 0x80).unwrap_or(bytes.len());
}

/// Scan `bytes` and return its code range and character length.
///
/// A position that does not decode counts as one character spanning
/// `min_width` bytes (or whatever is left), which is how broken strings are
/// measured everywhere else.
pub fn classify(encoding: Encoding, bytes: &[u8]) -> (CodeRange, usize) {
    stats::code_range_scan();

    let ascii_compatible = encoding.is_ascii_compatible();
    if bytes.is_empty() {
        let empty = if ascii_compatible { CodeRange::SevenBit } else { CodeRange::Valid };
        return (empty, 0);
    }

    let end = bytes.len();
    let mut pos = 0;
    let mut chars = 0;
    if ascii_compatible {
        pos = ascii_run(bytes);
        if pos == end {
            return (CodeRange::SevenBit, end);
        }
        chars = pos;
    }

    let mut broken = false;
    while pos < end {
        if ascii_compatible && bytes[pos] < 0x80 {
            let run = ascii_run(&bytes[pos..]);
            pos += run;
            chars += run;
            continue;
        }
        pos += match encoding.char_len_at(bytes, pos, end) {
            CharLen::Found(len) => len,
            CharLen::NeedsMore(_) | CharLen::Invalid => {
                broken = true;
                encoding.min_width().min(end - pos)
            }
        };
        chars += 1;
    }

    let range = if broken { CodeRange::Broken } else { CodeRange::Valid };
    return (range, chars);
}
