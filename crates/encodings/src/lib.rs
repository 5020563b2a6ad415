//! Encoding metadata for byte strings.
//!
//! This crate answers the handful of questions a rope needs to ask about an
//! encoding without knowing anything else about it:
//!
//! - how wide a character can be (`min_width`, `max_width`, `is_fixed_width`)
//! - whether ASCII bytes mean ASCII characters (`is_ascii_compatible`)
//! - how long the character starting at some byte is (`char_len_at`)
//! - where the nth character starts (`nth_char_offset`)
//! - which code point a character encodes (`code_point_at`)
//!
//! Encodings are static tables. An [`Encoding`] is a copyable handle to one,
//! so it can be stored in every rope node for free.
//!
//! # Example
//!
//! ```
//! use encodings::{CharLen, UTF_8};
//!
//! let bytes = "né".as_bytes();
//! assert_eq!(UTF_8.char_len_at(bytes, 0, bytes.len()), CharLen::Found(1));
//! assert_eq!(UTF_8.char_len_at(bytes, 1, bytes.len()), CharLen::Found(2));
//! assert_eq!(UTF_8.char_len_at(bytes, 1, 2), CharLen::NeedsMore(1));
//! ```

mod single_byte;
mod utf16;
mod utf32;
mod utf8;

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

pub use single_byte::Binary;
pub use single_byte::Latin1;
pub use single_byte::UsAscii;
pub use utf16::Utf16;
pub use utf32::Utf32;
pub use utf8::Utf8;

/// Result of asking for the length of the character at a byte position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharLen {
    /// A complete, valid character of this many bytes starts here.
    Found(usize),
    /// The bytes so far are a valid prefix, but this many more are needed.
    NeedsMore(usize),
    /// No valid character starts here.
    Invalid,
}

impl CharLen {
    /// Length of the character, if one was found.
    pub fn found(self) -> Option<usize> {
        return match self {
            CharLen::Found(len) => Some(len),
            _ => None,
        };
    }
}

/// The per-encoding primitives. Implementations are unit structs stored in
/// statics and wrapped in an [`Encoding`] handle.
pub trait Codec: Send + Sync {
    /// Canonical name, unique across all encodings.
    fn name(&self) -> &'static str;

    /// Fewest bytes any character occupies.
    fn min_width(&self) -> usize;

    /// Most bytes any character occupies.
    fn max_width(&self) -> usize;

    /// Whether every character occupies exactly `min_width` bytes.
    fn is_fixed_width(&self) -> bool {
        return self.min_width() == self.max_width();
    }

    /// Whether bytes below 0x80 always encode the matching ASCII character.
    fn is_ascii_compatible(&self) -> bool;

    /// Whether this is UTF-8, which enables byte-counting fast paths.
    fn is_utf8(&self) -> bool {
        return false;
    }

    /// Length of the character starting at `pos`, looking no further than `end`.
    fn char_len_at(&self, bytes: &[u8], pos: usize, end: usize) -> CharLen;

    /// Code point of the character starting at `pos`, or `None` if no
    /// complete valid character starts there.
    fn code_point_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<u32>;

    /// Byte offset of the `n`th character after `start`, clamped to `end`.
    ///
    /// Positions that do not start a valid character are stepped over
    /// `min_width` bytes at a time.
    fn nth_char_offset(&self, bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        let mut pos = start;
        let mut remaining = n;
        while remaining > 0 && pos < end {
            pos += match self.char_len_at(bytes, pos, end) {
                CharLen::Found(len) => len,
                _ => self.min_width().min(end - pos),
            };
            remaining -= 1;
        }
        return pos.min(end);
    }
}

/// A handle to a static encoding table.
///
/// Handles compare and hash by name.
#[derive(Clone, Copy)]
pub struct Encoding(&'static dyn Codec);

impl Encoding {
    /// Wrap a static codec.
    pub const fn new(codec: &'static dyn Codec) -> Encoding {
        return Encoding(codec);
    }

    pub fn name(&self) -> &'static str {
        return self.0.name();
    }

    pub fn min_width(&self) -> usize {
        return self.0.min_width();
    }

    pub fn max_width(&self) -> usize {
        return self.0.max_width();
    }

    pub fn is_fixed_width(&self) -> bool {
        return self.0.is_fixed_width();
    }

    /// Whether every character is exactly one byte.
    pub fn is_single_byte(&self) -> bool {
        return self.0.max_width() == 1;
    }

    pub fn is_ascii_compatible(&self) -> bool {
        return self.0.is_ascii_compatible();
    }

    pub fn is_utf8(&self) -> bool {
        return self.0.is_utf8();
    }

    pub fn char_len_at(&self, bytes: &[u8], pos: usize, end: usize) -> CharLen {
        debug_assert!(pos < end && end <= bytes.len());
        return self.0.char_len_at(bytes, pos, end);
    }

    pub fn nth_char_offset(&self, bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        debug_assert!(start <= end && end <= bytes.len());
        return self.0.nth_char_offset(bytes, start, end, n);
    }

    pub fn code_point_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<u32> {
        debug_assert!(pos < end && end <= bytes.len());
        return self.0.code_point_at(bytes, pos, end);
    }
}

impl PartialEq for Encoding {
    fn eq(&self, other: &Encoding) -> bool {
        return self.name() == other.name();
    }
}

impl Eq for Encoding {}

impl Hash for Encoding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "Encoding({})", self.name());
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.name());
    }
}

/// Raw bytes: every byte is a character, ASCII compatible.
pub static ASCII_8BIT: Encoding = Encoding::new(&Binary);
/// 7-bit ASCII; bytes at or above 0x80 are invalid.
pub static US_ASCII: Encoding = Encoding::new(&UsAscii);
pub static UTF_8: Encoding = Encoding::new(&Utf8);
pub static ISO_8859_1: Encoding = Encoding::new(&Latin1);
pub static UTF_16LE: Encoding = Encoding::new(&Utf16::LE);
pub static UTF_16BE: Encoding = Encoding::new(&Utf16::BE);
pub static UTF_32LE: Encoding = Encoding::new(&Utf32::LE);
pub static UTF_32BE: Encoding = Encoding::new(&Utf32::BE);

/// Every built-in encoding.
pub fn builtin() -> [Encoding; 8] {
    return [
        ASCII_8BIT, US_ASCII, UTF_8, ISO_8859_1, UTF_16LE, UTF_16BE, UTF_32LE, UTF_32BE,
    ];
}

/// Look up a built-in encoding by name, ignoring case. `BINARY` is accepted
/// as an alias for `ASCII-8BIT`.
pub fn find(name: &str) -> Option<Encoding> {
    if name.eq_ignore_ascii_case("BINARY") {
        return Some(ASCII_8BIT);
    }
    return builtin().into_iter().find(|enc| enc.name().eq_ignore_ascii_case(name));
}
