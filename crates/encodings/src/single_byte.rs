//! Encodings where every character is one byte.

use crate::CharLen;
use crate::Codec;

/// Raw bytes.
pub struct Binary;

impl Codec for Binary {
    fn name(&self) -> &'static str {
        return "ASCII-8BIT";
    }

    fn min_width(&self) -> usize {
        return 1;
    }

    fn max_width(&self) -> usize {
        return 1;
    }

    fn is_ascii_compatible(&self) -> bool {
        return true;
    }

    fn char_len_at(&self, _bytes: &[u8], _pos: usize, _end: usize) -> CharLen {
        return CharLen::Found(1);
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, _end: usize) -> Option<u32> {
        return Some(u32::from(bytes[pos]));
    }

    fn nth_char_offset(&self, _bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        return start.saturating_add(n).min(end);
    }
}

/// 7-bit ASCII.
pub struct UsAscii;

impl Codec for UsAscii {
    fn name(&self) -> &'static str {
        return "US-ASCII";
    }

    fn min_width(&self) -> usize {
        return 1;
    }

    fn max_width(&self) -> usize {
        return 1;
    }

    fn is_ascii_compatible(&self) -> bool {
        return true;
    }

    fn char_len_at(&self, bytes: &[u8], pos: usize, _end: usize) -> CharLen {
        if bytes[pos] < 0x80 {
            return CharLen::Found(1);
        }
        return CharLen::Invalid;
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, _end: usize) -> Option<u32> {
        return (bytes[pos] < 0x80).then(|| u32::from(bytes[pos]));
    }

    fn nth_char_offset(&self, _bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        return start.saturating_add(n).min(end);
    }
}

/// ISO-8859-1. Every byte value is a character.
pub struct Latin1;

impl Codec for Latin1 {
    fn name(&self) -> &'static str {
        return "ISO-8859-1";
    }

    fn min_width(&self) -> usize {
        return 1;
    }

    fn max_width(&self) -> usize {
        return 1;
    }

    fn is_ascii_compatible(&self) -> bool {
        return true;
    }

    fn char_len_at(&self, _bytes: &[u8], _pos: usize, _end: usize) -> CharLen {
        return CharLen::Found(1);
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, _end: usize) -> Option<u32> {
        return Some(u32::from(bytes[pos]));
    }

    fn nth_char_offset(&self, _bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        return start.saturating_add(n).min(end);
    }
}
