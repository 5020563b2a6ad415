//! UTF-8, validated the strict way: no overlong forms, no surrogates,
//! nothing above U+10FFFF.

use crate::CharLen;
use crate::Codec;

pub struct Utf8;

/// Total length of a sequence introduced by `lead`, or 0 if `lead` cannot
/// start one.
#[inline]
fn sequence_len(lead: u8) -> usize {
    return match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    };
}

/// Accepted range for the byte right after `lead`.
#[inline]
fn second_byte_range(lead: u8) -> (u8, u8) {
    return match lead {
        0xE0 => (0xA0, 0xBF),
        0xED => (0x80, 0x9F),
        0xF0 => (0x90, 0xBF),
        0xF4 => (0x80, 0x8F),
        _ => (0x80, 0xBF),
    };
}

#[inline]
fn is_continuation(byte: u8) -> bool {
    return byte & 0xC0 == 0x80;
}

impl Codec for Utf8 {
    fn name(&self) -> &'static str {
        return "UTF-8";
    }

    fn min_width(&self) -> usize {
        return 1;
    }

    fn max_width(&self) -> usize {
        return 4;
    }

    fn is_ascii_compatible(&self) -> bool {
        return true;
    }

    fn is_utf8(&self) -> bool {
        return true;
    }

    fn char_len_at(&self, bytes: &[u8], pos: usize, end: usize) -> CharLen {
        let lead = bytes[pos];
        let len = sequence_len(lead);
        if len == 0 {
            return CharLen::Invalid;
        }
        if len == 1 {
            return CharLen::Found(1);
        }

        let (low, high) = second_byte_range(lead);
        for i in 1..len {
            let at = pos + i;
            if at >= end {
                return CharLen::NeedsMore(len - i);
            }
            let byte = bytes[at];
            let ok = if i == 1 { low <= byte && byte <= high } else { is_continuation(byte) };
            if !ok {
                return CharLen::Invalid;
            }
        }
        return CharLen::Found(len);
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<u32> {
        let len = self.char_len_at(bytes, pos, end).found()?;
        let lead = u32::from(bytes[pos]);
        let mut point = match len {
            1 => return Some(lead),
            2 => lead & 0x1F,
            3 => lead & 0x0F,
            _ => lead & 0x07,
        };
        for &byte in &bytes[pos + 1..pos + len] {
            point = (point << 6) | u32::from(byte & 0x3F);
        }
        return Some(point);
    }

    /// Valid input only needs lead bytes counted.
    fn nth_char_offset(&self, bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        if n == 0 {
            return start;
        }
        let mut seen = 0;
        for (i, &byte) in bytes[start..end].iter().enumerate() {
            if !is_continuation(byte) {
                if seen == n {
                    return start + i;
                }
                seen += 1;
            }
        }
        return end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len_at(bytes: &[u8], pos: usize) -> CharLen {
        return Utf8.char_len_at(bytes, pos, bytes.len());
    }

    #[test]
    fn accepts_every_width() {
        for text in ["a", "é", "€", "𝄞"] {
            assert_eq!(len_at(text.as_bytes(), 0), CharLen::Found(text.len()), "{text}");
        }
    }

    #[test]
    fn rejects_overlong_and_surrogates() {
        assert_eq!(len_at(&[0xC0, 0xAF], 0), CharLen::Invalid);
        assert_eq!(len_at(&[0xE0, 0x80, 0xAF], 0), CharLen::Invalid);
        assert_eq!(len_at(&[0xED, 0xA0, 0x80], 0), CharLen::Invalid);
        assert_eq!(len_at(&[0xF4, 0x90, 0x80, 0x80], 0), CharLen::Invalid);
        assert_eq!(len_at(&[0x80], 0), CharLen::Invalid);
    }

    #[test]
    fn truncated_sequence_needs_more() {
        let euro = "€".as_bytes();
        assert_eq!(Utf8.char_len_at(euro, 0, 1), CharLen::NeedsMore(2));
        assert_eq!(Utf8.char_len_at(euro, 0, 2), CharLen::NeedsMore(1));
    }

    #[test]
    fn decodes_code_points() {
        for ch in ['a', 'é', '€', '𝄞'] {
            let mut buf = [0; 4];
            let bytes = ch.encode_utf8(&mut buf).as_bytes();
            assert_eq!(Utf8.code_point_at(bytes, 0, bytes.len()), Some(ch as u32));
        }
        assert_eq!(Utf8.code_point_at(&[0xE2, 0x82], 0, 2), None);
        assert_eq!(Utf8.code_point_at(&[0xC0, 0xAF], 0, 2), None);
    }

    #[test]
    fn nth_char_offset_counts_lead_bytes() {
        let text = "aé€𝄞b".as_bytes();
        let end = text.len();
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 0), 0);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 1), 1);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 2), 3);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 3), 6);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 4), 10);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 5), 11);
        assert_eq!(Utf8.nth_char_offset(text, 0, end, 6), 11);
    }
}
