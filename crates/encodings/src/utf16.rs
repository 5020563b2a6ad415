//! UTF-16 in either byte order.

use crate::CharLen;
use crate::Codec;

pub struct Utf16 {
    big_endian: bool,
}

impl Utf16 {
    pub const LE: Utf16 = Utf16 { big_endian: false };
    pub const BE: Utf16 = Utf16 { big_endian: true };

    #[inline]
    fn unit(&self, bytes: &[u8], pos: usize) -> u16 {
        let pair = [bytes[pos], bytes[pos + 1]];
        return if self.big_endian { u16::from_be_bytes(pair) } else { u16::from_le_bytes(pair) };
    }
}

impl Codec for Utf16 {
    fn name(&self) -> &'static str {
        return if self.big_endian { "UTF-16BE" } else { "UTF-16LE" };
    }

    fn min_width(&self) -> usize {
        return 2;
    }

    fn max_width(&self) -> usize {
        return 4;
    }

    fn is_ascii_compatible(&self) -> bool {
        return false;
    }

    fn char_len_at(&self, bytes: &[u8], pos: usize, end: usize) -> CharLen {
        let available = end - pos;
        if available < 2 {
            return CharLen::NeedsMore(2 - available);
        }
        let first = self.unit(bytes, pos);
        match first {
            0xD800..=0xDBFF => {
                if available < 4 {
                    return CharLen::NeedsMore(4 - available);
                }
                let second = self.unit(bytes, pos + 2);
                if (0xDC00..=0xDFFF).contains(&second) {
                    return CharLen::Found(4);
                }
                return CharLen::Invalid;
            }
            0xDC00..=0xDFFF => CharLen::Invalid,
            _ => CharLen::Found(2),
        }
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<u32> {
        let len = self.char_len_at(bytes, pos, end).found()?;
        let first = u32::from(self.unit(bytes, pos));
        return match len {
            2 => Some(first),
            _ => {
                let second = u32::from(self.unit(bytes, pos + 2));
                Some(0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00))
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str, big_endian: bool) -> Vec<u8> {
        return text
            .encode_utf16()
            .flat_map(|unit| if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() })
            .collect();
    }

    #[test]
    fn bmp_and_surrogate_pairs() {
        for (codec, big_endian) in [(Utf16::LE, false), (Utf16::BE, true)] {
            let bytes = encode("a𝄞", big_endian);
            assert_eq!(codec.char_len_at(&bytes, 0, bytes.len()), CharLen::Found(2));
            assert_eq!(codec.char_len_at(&bytes, 2, bytes.len()), CharLen::Found(4));
        }
    }

    #[test]
    fn decodes_pairs_into_one_code_point() {
        let bytes = encode("a𝄞", true);
        assert_eq!(Utf16::BE.code_point_at(&bytes, 0, bytes.len()), Some(0x61));
        assert_eq!(Utf16::BE.code_point_at(&bytes, 2, bytes.len()), Some(0x1D11E));
        assert_eq!(Utf16::BE.code_point_at(&bytes, 4, bytes.len()), None);
    }

    #[test]
    fn lone_surrogates_are_invalid() {
        let low_first = [0x00, 0xDC, 0x41, 0x00];
        assert_eq!(Utf16::LE.char_len_at(&low_first, 0, 4), CharLen::Invalid);
        let high_then_letter = [0x00, 0xD8, 0x41, 0x00];
        assert_eq!(Utf16::LE.char_len_at(&high_then_letter, 0, 4), CharLen::Invalid);
    }

    #[test]
    fn short_input_needs_more() {
        let bytes = encode("𝄞", false);
        assert_eq!(Utf16::LE.char_len_at(&bytes, 0, 1), CharLen::NeedsMore(1));
        assert_eq!(Utf16::LE.char_len_at(&bytes, 0, 3), CharLen::NeedsMore(1));
    }
}
