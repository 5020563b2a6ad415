//! UTF-32 in either byte order.

use crate::CharLen;
use crate::Codec;

pub struct Utf32 {
    big_endian: bool,
}

impl Utf32 {
    pub const LE: Utf32 = Utf32 { big_endian: false };
    pub const BE: Utf32 = Utf32 { big_endian: true };
}

impl Codec for Utf32 {
    fn name(&self) -> &'static str {
        return if self.big_endian { "UTF-32BE" } else { "UTF-32LE" };
    }

    fn min_width(&self) -> usize {
        return 4;
    }

    fn max_width(&self) -> usize {
        return 4;
    }

    fn is_ascii_compatible(&self) -> bool {
        return false;
    }

    fn char_len_at(&self, bytes: &[u8], pos: usize, end: usize) -> CharLen {
        let available = end - pos;
        if available < 4 {
            return CharLen::NeedsMore(4 - available);
        }
        if self.code_point_at(bytes, pos, end).is_some() {
            return CharLen::Found(4);
        }
        return CharLen::Invalid;
    }

    fn code_point_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<u32> {
        let quad: [u8; 4] = bytes.get(pos..pos + 4).filter(|_| pos + 4 <= end)?.try_into().ok()?;
        let value = if self.big_endian { u32::from_be_bytes(quad) } else { u32::from_le_bytes(quad) };
        return char::from_u32(value).map(u32::from);
    }

    fn nth_char_offset(&self, _bytes: &[u8], start: usize, end: usize, n: usize) -> usize {
        return start.saturating_add(n.saturating_mul(4)).min(end);
    }
}
