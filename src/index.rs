//! Byte index ↔ character index translation.

use encodings::CharLen;
use encodings::Encoding;

use crate::code_range::CodeRange;
use crate::node::Rope;

/// How character offsets map onto byte offsets for one rope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexStrategy {
    /// One byte per character.
    SingleByte,
    /// Every character is this many bytes wide.
    FixedWidth(usize),
    /// Valid text in a variable-width encoding.
    VariableWidth,
    /// Broken text: a position that does not start a complete character
    /// counts as one character of `min_width` bytes, or whatever is left.
    Lenient,
}

impl IndexStrategy {
    pub fn of(rope: &Rope) -> IndexStrategy {
        if rope.is_single_byte_optimizable() {
            return IndexStrategy::SingleByte;
        }
        let encoding = rope.encoding();
        return match rope.code_range() {
            CodeRange::Broken => IndexStrategy::Lenient,
            _ if encoding.is_fixed_width() => IndexStrategy::FixedWidth(encoding.min_width()),
            _ => IndexStrategy::VariableWidth,
        };
    }
}

/// Length of the character at `pos`. Where none starts, the same step
/// [`classify`](crate::code_range::classify) takes, so walks and `char_len`
/// count the same characters.
#[inline]
fn lenient_step(encoding: Encoding, bytes: &[u8], pos: usize) -> usize {
    return match encoding.char_len_at(bytes, pos, bytes.len()) {
        CharLen::Found(len) => len,
        CharLen::NeedsMore(_) | CharLen::Invalid => encoding.min_width().min(bytes.len() - pos),
    };
}

/// Number of characters starting before `end`.
fn count_chars_before(encoding: Encoding, bytes: &[u8], end: usize) -> usize {
    let mut pos = 0;
    let mut chars = 0;
    while pos < end {
        pos += lenient_step(encoding, bytes, pos);
        chars += 1;
    }
    return chars;
}

impl Rope {
    pub fn index_strategy(&self) -> IndexStrategy {
        return IndexStrategy::of(self);
    }

    /// Byte offset at which character `char_index` starts.
    ///
    /// `char_len()` maps to `byte_len()`; anything past it is `None`.
    pub fn byte_index_of(&self, char_index: usize) -> Option<usize> {
        let char_len = self.char_len();
        if char_index > char_len {
            return None;
        }
        if char_index == char_len {
            return Some(self.byte_len());
        }
        return match self.index_strategy() {
            IndexStrategy::SingleByte => Some(char_index),
            IndexStrategy::FixedWidth(width) => Some(char_index * width),
            IndexStrategy::VariableWidth => {
                let bytes = self.bytes();
                Some(self.encoding().nth_char_offset(bytes, 0, bytes.len(), char_index))
            }
            IndexStrategy::Lenient => {
                let (encoding, bytes) = (self.encoding(), self.bytes());
                let mut pos = 0;
                for _ in 0..char_index {
                    if pos >= bytes.len() {
                        break;
                    }
                    pos += lenient_step(encoding, bytes, pos);
                }
                Some(pos.min(bytes.len()))
            }
        };
    }

    /// Number of characters that start before `byte_index`, so a byte offset
    /// inside a character maps to the character after it.
    pub fn char_index_of(&self, byte_index: usize) -> Option<usize> {
        if byte_index > self.byte_len() {
            return None;
        }
        if byte_index == 0 {
            return Some(0);
        }
        return match self.index_strategy() {
            IndexStrategy::SingleByte => Some(byte_index),
            IndexStrategy::FixedWidth(width) => Some(byte_index.div_ceil(width)),
            // valid UTF-8: every byte but a continuation byte starts a character
            IndexStrategy::VariableWidth if self.encoding().is_utf8() => {
                Some(self.bytes()[..byte_index].iter().filter(|&&byte| byte & 0xC0 != 0x80).count())
            }
            IndexStrategy::VariableWidth | IndexStrategy::Lenient => {
                Some(count_chars_before(self.encoding(), self.bytes(), byte_index))
            }
        };
    }

    /// Up to `char_count` characters starting at `char_index`, or `None` if
    /// `char_index` is past the end.
    pub fn char_range(&self, char_index: usize, char_count: usize) -> Option<Rope> {
        let start = self.byte_index_of(char_index)?;
        let end_char = char_index.saturating_add(char_count).min(self.char_len());
        let end = self.byte_index_of(end_char)?;
        return self.substring(start, end - start).ok();
    }
}
