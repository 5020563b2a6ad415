//! Concatenation, substring and repetition.
//!
//! Each operation builds new nodes over shared children and never touches
//! an existing node. Small results are copied into leaves; everything else
//! becomes a tree node. No operation builds a rope deeper than
//! [`RopeConfig::depth_limit`]: a concat side that would push it past the
//! limit is rebuilt as a balanced tree first, and a substring or repeat
//! over a base at the limit is built over the base's flattened leaf.
//!
//! The free functions take an explicit [`RopeConfig`]; the `Rope` methods
//! of the same names use [`RopeConfig::global`].

use std::sync::Arc;

use smallvec::SmallVec;

use encodings::Encoding;

use crate::code_range::CodeRange;
use crate::config::RopeConfig;
use crate::error::{Result, RopeError};
use crate::node::{Kind, Rope};
use crate::stats;

// =============================================================================
// Concat
// =============================================================================

/// Encoding of `left + right`, or an error if the two cannot be combined.
///
/// Different encodings combine when one side is empty, or when both are
/// ASCII compatible and one side is pure ASCII; the result takes the other
/// side's encoding.
pub fn concat_encoding(left: &Rope, right: &Rope) -> Result<Encoding> {
    let (left_enc, right_enc) = (left.encoding(), right.encoding());
    if left_enc == right_enc || right.is_empty() {
        return Ok(left_enc);
    }
    if left.is_empty() {
        return Ok(right_enc);
    }
    if left_enc.is_ascii_compatible() && right_enc.is_ascii_compatible() {
        if right.code_range() == CodeRange::SevenBit {
            return Ok(left_enc);
        }
        if left.code_range() == CodeRange::SevenBit {
            return Ok(right_enc);
        }
    }
    return Err(RopeError::IncompatibleEncoding {
        left: left_enc.name(),
        right: right_enc.name(),
    });
}

/// `left` followed by `right`.
pub fn concat(config: &RopeConfig, left: &Rope, right: &Rope) -> Result<Rope> {
    let encoding = concat_encoding(left, right)?;
    if left.is_empty() {
        return Ok(right.clone());
    }
    if right.is_empty() {
        return Ok(left.clone());
    }

    let byte_len = left.byte_len().checked_add(right.byte_len()).ok_or(RopeError::TooLong)?;
    let broken = left.known_code_range() == CodeRange::Broken || right.known_code_range() == CodeRange::Broken;
    if byte_len < config.concat_leaf_threshold || broken {
        return Ok(concat_leaf(left, right, encoding, byte_len));
    }

    let limit = config.depth_limit(byte_len);
    if left.depth().max(right.depth()) < limit {
        return Ok(Rope::new_concat(left.clone(), right.clone(), encoding));
    }

    let left = if left.depth() >= limit { rebalance(left, limit) } else { left.clone() };
    let right = if right.depth() >= limit { rebalance(right, limit) } else { right.clone() };
    return Ok(Rope::new_concat(left, right, encoding));
}

fn concat_leaf(left: &Rope, right: &Rope, encoding: Encoding, byte_len: usize) -> Rope {
    stats::eager_leaf();
    tracing::trace!(byte_len, "copying concat into leaf");

    let mut out = Vec::with_capacity(byte_len);
    left.write_range(0, left.byte_len(), &mut out);
    right.write_range(0, right.byte_len(), &mut out);

    let (left_range, right_range) = (left.known_code_range(), right.known_code_range());
    let code_range = if left_range == CodeRange::Broken || right_range == CodeRange::Broken {
        CodeRange::Unknown
    } else {
        left_range.join(right_range)
    };
    let char_len = match (left.known_char_len(), right.known_char_len()) {
        (Some(l), Some(r)) if code_range.is_known() => Some(l + r),
        _ => None,
    };
    return Rope::new_leaf(Arc::from(out), encoding, code_range, char_len);
}

/// Split the unbalanced concat spine of `rope` into its pieces, left to
/// right. Balanced concats and non-concat nodes are pieces.
fn linearize(rope: &Rope) -> Vec<Rope> {
    let mut pieces = Vec::new();
    let mut stack: SmallVec<[&Rope; 32]> = SmallVec::new();
    stack.push(rope);
    while let Some(node) = stack.pop() {
        match node.kind() {
            Kind::Concat { left, right, balanced: false } => {
                stack.push(right);
                stack.push(left);
            }
            _ => pieces.push(node.clone()),
        }
    }
    return pieces;
}

/// Rebuild `rope` as a balanced tree over its pieces. Pieces too deep to
/// sit under the new tree are flattened first.
fn rebalance(rope: &Rope, limit: u32) -> Rope {
    stats::rebalance();
    let encoding = rope.encoding();
    let old_depth = rope.depth();

    let flatten_depth = limit / 2;
    let mut pieces: Vec<Rope> = linearize(rope)
        .into_iter()
        .map(|piece| if piece.depth() >= flatten_depth { piece.flatten_to_leaf() } else { piece })
        .collect();
    let piece_count = pieces.len();

    while pieces.len() > 1 {
        pieces = pieces
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => Rope::new_concat(left.clone(), right.clone(), encoding),
                _ => pair[0].clone(),
            })
            .collect();
    }
    let balanced = pieces.pop().unwrap_or_else(|| rope.clone());

    tracing::debug!(
        byte_len = rope.byte_len(),
        old_depth,
        new_depth = balanced.depth(),
        pieces = piece_count,
        "rebalanced concat tree"
    );
    return balanced;
}

// =============================================================================
// Substring
// =============================================================================

/// `len` bytes of `base` starting at `offset`.
///
/// Byte offsets are not checked against character boundaries; slicing
/// through a character gives a rope whose code range is `Broken`.
pub fn substring(config: &RopeConfig, base: &Rope, offset: usize, len: usize) -> Result<Rope> {
    let byte_len = base.byte_len();
    if offset.checked_add(len).is_none_or(|end| end > byte_len) {
        return Err(RopeError::OutOfRange { offset, len, byte_len });
    }
    if len == 0 {
        return Ok(Rope::empty(base.encoding()));
    }
    if len == byte_len {
        return Ok(base.clone());
    }

    // narrow to the smallest node that holds the whole range
    let encoding = base.encoding();
    let mut base = base;
    let mut offset = offset;
    loop {
        match base.kind() {
            Kind::Substring { base: inner, offset: start } => {
                offset += start;
                base = inner;
            }
            Kind::Concat { left, right, .. } => {
                let split = left.byte_len();
                if offset + len <= split && left.encoding() == encoding {
                    base = left;
                } else if offset >= split && right.encoding() == encoding {
                    offset -= split;
                    base = right;
                } else {
                    break;
                }
            }
            Kind::Repeat { base: inner, .. } => {
                let period = inner.byte_len();
                if len == period && offset % period == 0 {
                    return Ok(inner.clone());
                }
                break;
            }
            Kind::Leaf { .. } => break,
        }
        if offset == 0 && len == base.byte_len() {
            return Ok(base.clone());
        }
    }

    let flat;
    if base.depth() >= config.depth_limit(len) {
        flat = base.flatten_to_leaf();
        base = &flat;
    }

    let pins_large_leaf = base.is_leaf()
        && config.substring_retention_ratio > 0
        && len.saturating_mul(config.substring_retention_ratio) < base.byte_len();
    if !config.lazy_substrings || len <= config.substring_copy_threshold || pins_large_leaf {
        return Ok(substring_leaf(base, offset, len));
    }

    let code_range = match base.known_code_range() {
        CodeRange::SevenBit => CodeRange::SevenBit,
        CodeRange::Valid if encoding.is_single_byte() => CodeRange::Valid,
        _ => CodeRange::Unknown,
    };
    return Ok(Rope::new_substring(base.clone(), offset, len, code_range));
}

fn substring_leaf(base: &Rope, offset: usize, len: usize) -> Rope {
    stats::eager_leaf();
    tracing::trace!(offset, len, base_len = base.byte_len(), "copying substring into leaf");

    let mut out = Vec::with_capacity(len);
    base.write_range(offset, len, &mut out);
    let (code_range, char_len) = match base.known_code_range() {
        CodeRange::SevenBit => (CodeRange::SevenBit, Some(len)),
        CodeRange::Valid if base.encoding().is_single_byte() => (CodeRange::Valid, Some(len)),
        _ => (CodeRange::Unknown, None),
    };
    return Rope::new_leaf(Arc::from(out), base.encoding(), code_range, char_len);
}

// =============================================================================
// Repeat
// =============================================================================

/// `base` repeated `count` times, or `TooLong` if the repeated length does
/// not fit in `usize`.
pub fn repeat(config: &RopeConfig, base: &Rope, count: usize) -> Result<Rope> {
    if count == 0 {
        return Ok(Rope::empty(base.encoding()));
    }
    if count == 1 || base.is_empty() {
        return Ok(base.clone());
    }

    let (base, count) = match base.kind() {
        Kind::Repeat { base: inner, count: inner_count } => (inner, inner_count.checked_mul(count)),
        _ => (base, Some(count)),
    };
    let count = count.ok_or(RopeError::TooLong)?;
    let byte_len = base.byte_len().checked_mul(count).ok_or(RopeError::TooLong)?;

    if byte_len <= config.repeat_leaf_threshold {
        return Ok(repeat_leaf(base, count, byte_len));
    }
    if base.depth() >= config.depth_limit(byte_len) {
        return Ok(Rope::new_repeat(base.flatten_to_leaf(), count));
    }
    return Ok(Rope::new_repeat(base.clone(), count));
}

fn repeat_leaf(base: &Rope, count: usize, byte_len: usize) -> Rope {
    stats::eager_leaf();
    tracing::trace!(count, byte_len, "copying repeat into leaf");

    let mut out = Vec::with_capacity(byte_len);
    if let (1, Some(byte)) = (base.byte_len(), base.get_byte(0)) {
        out.resize(byte_len, byte);
    } else {
        base.write_range(0, base.byte_len(), &mut out);
        while out.len() < byte_len {
            let take = out.len().min(byte_len - out.len());
            out.extend_from_within(..take);
        }
    }

    let (code_range, char_len) = match (base.known_code_range(), base.known_char_len()) {
        (range @ (CodeRange::SevenBit | CodeRange::Valid), Some(len)) => (range, Some(len * count)),
        (range @ (CodeRange::SevenBit | CodeRange::Valid), None) => (range, None),
        _ => (CodeRange::Unknown, None),
    };
    return Rope::new_leaf(Arc::from(out), base.encoding(), code_range, char_len);
}

// =============================================================================
// Rope methods
// =============================================================================

impl Rope {
    /// `self` followed by `other`, using the global configuration.
    pub fn concat(&self, other: &Rope) -> Result<Rope> {
        return concat(RopeConfig::global(), self, other);
    }

    /// `len` bytes starting at `offset`, using the global configuration.
    pub fn substring(&self, offset: usize, len: usize) -> Result<Rope> {
        return substring(RopeConfig::global(), self, offset, len);
    }

    /// `self` repeated `count` times, using the global configuration.
    pub fn repeat(&self, count: usize) -> Result<Rope> {
        return repeat(RopeConfig::global(), self, count);
    }
}
