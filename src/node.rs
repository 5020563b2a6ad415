//! The rope node.
//!
//! A [`Rope`] is an `Arc` to an immutable node. Four variants exist:
//!
//! - **Leaf**: owns a byte buffer.
//! - **Substring**: a window onto a base rope, which is never itself a
//!   substring.
//! - **Concat**: two child ropes side by side.
//! - **Repeat**: a base rope repeated `count` times.
//!
//! # Cached fields
//!
//! Byte length and depth are fixed at construction. Code range, character
//! length and the flattened bytes of concat/repeat nodes are computed on
//! first use and cached on the node. Every one of them is a pure function of
//! the node's bytes and encoding, so two threads racing to fill a cache
//! compute the same value and it does not matter whose store lands. The code
//! range and character length are plain relaxed atomics for that reason;
//! the flattened bytes sit in a `OnceLock`.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::Weak;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use encodings::Encoding;

use crate::code_range::{self, CodeRange};
use crate::error::{Result, RopeError};
use crate::stats;

/// Marker for a character length that has not been computed.
const UNSET: usize = usize::MAX;

/// An immutable, structurally shared byte string tagged with an encoding.
///
/// Cloning is a reference count increment.
#[derive(Clone)]
pub struct Rope(pub(crate) Arc<Node>);

pub(crate) struct Node {
    encoding: Encoding,
    byte_len: usize,
    depth: u32,
    kind: Kind,
    code_range: AtomicU8,
    char_len: AtomicUsize,
    flat: OnceLock<Arc<[u8]>>,
}

pub(crate) enum Kind {
    Leaf { bytes: Arc<[u8]> },
    Substring { base: Rope, offset: usize },
    Concat { left: Rope, right: Rope, balanced: bool },
    Repeat { base: Rope, count: usize },
}

impl Node {
    fn new(encoding: Encoding, byte_len: usize, depth: u32, kind: Kind, code_range: CodeRange, char_len: Option<usize>) -> Node {
        return Node {
            encoding,
            byte_len,
            depth,
            kind,
            code_range: AtomicU8::new(code_range as u8),
            char_len: AtomicUsize::new(char_len.unwrap_or(UNSET)),
            flat: OnceLock::new(),
        };
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Rope {
    /// Build a leaf from bytes, trusting `hint` when it is not `Unknown`.
    ///
    /// A wrong hint is a caller bug; debug builds check it.
    pub fn leaf(bytes: impl Into<Arc<[u8]>>, encoding: Encoding, hint: CodeRange) -> Rope {
        let bytes = bytes.into();
        debug_assert!(
            !hint.is_known() || code_range::classify(encoding, &bytes).0 == hint,
            "code range hint {hint} does not match the bytes"
        );
        let char_len = match hint {
            CodeRange::SevenBit => Some(bytes.len()),
            CodeRange::Valid if encoding.is_fixed_width() => Some(bytes.len() / encoding.min_width()),
            _ => None,
        };
        return Rope::new_leaf(bytes, encoding, hint, char_len);
    }

    pub(crate) fn new_leaf(bytes: Arc<[u8]>, encoding: Encoding, code_range: CodeRange, char_len: Option<usize>) -> Rope {
        let byte_len = bytes.len();
        let kind = Kind::Leaf { bytes };
        return Rope(Arc::new(Node::new(encoding, byte_len, 1, kind, code_range, char_len)));
    }

    /// The canonical empty rope for `encoding`.
    pub fn empty(encoding: Encoding) -> Rope {
        static EMPTY: OnceLock<RwLock<FxHashMap<&'static str, Rope>>> = OnceLock::new();

        let table = EMPTY.get_or_init(Default::default);
        let cached = table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(encoding.name())
            .cloned();
        if let Some(rope) = cached {
            return rope;
        }

        let mut table = table.write().unwrap_or_else(PoisonError::into_inner);
        let rope = table.entry(encoding.name()).or_insert_with(|| {
            let (range, _) = code_range::classify(encoding, &[]);
            Rope::new_leaf(Arc::from(&[][..]), encoding, range, Some(0))
        });
        return rope.clone();
    }

    /// Caller guarantees `base` is not a substring and the window fits.
    pub(crate) fn new_substring(base: Rope, offset: usize, byte_len: usize, code_range: CodeRange) -> Rope {
        debug_assert!(!matches!(base.0.kind, Kind::Substring { .. }));
        debug_assert!(offset + byte_len <= base.byte_len());
        let char_len = (code_range == CodeRange::SevenBit).then_some(byte_len);
        let depth = base.depth() + 1;
        let encoding = base.encoding();
        let kind = Kind::Substring { base, offset };
        return Rope(Arc::new(Node::new(encoding, byte_len, depth, kind, code_range, char_len)));
    }

    /// Caller guarantees the lengths do not overflow.
    pub(crate) fn new_concat(left: Rope, right: Rope, encoding: Encoding) -> Rope {
        let byte_len = left.byte_len() + right.byte_len();
        let depth = left.depth().max(right.depth()) + 1;
        let balanced = Rope::is_balanced_pair(&left, &right);

        // broken halves may join into valid text, so a broken child leaves
        // the concat unknown until it is scanned
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

        let kind = Kind::Concat { left, right, balanced };
        return Rope(Arc::new(Node::new(encoding, byte_len, depth, kind, code_range, char_len)));
    }

    /// Caller guarantees `count >= 2` and that the length does not overflow.
    pub(crate) fn new_repeat(base: Rope, count: usize) -> Rope {
        let byte_len = base.byte_len() * count;
        let depth = base.depth() + 1;
        let encoding = base.encoding();
        // a broken base can read as valid text once its tail meets its head
        let code_range = match base.known_code_range() {
            CodeRange::Broken => CodeRange::Unknown,
            range => range,
        };
        let char_len = match (code_range, base.known_char_len()) {
            (CodeRange::SevenBit | CodeRange::Valid, Some(len)) => Some(len * count),
            _ => None,
        };
        let kind = Kind::Repeat { base, count };
        return Rope(Arc::new(Node::new(encoding, byte_len, depth, kind, code_range, char_len)));
    }

    /// A concat of two non-concats is balanced, as is a concat of two
    /// balanced concats. Nothing else is.
    fn is_balanced_pair(left: &Rope, right: &Rope) -> bool {
        return match (&left.0.kind, &right.0.kind) {
            (Kind::Concat { balanced: l, .. }, Kind::Concat { balanced: r, .. }) => *l && *r,
            (Kind::Concat { .. }, _) | (_, Kind::Concat { .. }) => false,
            _ => true,
        };
    }

    pub(crate) fn kind(&self) -> &Kind {
        return &self.0.kind;
    }

    pub(crate) fn downgrade(&self) -> Weak<Node> {
        return Arc::downgrade(&self.0);
    }

    pub(crate) fn upgrade(weak: &Weak<Node>) -> Option<Rope> {
        return weak.upgrade().map(Rope);
    }
}

impl From<&str> for Rope {
    /// A UTF-8 leaf. `str` is always valid, so the code range is known.
    fn from(text: &str) -> Rope {
        let (range, char_len) = if text.is_ascii() {
            (CodeRange::SevenBit, text.len())
        } else {
            (CodeRange::Valid, text.chars().count())
        };
        return Rope::new_leaf(Arc::from(text.as_bytes()), encodings::UTF_8, range, Some(char_len));
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Rope {
        return Rope::from(text.as_str());
    }
}

// =============================================================================
// Metadata
// =============================================================================

impl Rope {
    pub fn encoding(&self) -> Encoding {
        return self.0.encoding;
    }

    pub fn byte_len(&self) -> usize {
        return self.0.byte_len;
    }

    pub fn is_empty(&self) -> bool {
        return self.0.byte_len == 0;
    }

    /// 1 for a leaf, one more than the deepest child otherwise.
    pub fn depth(&self) -> u32 {
        return self.0.depth;
    }

    pub fn is_leaf(&self) -> bool {
        return matches!(self.0.kind, Kind::Leaf { .. });
    }

    /// The cached code range, without computing it.
    pub fn known_code_range(&self) -> CodeRange {
        return CodeRange::from_u8(self.0.code_range.load(Ordering::Relaxed));
    }

    /// The cached character length, without computing it.
    pub fn known_char_len(&self) -> Option<usize> {
        let len = self.0.char_len.load(Ordering::Relaxed);
        return (len != UNSET).then_some(len);
    }

    /// The code range, computed and cached on first call.
    pub fn code_range(&self) -> CodeRange {
        let known = self.known_code_range();
        if known.is_known() {
            return known;
        }
        let (range, char_len) = self.compute_code_range();
        self.0.code_range.store(range as u8, Ordering::Relaxed);
        if let Some(len) = char_len {
            self.0.char_len.store(len, Ordering::Relaxed);
        }
        return range;
    }

    /// Number of characters, computed and cached on first call.
    pub fn char_len(&self) -> usize {
        if let Some(len) = self.known_char_len() {
            return len;
        }
        let len = self.compute_char_len();
        self.0.char_len.store(len, Ordering::Relaxed);
        return len;
    }

    /// Whether every character occupies exactly one byte.
    pub fn is_single_byte_optimizable(&self) -> bool {
        return self.0.encoding.is_single_byte() || self.code_range() == CodeRange::SevenBit;
    }

    /// Whether the rope is known to be all ASCII. Does not compute anything.
    pub fn is_ascii_only(&self) -> bool {
        return self.known_code_range() == CodeRange::SevenBit;
    }

    fn compute_code_range(&self) -> (CodeRange, Option<usize>) {
        match &self.0.kind {
            Kind::Concat { left, right, .. } => {
                let joined = left.code_range().join(right.code_range());
                if joined != CodeRange::Broken {
                    return (joined, Some(left.char_len() + right.char_len()));
                }
            }
            Kind::Repeat { base, count } => {
                let range = base.code_range();
                if range != CodeRange::Broken {
                    return (range, Some(base.char_len() * count));
                }
            }
            Kind::Leaf { .. } | Kind::Substring { .. } => {}
        }
        let (range, char_len) = code_range::classify(self.0.encoding, self.bytes());
        return (range, Some(char_len));
    }

    fn compute_char_len(&self) -> usize {
        let range = self.code_range();
        if let Some(len) = self.known_char_len() {
            return len;
        }
        if range == CodeRange::SevenBit {
            return self.0.byte_len;
        }
        return code_range::classify(self.0.encoding, self.bytes()).1;
    }
}

// =============================================================================
// Bytes
// =============================================================================

impl Rope {
    /// The rope's bytes as one contiguous slice.
    ///
    /// Leaves return their buffer and substrings a window onto their base.
    /// Concat and repeat nodes are flattened once and the result is cached
    /// on the node, so later calls are free.
    pub fn bytes(&self) -> &[u8] {
        return match &self.0.kind {
            Kind::Leaf { bytes } => bytes,
            Kind::Substring { base, offset } => &base.bytes()[*offset..*offset + self.0.byte_len],
            Kind::Concat { .. } | Kind::Repeat { .. } => self.0.flat.get_or_init(|| self.flatten_uncached()),
        };
    }

    /// Shared buffer holding exactly this rope's bytes. Free for leaves and
    /// for flattened concat/repeat nodes; substrings copy.
    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        return match &self.0.kind {
            Kind::Leaf { bytes } => bytes.clone(),
            Kind::Substring { .. } => Arc::from(self.bytes()),
            Kind::Concat { .. } | Kind::Repeat { .. } => self.0.flat.get_or_init(|| self.flatten_uncached()).clone(),
        };
    }

    /// Bytes already available without work: a leaf's buffer or a cached
    /// flattening.
    fn ready_bytes(&self) -> Option<&[u8]> {
        return match &self.0.kind {
            Kind::Leaf { bytes } => Some(bytes),
            _ => self.0.flat.get().map(|flat| &flat[..]),
        };
    }

    fn flatten_uncached(&self) -> Arc<[u8]> {
        stats::flatten();
        if self.0.byte_len >= 1 << 20 {
            tracing::trace!(byte_len = self.0.byte_len, depth = self.0.depth, "flattening large rope");
        }
        let mut out = Vec::with_capacity(self.0.byte_len);
        self.write_range(0, self.0.byte_len, &mut out);
        debug_assert_eq!(out.len(), self.0.byte_len);
        return Arc::from(out);
    }

    /// Append `len` bytes starting at `offset` to `out` without populating
    /// any flattening cache along the way.
    pub(crate) fn write_range(&self, offset: usize, len: usize, out: &mut Vec<u8>) {
        debug_assert!(offset + len <= self.0.byte_len);

        // right pieces are pushed first so left pieces pop first
        let mut stack: SmallVec<[(&Rope, usize, usize); 32]> = SmallVec::new();
        stack.push((self, offset, len));

        while let Some((rope, offset, len)) = stack.pop() {
            if len == 0 {
                continue;
            }
            if let Some(bytes) = rope.ready_bytes() {
                out.extend_from_slice(&bytes[offset..offset + len]);
                continue;
            }
            match &rope.0.kind {
                Kind::Leaf { bytes } => out.extend_from_slice(&bytes[offset..offset + len]),
                Kind::Substring { base, offset: start } => stack.push((base, start + offset, len)),
                Kind::Concat { left, right, .. } => {
                    let split = left.byte_len();
                    if offset >= split {
                        stack.push((right, offset - split, len));
                    } else if offset + len <= split {
                        stack.push((left, offset, len));
                    } else {
                        stack.push((right, 0, offset + len - split));
                        stack.push((left, offset, split - offset));
                    }
                }
                Kind::Repeat { base, .. } => Rope::write_cycle(base, offset, len, out),
            }
        }
    }

    /// Append `len` bytes of `base` repeated forever, starting at `offset`.
    fn write_cycle(base: &Rope, offset: usize, len: usize, out: &mut Vec<u8>) {
        let period = base.byte_len();
        let start = out.len();
        let phase = offset % period;

        // one period (rotated to the phase) in place, then doubling copies
        let head = (period - phase).min(len);
        base.write_range(phase, head, out);
        if head < len {
            base.write_range(0, (period.min(len - head)).min(phase), out);
        }
        while out.len() - start < len {
            let have = out.len() - start;
            let take = have.min(len - have);
            out.extend_from_within(start..start + take);
        }
    }

    /// Read one byte by descending the tree, without flattening.
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        if index >= self.0.byte_len {
            return None;
        }
        let mut rope = self;
        let mut index = index;
        loop {
            if let Some(bytes) = rope.ready_bytes() {
                return Some(bytes[index]);
            }
            match &rope.0.kind {
                Kind::Leaf { bytes } => return Some(bytes[index]),
                Kind::Substring { base, offset } => {
                    index += offset;
                    rope = base;
                }
                Kind::Concat { left, right, .. } => {
                    let split = left.byte_len();
                    if index < split {
                        rope = left;
                    } else {
                        index -= split;
                        rope = right;
                    }
                }
                Kind::Repeat { base, .. } => {
                    index %= base.byte_len();
                    rope = base;
                }
            }
        }
    }

    /// Code point of the character that starts at byte `index`.
    ///
    /// ASCII bytes and single-byte encodings are answered from `get_byte`
    /// without flattening. An offset that does not start a complete valid
    /// character is `InvalidByteSequence`.
    pub fn code_point_at(&self, index: usize) -> Result<u32> {
        let byte_len = self.0.byte_len;
        let Some(byte) = self.get_byte(index) else {
            return Err(RopeError::OutOfRange { offset: index, len: 1, byte_len });
        };
        let encoding = self.0.encoding;
        let invalid = RopeError::InvalidByteSequence { index, encoding: encoding.name() };
        if byte < 0x80 && encoding.is_ascii_compatible() {
            return Ok(u32::from(byte));
        }
        if encoding.is_single_byte() {
            return encoding.code_point_at(&[byte], 0, 1).ok_or(invalid);
        }
        let bytes = self.bytes();
        return encoding.code_point_at(bytes, index, bytes.len()).ok_or(invalid);
    }

    /// A leaf with the same bytes, encoding and cached metadata. Leaves
    /// return themselves; concat and repeat nodes share their cached
    /// flattening with the new leaf.
    pub fn flatten_to_leaf(&self) -> Rope {
        if self.is_leaf() {
            return self.clone();
        }
        let char_len = self.known_char_len();
        return Rope::new_leaf(self.shared_bytes(), self.0.encoding, self.known_code_range(), char_len);
    }

    /// The same bytes tagged with another encoding.
    ///
    /// Pure ASCII stays pure ASCII under any ASCII compatible encoding;
    /// otherwise the code range is recomputed on demand.
    pub fn with_encoding(&self, encoding: Encoding) -> Rope {
        if encoding == self.0.encoding {
            return self.clone();
        }
        if self.is_empty() {
            return Rope::empty(encoding);
        }
        let seven_bit = self.known_code_range() == CodeRange::SevenBit && encoding.is_ascii_compatible();
        if seven_bit {
            return Rope::new_leaf(self.shared_bytes(), encoding, CodeRange::SevenBit, Some(self.0.byte_len));
        }
        return Rope::new_leaf(self.shared_bytes(), encoding, CodeRange::Unknown, None);
    }
}

// =============================================================================
// Debugging
// =============================================================================

impl Rope {
    fn kind_name(&self) -> &'static str {
        return match self.0.kind {
            Kind::Leaf { .. } => "Leaf",
            Kind::Substring { .. } => "Substring",
            Kind::Concat { .. } => "Concat",
            Kind::Repeat { .. } => "Repeat",
        };
    }

    /// One line per node, children indented under their parent.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.debug_tree_into(0, &mut out);
        return out;
    }

    fn debug_tree_into(&self, level: usize, out: &mut String) {
        for _ in 0..level {
            out.push_str("|  ");
        }
        let char_len = match self.known_char_len() {
            Some(len) => len.to_string(),
            None => "?".to_string(),
        };
        let _ = write!(
            out,
            "{} ({}; BL: {}; CL: {}; CR: {}; D: {}; F: {}",
            self.kind_name(),
            self.0.encoding,
            self.0.byte_len,
            char_len,
            self.known_code_range(),
            self.0.depth,
            self.ready_bytes().is_some(),
        );
        match &self.0.kind {
            Kind::Leaf { .. } => out.push_str(")\n"),
            Kind::Substring { base, offset } => {
                let _ = writeln!(out, "; O: {offset})");
                base.debug_tree_into(level + 1, out);
            }
            Kind::Concat { left, right, balanced } => {
                let _ = writeln!(out, "; B: {balanced})");
                left.debug_tree_into(level + 1, out);
                right.debug_tree_into(level + 1, out);
            }
            Kind::Repeat { base, count } => {
                let _ = writeln!(out, "; T: {count})");
                base.debug_tree_into(level + 1, out);
            }
        }
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("Rope")
            .field("kind", &self.kind_name())
            .field("encoding", &self.0.encoding)
            .field("byte_len", &self.0.byte_len)
            .field("code_range", &self.known_code_range())
            .field("depth", &self.0.depth)
            .finish();
    }
}
