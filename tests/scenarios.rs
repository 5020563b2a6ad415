//! End-to-end scenarios through the public API.

use std::thread;

use encodings::{ASCII_8BIT, US_ASCII, UTF_16LE, UTF_8};
use twine::cache::RopeCache;
use twine::container::RopeSlot;
use twine::{CodeRange, Rope, RopeConfig, RopeError, tree};

// =============================================================================
// Basic operations
// =============================================================================

#[test]
fn concat_two_ascii_leaves() {
    let a = Rope::leaf(&b"ab"[..], US_ASCII, CodeRange::Unknown);
    let b = Rope::leaf(&b"cd"[..], US_ASCII, CodeRange::Unknown);
    let rope = a.concat(&b).unwrap();
    assert_eq!(rope.byte_len(), 4);
    assert_eq!(rope.bytes(), b"abcd");
    assert_eq!(rope.code_range(), CodeRange::SevenBit);
    assert_eq!(rope.char_len(), 4);
}

#[test]
fn substring_of_ascii_leaf() {
    let rope = Rope::leaf(&b"hello"[..], US_ASCII, CodeRange::Unknown);
    assert_eq!(rope.substring(1, 3).unwrap().bytes(), b"ell");
}

#[test]
fn repeat_ascii_leaf() {
    let rope = Rope::leaf(&b"xy"[..], US_ASCII, CodeRange::Unknown).repeat(3).unwrap();
    assert_eq!(rope.byte_len(), 6);
    assert_eq!(rope.bytes(), b"xyxyxy");
}

#[test]
fn concat_ascii_and_multibyte_utf8() {
    let a = Rope::leaf(&b"a"[..], UTF_8, CodeRange::Unknown);
    let e = Rope::leaf("é".as_bytes(), UTF_8, CodeRange::Unknown);
    let rope = a.concat(&e).unwrap();
    assert_eq!(rope.code_range(), CodeRange::Valid);
    assert_eq!(rope.char_len(), 2);
    assert_eq!(rope.byte_len(), 3);
}

#[test]
fn substring_past_the_end() {
    let rope = Rope::from("hello");
    assert_eq!(rope.substring(2, 4).unwrap_err(), RopeError::OutOfRange { offset: 2, len: 4, byte_len: 5 });
}

#[test]
fn concat_ascii_with_utf16() {
    let ascii = Rope::leaf(&b"abc"[..], US_ASCII, CodeRange::SevenBit);
    let wide = Rope::leaf(&[b'x', 0][..], UTF_16LE, CodeRange::Unknown);
    let err = ascii.concat(&wide).unwrap_err();
    assert!(matches!(err, RopeError::IncompatibleEncoding { .. }));
    assert_eq!(err.to_string(), "incompatible character encodings: US-ASCII and UTF-16LE");
}

// =============================================================================
// Larger workflows
// =============================================================================

#[test]
fn building_a_document_line_by_line() {
    let mut doc = Rope::empty(UTF_8);
    let mut expected = String::new();
    for i in 0..500 {
        let line = format!("line {i}: ünïcödé text\n");
        doc = doc.concat(&Rope::from(line.as_str())).unwrap();
        expected.push_str(&line);
    }
    assert_eq!(doc.bytes(), expected.as_bytes());
    assert_eq!(doc.char_len(), expected.chars().count());
    assert!(doc.depth() <= RopeConfig::global().depth_limit(doc.byte_len()));

    // the 100th line, by characters
    let start = expected.lines().take(100).map(|l| l.chars().count() + 1).sum::<usize>();
    let line = doc.char_range(start, 23).unwrap();
    assert_eq!(line.bytes(), "line 100: ünïcödé text\n".as_bytes());
}

#[test]
fn retagging_encodings() {
    let ascii = Rope::from("plain");
    let binary = ascii.with_encoding(ASCII_8BIT);
    assert_eq!(binary.encoding(), ASCII_8BIT);
    assert_eq!(binary.known_code_range(), CodeRange::SevenBit);
    assert!(binary.bytes_eq(&ascii));
    assert_ne!(binary, ascii);

    let bytes = Rope::from("é").with_encoding(ASCII_8BIT);
    assert_eq!(bytes.char_len(), 2);
    assert_eq!(bytes.with_encoding(UTF_8).char_len(), 1);
}

#[test]
fn explicit_config_changes_shape_not_content() {
    let eager = RopeConfig { concat_leaf_threshold: usize::MAX, lazy_substrings: false, ..RopeConfig::default() };
    let lazy = RopeConfig { concat_leaf_threshold: 0, substring_copy_threshold: 0, ..RopeConfig::default() };

    let a = Rope::from("the cat sat ");
    let b = Rope::from("on the mat");
    let eager_rope = tree::concat(&eager, &a, &b).unwrap();
    let lazy_rope = tree::concat(&lazy, &a, &b).unwrap();
    assert!(eager_rope.is_leaf());
    assert!(!lazy_rope.is_leaf());
    assert_eq!(eager_rope, lazy_rope);
    assert!(eager_rope.debug_tree().starts_with("Leaf"));
    assert!(lazy_rope.debug_tree().starts_with("Concat"));
}

// =============================================================================
// Sharing
// =============================================================================

#[test]
fn readers_share_one_rope_across_threads() {
    let piece = Rope::from("αβγδε ").repeat(100).unwrap();
    let rope = piece.concat(&Rope::from("end")).unwrap();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let rope = rope.clone();
            thread::spawn(move || {
                assert_eq!(rope.char_len(), 603);
                assert_eq!(rope.code_range(), CodeRange::Valid);
                assert_eq!(rope.byte_index_of(600 + i % 3), Some(1100 + i % 3));
                return rope.hash_with(9);
            })
        })
        .collect();
    let hashes: Vec<u64> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(hashes.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn cache_and_slot_together() {
    let cache = RopeCache::new();
    let slot = RopeSlot::new(cache.get_rope(b"key=", UTF_8, CodeRange::SevenBit));
    let value = cache.get_rope(b"value", UTF_8, CodeRange::SevenBit);
    slot.append(&value).unwrap();
    assert_eq!(slot.get().bytes(), b"key=value");
    assert!(cache.contains(&Rope::from("value")));
    drop(value);
    assert!(!cache.contains(&Rope::from("value")));
    assert_eq!(cache.intern(&slot.get()).bytes(), b"key=value");
}
