//! AFL fuzz harness for rope construction.
//!
//! Builds ropes from fuzzer-chosen concat, substring and repeat operations
//! over a small pool, keeping a plain `Vec<u8>` model of every rope, and
//! checks after each step that:
//! 1. Flattened bytes match the model
//! 2. Byte length matches the bytes
//! 3. Code range and character length match a fresh scan of the model
//! 4. Byte and character offsets round-trip on character boundaries,
//!    broken text included
//!
//! Thresholds are tiny so that every node kind and the rebalancer get hit.

use afl::fuzz;
use twine::code_range::classify;
use twine::tree;
use twine::{CodeRange, Encoding, Rope, RopeConfig};

const POOL: usize = 4;

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Replace a slot with a fresh leaf built from the next `len` input bytes
    Leaf { slot: u8, len: u8 },
    /// slot = left + right
    Concat { slot: u8, left: u8, right: u8 },
    /// slot = substring of source
    Substring { slot: u8, source: u8, offset_frac: u8, len_frac: u8 },
    /// slot = source repeated
    Repeat { slot: u8, source: u8, count: u8 },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 4;
        let rest = &bytes[1..];

        match op_type {
            0 if rest.len() >= 2 => {
                let op = FuzzOp::Leaf { slot: rest[0] % POOL as u8, len: rest[1] % 16 };
                Some((op, &rest[2..]))
            }
            1 if rest.len() >= 3 => {
                let op = FuzzOp::Concat {
                    slot: rest[0] % POOL as u8,
                    left: rest[1] % POOL as u8,
                    right: rest[2] % POOL as u8,
                };
                Some((op, &rest[3..]))
            }
            2 if rest.len() >= 4 => {
                let op = FuzzOp::Substring {
                    slot: rest[0] % POOL as u8,
                    source: rest[1] % POOL as u8,
                    offset_frac: rest[2],
                    len_frac: rest[3],
                };
                Some((op, &rest[4..]))
            }
            3 if rest.len() >= 3 => {
                let op = FuzzOp::Repeat {
                    slot: rest[0] % POOL as u8,
                    source: rest[1] % POOL as u8,
                    count: rest[2] % 8,
                };
                Some((op, &rest[3..]))
            }
            _ => None,
        }
    }
}

fn check(rope: &Rope, model: &[u8], encoding: Encoding) {
    assert_eq!(rope.bytes(), model, "flattened bytes differ from model");
    assert_eq!(rope.byte_len(), model.len(), "byte length mismatch");

    let (range, char_len) = classify(encoding, model);
    assert_eq!(rope.code_range(), range, "code range mismatch");
    assert_eq!(rope.char_len(), char_len, "character length mismatch");
    assert_eq!(rope.code_range(), range, "code range changed after being observed");

    for char_index in 0..=char_len {
        let byte_index = rope.byte_index_of(char_index).expect("index within char_len");
        assert_eq!(rope.char_index_of(byte_index), Some(char_index), "index round trip failed");
    }
    assert_eq!(rope.byte_index_of(char_len), Some(model.len()));
    assert_eq!(rope.char_index_of(model.len()), Some(char_len));
    assert!(rope.byte_index_of(char_len + 1).is_none());
}

fn main() {
    let config = RopeConfig {
        concat_leaf_threshold: 4,
        substring_copy_threshold: 2,
        substring_retention_ratio: 4,
        repeat_leaf_threshold: 8,
        max_depth: 6,
        lazy_substrings: true,
    };
    // every rope in one run shares an encoding, so all concats are legal
    let choices = [encodings::UTF_8, encodings::ASCII_8BIT, encodings::UTF_16LE, encodings::UTF_32LE];

    fuzz!(|data: &[u8]| {
        let Some((&selector, mut remaining)) = data.split_first() else {
            return;
        };
        let encoding = choices[selector as usize % choices.len()];
        let mut ropes: Vec<Rope> = (0..POOL).map(|_| Rope::empty(encoding)).collect();
        let mut models: Vec<Vec<u8>> = vec![Vec::new(); POOL];

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;

            let slot = match op {
                FuzzOp::Leaf { slot, len } => {
                    let take = (len as usize).min(remaining.len());
                    let (bytes, rest) = remaining.split_at(take);
                    remaining = rest;
                    ropes[slot as usize] = Rope::leaf(bytes, encoding, CodeRange::Unknown);
                    models[slot as usize] = bytes.to_vec();
                    slot
                }

                FuzzOp::Concat { slot, left, right } => {
                    let rope = tree::concat(&config, &ropes[left as usize], &ropes[right as usize])
                        .expect("same encoding always concatenates");
                    let model = [&models[left as usize][..], &models[right as usize][..]].concat();
                    ropes[slot as usize] = rope;
                    models[slot as usize] = model;
                    slot
                }

                FuzzOp::Substring { slot, source, offset_frac, len_frac } => {
                    let model = &models[source as usize];
                    let offset = offset_frac as usize * model.len() / 256;
                    let len = len_frac as usize * (model.len() - offset) / 256;
                    let rope = tree::substring(&config, &ropes[source as usize], offset, len)
                        .expect("range is within the rope");
                    let model = model[offset..offset + len].to_vec();

                    // out of range must fail rather than panic
                    assert!(tree::substring(&config, &rope, 0, len + 1).is_err());

                    ropes[slot as usize] = rope;
                    models[slot as usize] = model;
                    slot
                }

                FuzzOp::Repeat { slot, source, count } => {
                    // keep the model small
                    if models[source as usize].len() * count as usize > 4096 {
                        continue;
                    }
                    let rope = tree::repeat(&config, &ropes[source as usize], count as usize)
                        .expect("small repeats fit in usize");
                    let model = models[source as usize].repeat(count as usize);
                    ropes[slot as usize] = rope;
                    models[slot as usize] = model;
                    slot
                }
            };

            let rope = &ropes[slot as usize];
            assert!(rope.depth() <= config.depth_limit(rope.byte_len()), "tree too deep:\n{}", rope.debug_tree());
            check(rope, &models[slot as usize], encoding);
        }

        // equal bytes hash equally whatever the shape
        for (rope, model) in ropes.iter().zip(&models) {
            let flat = Rope::leaf(model.clone(), encoding, CodeRange::Unknown);
            assert!(rope.bytes_eq(&flat));
            assert_eq!(rope.hash_with(42), flat.hash_with(42));
        }
    });
}
