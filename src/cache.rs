//! Interning of leaf ropes.
//!
//! A [`RopeCache`] hands out one shared leaf per `(bytes, encoding)` pair
//! for as long as somebody holds it. Entries are weak, so the cache never
//! keeps a rope alive by itself. When the bytes are cached under another
//! encoding, the new leaf shares that buffer.
//!
//! Dead entries are swept on insert whenever the bucket count has doubled
//! since the last sweep, so the table stays proportional to the live ropes.

use std::hash::Hash;
use std::hash::Hasher;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::Weak;
use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;

use encodings::Encoding;

use crate::code_range::CodeRange;
use crate::node::{Node, Rope};
use crate::stats;

type Bucket = SmallVec<[Weak<Node>; 1]>;

/// Bucket count below which inserts never sweep.
const MIN_SWEEP_BUCKETS: usize = 64;

/// Weak map from `(bytes, encoding)` to a shared leaf.
#[derive(Default)]
pub struct RopeCache {
    buckets: RwLock<FxHashMap<u64, Bucket>>,
    /// Bucket count at which the next insert sweeps dead entries.
    sweep_at: AtomicUsize,
    ropes_reused: AtomicUsize,
    buffers_reused: AtomicUsize,
    bytes_saved: AtomicUsize,
}

fn bucket_key(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    bytes.hash(&mut hasher);
    return hasher.finish();
}

/// Drop dead entries and empty buckets. Returns how many entries went.
fn sweep(buckets: &mut FxHashMap<u64, Bucket>) -> usize {
    let mut removed = 0;
    buckets.retain(|_, bucket| {
        let before = bucket.len();
        bucket.retain(|weak| weak.strong_count() > 0);
        removed += before - bucket.len();
        !bucket.is_empty()
    });
    return removed;
}

/// A live rope in `bucket` with these bytes, and this encoding if given.
fn find(bucket: &[Weak<Node>], bytes: &[u8], encoding: Option<Encoding>) -> Option<Rope> {
    return bucket
        .iter()
        .filter_map(Rope::upgrade)
        .find(|rope| encoding.is_none_or(|encoding| rope.encoding() == encoding) && rope.bytes() == bytes);
}

impl RopeCache {
    pub fn new() -> RopeCache {
        return RopeCache::default();
    }

    /// The cached leaf for `bytes` in `encoding`, creating it on a miss.
    ///
    /// `code_range` is used only when a new leaf is made, and is trusted the
    /// way [`Rope::leaf`] trusts it.
    pub fn get_rope(&self, bytes: &[u8], encoding: Encoding, code_range: CodeRange) -> Rope {
        return self.lookup_or_insert(bytes, encoding, |same_bytes| match same_bytes {
            Some(other) => Rope::leaf(other.shared_bytes(), encoding, code_range),
            None => Rope::leaf(bytes, encoding, code_range),
        });
    }

    /// The cached leaf with the same bytes and encoding as `rope`. On a miss
    /// `rope` itself, flattened to a leaf, becomes the cached entry.
    pub fn intern(&self, rope: &Rope) -> Rope {
        let leaf = rope.flatten_to_leaf();
        return self.lookup_or_insert(leaf.bytes(), leaf.encoding(), |_| leaf.clone());
    }

    fn lookup_or_insert(&self, bytes: &[u8], encoding: Encoding, make: impl FnOnce(Option<&Rope>) -> Rope) -> Rope {
        let key = bucket_key(bytes);

        {
            let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(rope) = buckets.get(&key).and_then(|bucket| find(bucket, bytes, Some(encoding))) {
                stats::cache_hit();
                self.ropes_reused.fetch_add(1, Ordering::Relaxed);
                self.bytes_saved.fetch_add(rope.byte_len(), Ordering::Relaxed);
                return rope;
            }
        }

        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(key).or_default();
        if let Some(rope) = find(bucket, bytes, Some(encoding)) {
            stats::cache_hit();
            self.ropes_reused.fetch_add(1, Ordering::Relaxed);
            self.bytes_saved.fetch_add(rope.byte_len(), Ordering::Relaxed);
            return rope;
        }

        stats::cache_miss();
        let same_bytes = find(bucket, bytes, None);
        let rope = make(same_bytes.as_ref());
        if same_bytes.is_some() && rope.is_leaf() {
            self.buffers_reused.fetch_add(1, Ordering::Relaxed);
            self.bytes_saved.fetch_add(rope.byte_len(), Ordering::Relaxed);
        }

        bucket.retain(|weak| weak.strong_count() > 0);
        bucket.push(rope.downgrade());

        if buckets.len() >= self.sweep_at.load(Ordering::Relaxed).max(MIN_SWEEP_BUCKETS) {
            let removed = sweep(&mut buckets);
            self.sweep_at.store(2 * buckets.len(), Ordering::Relaxed);
            tracing::debug!(removed, remaining_buckets = buckets.len(), "swept rope cache");
        }
        return rope;
    }

    /// Whether a live leaf with the same bytes and encoding is cached.
    pub fn contains(&self, rope: &Rope) -> bool {
        let bytes = rope.bytes();
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        return buckets
            .get(&bucket_key(bytes))
            .and_then(|bucket| find(bucket, bytes, Some(rope.encoding())))
            .is_some();
    }

    /// Number of live cached ropes.
    pub fn len(&self) -> usize {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        return buckets
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|weak| weak.strong_count() > 0)
            .count();
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Drop entries whose rope is gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let removed = sweep(&mut buckets);
        self.sweep_at.store(2 * buckets.len(), Ordering::Relaxed);
        tracing::debug!(removed, remaining_buckets = buckets.len(), "purged rope cache");
        return removed;
    }

    /// Number of hash buckets, live or not.
    pub fn bucket_count(&self) -> usize {
        return self.buckets.read().unwrap_or_else(PoisonError::into_inner).len();
    }

    /// Lookups answered with an existing rope.
    pub fn ropes_reused(&self) -> usize {
        return self.ropes_reused.load(Ordering::Relaxed);
    }

    /// Misses answered by sharing the buffer of the same bytes in another
    /// encoding.
    pub fn buffers_reused(&self) -> usize {
        return self.buffers_reused.load(Ordering::Relaxed);
    }

    /// Bytes that did not have to be allocated thanks to the cache.
    pub fn bytes_saved(&self) -> usize {
        return self.bytes_saved.load(Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodings::{ASCII_8BIT, UTF_8};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn same_bytes_same_rope() {
        let cache = RopeCache::new();
        let a = cache.get_rope(b"hello", UTF_8, CodeRange::SevenBit);
        let b = cache.get_rope(b"hello", UTF_8, CodeRange::Unknown);
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.ropes_reused(), 1);
        assert_eq!(cache.bytes_saved(), 5);
    }

    #[test]
    fn other_encoding_shares_the_buffer() {
        let cache = RopeCache::new();
        let utf8 = cache.get_rope(b"bytes", UTF_8, CodeRange::Unknown);
        let binary = cache.get_rope(b"bytes", ASCII_8BIT, CodeRange::Unknown);
        assert!(!Arc::ptr_eq(&utf8.0, &binary.0));
        assert!(std::ptr::eq(utf8.bytes().as_ptr(), binary.bytes().as_ptr()));
        assert_eq!(binary.encoding(), ASCII_8BIT);
        assert_eq!(cache.buffers_reused(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn entries_die_with_their_ropes() {
        let cache = RopeCache::new();
        let kept = cache.get_rope(b"kept", UTF_8, CodeRange::Unknown);
        drop(cache.get_rope(b"dropped", UTF_8, CodeRange::Unknown));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&kept));
        assert!(!cache.contains(&Rope::from("dropped")));
        assert_eq!(cache.purge(), 1);
        assert_eq!(cache.purge(), 0);
    }

    #[test]
    fn dead_entries_are_swept_without_purge() {
        let cache = RopeCache::new();
        let kept = cache.get_rope(b"kept", UTF_8, CodeRange::SevenBit);
        for i in 0..10_000 {
            drop(cache.get_rope(format!("key {i}").as_bytes(), UTF_8, CodeRange::SevenBit));
        }
        assert!(cache.bucket_count() <= MIN_SWEEP_BUCKETS, "{} buckets", cache.bucket_count());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&kept));
    }

    #[test]
    fn live_entries_raise_the_sweep_point() {
        let cache = RopeCache::new();
        let live: Vec<Rope> = (0..500).map(|i| cache.get_rope(format!("live {i}").as_bytes(), UTF_8, CodeRange::SevenBit)).collect();
        assert_eq!(cache.bucket_count(), 500);
        assert_eq!(cache.len(), 500);
        drop(live);
        assert_eq!(cache.purge(), 500);
        assert_eq!(cache.bucket_count(), 0);
    }

    #[test]
    fn racing_lookups_count_every_reuse() {
        let cache = &RopeCache::new();
        let barrier = &Barrier::new(8);
        let ropes: Vec<Rope> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        return (0..50).map(|_| cache.get_rope(b"contended", UTF_8, CodeRange::SevenBit)).collect::<Vec<_>>();
                    })
                })
                .collect();
            return handles.into_iter().flat_map(|handle| handle.join().unwrap()).collect();
        });
        assert!(ropes.iter().all(|rope| Arc::ptr_eq(&rope.0, &ropes[0].0)));
        // one lookup made the rope; every other one reused it
        assert_eq!(cache.ropes_reused(), ropes.len() - 1);
        assert_eq!(cache.bytes_saved(), (ropes.len() - 1) * 9);
    }

    #[test]
    fn intern_flattens_and_reuses() {
        let cache = RopeCache::new();
        let tree = Rope::from("abcdefghijklmnop").concat(&Rope::from("qrstuvwxyz0123456789")).unwrap();
        let first = cache.intern(&tree);
        assert!(first.is_leaf());
        let again = cache.intern(&Rope::from("abcdefghijklmnopqrstuvwxyz0123456789"));
        assert!(Arc::ptr_eq(&first.0, &again.0));
        assert!(cache.contains(&tree));
    }
}
