//! Counters for the rope's hot paths.
//!
//! Relaxed atomics: the numbers are for humans reading `report()`, not for
//! synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

pub static FLATTENS: AtomicU64 = AtomicU64::new(0);
pub static REBALANCES: AtomicU64 = AtomicU64::new(0);
pub static EAGER_LEAVES: AtomicU64 = AtomicU64::new(0);
pub static CODE_RANGE_SCANS: AtomicU64 = AtomicU64::new(0);
pub static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
pub static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn flatten() {
    FLATTENS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn rebalance() {
    REBALANCES.fetch_add(1, Ordering::Relaxed);
}

/// A concat, substring or repeat copied bytes into a new leaf.
#[inline]
pub fn eager_leaf() {
    EAGER_LEAVES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn code_range_scan() {
    CODE_RANGE_SCANS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn cache_hit() {
    CACHE_HITS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn cache_miss() {
    CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
}

/// Every counter with the label `report()` prints for it.
fn counters() -> [(&'static str, &'static AtomicU64); 6] {
    return [
        ("flattens", &FLATTENS),
        ("rebalances", &REBALANCES),
        ("eager_leaves", &EAGER_LEAVES),
        ("code_range_scans", &CODE_RANGE_SCANS),
        ("cache_hits", &CACHE_HITS),
        ("cache_misses", &CACHE_MISSES),
    ];
}

pub fn reset() {
    for (_, counter) in counters() {
        counter.store(0, Ordering::Relaxed);
    }
}

/// One `label=value` pair per counter, space separated.
pub fn report() -> String {
    return counters()
        .iter()
        .map(|(label, counter)| format!("{label}={}", counter.load(Ordering::Relaxed)))
        .collect::<Vec<_>>()
        .join(" ");
}

#[cfg(test)]
mod tests {
    use super::*;

    // counters are shared with every other test in the process, so only
    // lower bounds can be checked
    #[test]
    fn counters_only_grow_between_resets() {
        let before = REBALANCES.load(Ordering::Relaxed);
        rebalance();
        rebalance();
        assert!(REBALANCES.load(Ordering::Relaxed) >= before + 2);
    }

    #[test]
    fn report_names_every_counter() {
        cache_hit();
        let report = report();
        for (label, _) in counters() {
            assert!(report.contains(&format!("{label}=")), "{report}");
        }
        assert_eq!(report.split(' ').count(), 6);
    }
}
