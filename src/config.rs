//! Tuning constants for the tree algorithms.
//!
//! The thresholds trade copying against tree size. None of them change what
//! a rope contains, only how it is represented, so any value is correct and
//! the defaults are a starting point for measurement.

use std::env;
use std::sync::OnceLock;

static GLOBAL: OnceLock<RopeConfig> = OnceLock::new();

/// Thresholds used by concat, substring and repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RopeConfig {
    /// Concatenations shorter than this many bytes are copied into a leaf.
    pub concat_leaf_threshold: usize,
    /// Substrings of at most this many bytes are copied into a leaf.
    pub substring_copy_threshold: usize,
    /// A substring of a leaf is copied when it is less than
    /// `1 / substring_retention_ratio` of the leaf, so a small slice never
    /// pins a huge buffer. Zero disables the rule.
    pub substring_retention_ratio: usize,
    /// Repetitions of at most this many bytes are materialized.
    pub repeat_leaf_threshold: usize,
    /// Concat depth allowed before rebalancing, for ropes shorter than
    /// `2^(max_depth / 2)` bytes. Longer ropes may grow to twice `log2` of
    /// their length.
    pub max_depth: u32,
    /// When false, every substring is copied into a leaf.
    pub lazy_substrings: bool,
}

impl Default for RopeConfig {
    fn default() -> Self {
        return RopeConfig {
            concat_leaf_threshold: 24,
            substring_copy_threshold: 24,
            substring_retention_ratio: 16,
            repeat_leaf_threshold: 256,
            max_depth: 32,
            lazy_substrings: true,
        };
    }
}

/// Parse a boolean-like flag. Truthy: `1`, `true`, `yes`, `on`; falsy: `0`,
/// `false`, `no`, `off`, empty. Case-insensitive, whitespace ignored.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    return env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default);
}

impl RopeConfig {
    /// Defaults, overridden by `TWINE_CONCAT_LEAF_THRESHOLD`,
    /// `TWINE_SUBSTRING_COPY_THRESHOLD`, `TWINE_SUBSTRING_RETENTION_RATIO`,
    /// `TWINE_REPEAT_LEAF_THRESHOLD`, `TWINE_MAX_DEPTH` and
    /// `TWINE_LAZY_SUBSTRINGS` when set. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = RopeConfig::default();
        return RopeConfig {
            concat_leaf_threshold: env_parsed(
                "TWINE_CONCAT_LEAF_THRESHOLD",
                defaults.concat_leaf_threshold,
            ),
            substring_copy_threshold: env_parsed(
                "TWINE_SUBSTRING_COPY_THRESHOLD",
                defaults.substring_copy_threshold,
            ),
            substring_retention_ratio: env_parsed(
                "TWINE_SUBSTRING_RETENTION_RATIO",
                defaults.substring_retention_ratio,
            ),
            repeat_leaf_threshold: env_parsed(
                "TWINE_REPEAT_LEAF_THRESHOLD",
                defaults.repeat_leaf_threshold,
            ),
            max_depth: env_parsed("TWINE_MAX_DEPTH", defaults.max_depth).max(2),
            lazy_substrings: env::var("TWINE_LAZY_SUBSTRINGS")
                .ok()
                .and_then(|value| parse_env_flag(&value))
                .unwrap_or(defaults.lazy_substrings),
        };
    }

    /// The process-wide configuration used by `Rope` methods. Read from the
    /// environment on first use unless [`RopeConfig::install`] ran earlier.
    pub fn global() -> &'static RopeConfig {
        return GLOBAL.get_or_init(RopeConfig::from_env);
    }

    /// Set the process-wide configuration. Fails, handing the config back,
    /// if the global configuration was already installed or read.
    pub fn install(config: RopeConfig) -> Result<(), RopeConfig> {
        return GLOBAL.set(config);
    }

    /// Deepest concat tree allowed for a rope of `byte_len` bytes.
    pub fn depth_limit(&self, byte_len: usize) -> u32 {
        let log2 = usize::BITS - byte_len.leading_zeros();
        return self.max_depth.max(2 * log2);
    }
}
