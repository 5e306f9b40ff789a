//! Tree Configuration
//!
//! Knobs that change observable tree behaviour. Defaults match the
//! historical element semantics; `from_env` lets a host flip them without
//! recompiling.

use std::num::NonZeroUsize;

/// Environment variable enabling the string-value separator
pub const ENV_STRINGVALUE_SEPARATOR: &str = "RUSTYTREE_STRINGVALUE_SEPARATOR";
/// Environment variable sizing the qualified-name cache
pub const ENV_QNAME_CACHE: &str = "RUSTYTREE_QNAME_CACHE";

const DEFAULT_QNAME_CACHE: usize = 1024;

/// Configuration for an [`XmlTree`](crate::dom::XmlTree)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    /// Join multi-child text with a single space
    pub string_value_separator: bool,
    /// Capacity of the factory's interned-name cache
    pub qname_cache_capacity: NonZeroUsize,
    /// Keep a journal of child-added / child-removed hook calls
    pub record_hooks: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            string_value_separator: false,
            qname_cache_capacity: NonZeroUsize::MIN.saturating_add(DEFAULT_QNAME_CACHE - 1),
            record_hooks: false,
        }
    }
}

impl TreeConfig {
    /// Defaults overlaid with `RUSTYTREE_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = TreeConfig::default();

        if let Some(value) = lookup(ENV_STRINGVALUE_SEPARATOR) {
            config.string_value_separator = parse_flag(&value);
        }

        if let Some(capacity) = lookup(ENV_QNAME_CACHE)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(NonZeroUsize::new)
        {
            config.qname_cache_capacity = capacity;
        }

        config
    }

    /// Enable or disable the string-value separator
    pub fn with_separator(mut self, enabled: bool) -> Self {
        self.string_value_separator = enabled;
        self
    }

    /// Enable or disable the hook journal
    pub fn with_hook_journal(mut self, enabled: bool) -> Self {
        self.record_hooks = enabled;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TreeConfig::default();
        assert!(!config.string_value_separator);
        assert!(!config.record_hooks);
        assert_eq!(config.qname_cache_capacity.get(), 1024);
    }

    #[test]
    fn test_lookup_overlay() {
        let config = TreeConfig::from_lookup(|key| match key {
            ENV_STRINGVALUE_SEPARATOR => Some("TRUE".to_string()),
            ENV_QNAME_CACHE => Some("16".to_string()),
            _ => None,
        });
        assert!(config.string_value_separator);
        assert_eq!(config.qname_cache_capacity.get(), 16);
    }

    #[test]
    fn test_bad_values_ignored() {
        let config = TreeConfig::from_lookup(|key| match key {
            ENV_STRINGVALUE_SEPARATOR => Some("nope".to_string()),
            ENV_QNAME_CACHE => Some("0".to_string()),
            _ => None,
        });
        assert!(!config.string_value_separator);
        assert_eq!(config.qname_cache_capacity.get(), 1024);
    }
}
