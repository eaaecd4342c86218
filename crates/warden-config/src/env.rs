//! Environment sources consulted during validation.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only view over a set of environment variables.
pub trait EnvSource {
    /// Return the raw value of `key`, if present.
    fn var(&self, key: &str) -> Option<String>;

    /// Return the trimmed value of `key`, treating empty values as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_treats_blank_values_as_unset() {
        let env = BTreeMap::from([
            ("SET".to_string(), "  value ".to_string()),
            ("BLANK".to_string(), "   ".to_string()),
        ]);
        assert_eq!(env.non_empty("SET").as_deref(), Some("value"));
        assert_eq!(env.non_empty("BLANK"), None);
        assert_eq!(env.non_empty("MISSING"), None);
    }
}
