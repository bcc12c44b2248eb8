//! Display masking for peer keys that have no configured name.
//!
//! This is obfuscation for reports, not a security control: the visible
//! prefix is taken verbatim and two keys sharing that prefix map to the same
//! masked identity.

use serde::{Deserialize, Serialize};

/// Default number of leading key characters left visible.
pub const DEFAULT_VISIBLE_CHARS: usize = 5;

const MASK_SUFFIX: &str = "***";

/// How an unknown peer key is turned into a display-safe identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskPolicy {
    /// Leading characters of the key kept in the masked form.
    pub visible_chars: usize,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        Self {
            visible_chars: DEFAULT_VISIBLE_CHARS,
        }
    }
}

impl MaskPolicy {
    pub fn new(visible_chars: usize) -> Self {
        Self { visible_chars }
    }

    /// Mask `key`: keep the first `visible_chars` characters, replace `/`
    /// with `?` so the result is usable as a file name, then append `***`.
    ///
    /// # Examples
    ///
    /// ```
    /// use traffic_core::masking::MaskPolicy;
    ///
    /// let policy = MaskPolicy::default();
    /// assert_eq!(policy.mask("ab/cdEFGHIJ="), "ab?cd***");
    /// assert_eq!(policy.mask("xy"), "xy***");
    /// ```
    pub fn mask(&self, key: &str) -> String {
        let mut masked: String = key
            .chars()
            .take(self.visible_chars)
            .map(|c| if c == '/' { '?' } else { c })
            .collect();
        masked.push_str(MASK_SUFFIX);
        masked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "hT5/q+Zp9vWm1xLr0AbCdEfGhIjKlMnOpQrStUvWxYz=";

    #[test]
    fn test_mask_default_prefix() {
        assert_eq!(MaskPolicy::default().mask(KEY), "hT5?q***");
    }

    #[test]
    fn test_mask_is_deterministic() {
        let policy = MaskPolicy::default();
        assert_eq!(policy.mask(KEY), policy.mask(KEY));
    }

    #[test]
    fn test_mask_never_contains_full_key() {
        let masked = MaskPolicy::default().mask(KEY);
        assert!(!masked.contains(KEY));
        assert!(!masked.contains('/'));
    }

    #[test]
    fn test_mask_custom_width() {
        assert_eq!(MaskPolicy::new(2).mask(KEY), "hT***");
        assert_eq!(MaskPolicy::new(8).mask(KEY), "hT5?q+Zp***");
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(MaskPolicy::default().mask("ab"), "ab***");
        assert_eq!(MaskPolicy::default().mask(""), "***");
    }

    #[test]
    fn test_mask_counts_characters_not_bytes() {
        assert_eq!(MaskPolicy::new(2).mask("ééé"), "éé***");
    }

    #[test]
    fn test_mask_shared_prefix_collides() {
        let policy = MaskPolicy::default();
        assert_eq!(policy.mask("abcdeXXXX"), policy.mask("abcdeYYYY"));
    }
}
