use std::fmt;

use serde::Serialize;

pub const DEFAULT_SITE_PREFIX: &str = "W";

/// Normalized site identifier.
///
/// Sites show up either prefixed (`W2470`) or as bare digits (`2470`); both
/// parse to the same key, which is the only join key used internally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SiteKey {
    prefix: String,
    bare: String,
}

impl SiteKey {
    pub fn parse(raw: &str, prefix: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let upper_prefix = prefix.trim().to_ascii_uppercase();
        let bare = match trimmed.get(..upper_prefix.len()) {
            Some(head) if !upper_prefix.is_empty() && head.eq_ignore_ascii_case(&upper_prefix) => {
                &trimmed[upper_prefix.len()..]
            }
            _ => trimmed,
        };
        let bare = bare.trim();
        if bare.is_empty() {
            return None;
        }
        Some(Self {
            prefix: upper_prefix,
            bare: bare.to_ascii_uppercase(),
        })
    }

    pub fn canonical(&self) -> String {
        format!("{}{}", self.prefix, self.bare)
    }

    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// Both textual forms, for `IN (...)` filters against the store.
    pub fn forms(&self) -> [String; 2] {
        [self.canonical(), self.bare.clone()]
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_and_bare_forms_are_one_site() {
        let prefixed = SiteKey::parse("W2470", DEFAULT_SITE_PREFIX).unwrap();
        let bare = SiteKey::parse("2470", DEFAULT_SITE_PREFIX).unwrap();
        assert_eq!(prefixed, bare);
        assert_eq!(prefixed.canonical(), "W2470");
        assert_eq!(bare.bare(), "2470");
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let key = SiteKey::parse("  w2470 ", "W").unwrap();
        assert_eq!(key.to_string(), "W2470");
        assert_eq!(key.forms(), ["W2470".to_string(), "2470".to_string()]);
    }

    #[test]
    fn empty_keys_are_rejected() {
        assert!(SiteKey::parse("", "W").is_none());
        assert!(SiteKey::parse("W", "W").is_none());
        assert!(SiteKey::parse("   ", "W").is_none());
    }

    #[test]
    fn honours_custom_prefix() {
        let key = SiteKey::parse("SITE-88", "SITE-").unwrap();
        assert_eq!(key.bare(), "88");
        assert_eq!(SiteKey::parse("88", "SITE-").unwrap(), key);
    }
}
