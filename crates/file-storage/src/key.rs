//! Cache key derivation

use sha2::{Digest, Sha256};

/// Namespace tag prefixed to every cache key owned by file storage
pub const KEY_NAMESPACE: &str = "fstor:";

/// Fold Windows-style separators into `/` so equivalent paths share a key
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// Derive the cache key for a logical file name
///
/// The key is the namespace tag followed by the hex SHA-256 of the
/// normalized name: 70 bytes regardless of name length.
pub fn derive_key(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_name(name).as_bytes());
    format!("{}{}", KEY_NAMESPACE, hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("a\\b\\c.txt"), "a/b/c.txt");
        assert_eq!(normalize_name("a/b/c.txt"), "a/b/c.txt");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key("transports/spice.py"), derive_key("transports/spice.py"));
    }

    #[test]
    fn test_equivalent_paths_share_key() {
        assert_eq!(derive_key("dir\\file"), derive_key("dir/file"));
    }

    #[test]
    fn test_distinct_names_have_distinct_keys() {
        assert_ne!(derive_key("a"), derive_key("b"));
        assert_ne!(derive_key("a/b"), derive_key("ab"));
    }

    #[test]
    fn test_key_shape() {
        let long_name = "x".repeat(4096);
        let key = derive_key(&long_name);
        assert!(key.starts_with(KEY_NAMESPACE));
        assert_eq!(key.len(), KEY_NAMESPACE.len() + 64);
        assert!(key.len() < 250);
        assert!(key[KEY_NAMESPACE.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
