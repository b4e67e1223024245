//! Cache key derivation.

use std::fmt;

use sha2::{Digest, Sha256};

const INSTRUCTION_SEPARATOR: &str = "\n---\n";
const REQUEST_SEPARATOR: &str = "\n===\n";

/// Hex-encoded SHA-256 digest identifying one cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an ordered instruction list and a canonical request
    /// description. Pure: identical inputs always give the identical key.
    ///
    /// The hashed text is the instructions joined by `\n---\n`, then `\n===\n`,
    /// then the description. An instruction that itself contains `\n---\n`
    /// hashes the same as the two instructions on either side of it.
    pub fn derive(instructions: &[String], request_description: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(instructions.join(INSTRUCTION_SEPARATOR).as_bytes());
        hasher.update(REQUEST_SEPARATOR.as_bytes());
        hasher.update(request_description.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Self(hash)
    }

    /// Accept an existing key if it is a well-formed lower-case SHA-256 hex digest.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_is_deterministic() {
        let instructions = strings(&["be realistic", "return JSON"]);
        let a = CacheKey::derive(&instructions, "GET /api/users");
        let b = CacheKey::derive(&instructions, "GET /api/users");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(CacheKey::parse(a.as_str()).is_some());
    }

    #[test]
    fn test_any_input_change_changes_key() {
        let base = CacheKey::derive(&strings(&["a", "b"]), "GET /x");

        assert_ne!(base, CacheKey::derive(&strings(&["a", "b"]), "GET /y"));
        assert_ne!(base, CacheKey::derive(&strings(&["a", "c"]), "GET /x"));
        assert_ne!(base, CacheKey::derive(&strings(&["a"]), "GET /x"));
        // Order matters
        assert_ne!(base, CacheKey::derive(&strings(&["b", "a"]), "GET /x"));
    }

    #[test]
    fn test_instruction_boundaries_shift_key() {
        let split = CacheKey::derive(&strings(&["ab", "c"]), "req");
        let joined = CacheKey::derive(&strings(&["a", "bc"]), "req");
        assert_ne!(split, joined);
    }

    #[test]
    fn test_known_digest() {
        // sha256("\n===\n")
        let key = CacheKey::derive(&[], "");
        let mut hasher = Sha256::new();
        hasher.update(b"\n===\n");
        let expected: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(key.as_str(), expected);
    }

    #[test]
    fn test_hashed_layout() {
        let key = CacheKey::derive(&strings(&["a", "b"]), "d");
        let mut hasher = Sha256::new();
        hasher.update(b"a\n---\nb\n===\nd");
        let expected: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(key.as_str(), expected);

        // Embedded separators are not escaped.
        assert_eq!(key, CacheKey::derive(&strings(&["a\n---\nb"]), "d"));
    }

    #[test]
    fn test_parse_rejects_non_digests() {
        assert!(CacheKey::parse("../../etc/passwd").is_none());
        assert!(CacheKey::parse(&"A".repeat(64)).is_none());
        assert!(CacheKey::parse("abc").is_none());
    }
}
