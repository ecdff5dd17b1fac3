//! SHA-256 checksums for archives and patches, plus configuration
//! fingerprints.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex digest of a file's contents, streamed.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read {} for hashing", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// 64 hex digits, either case.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Order-sensitive digest over labelled fields.
///
/// Fields are NUL-terminated so that `("ab", "c")` and `("a", "bc")` never
/// collide. [`Fingerprint::section`] marks where one group of fields ends, so
/// an option and a setting with the same name hash differently.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, name: &str) -> &mut Self {
        self.field("[").field(name)
    }

    pub fn update_pair(&mut self, key: &str, value: &str) -> &mut Self {
        self.field(key).field(value)
    }

    fn field(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update([0u8]);
        self
    }

    /// First 16 hex digits of the digest.
    pub fn finish_short(self) -> String {
        let mut digest = hex::encode(self.hasher.finalize());
        digest.truncate(16);
        digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_file_matches_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("0001-fix.patch");
        std::fs::write(&path, "hello").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), HELLO);
        assert_eq!(sha256_bytes(b"hello"), HELLO);
    }

    #[test]
    fn test_sha256_file_missing() {
        let tmp = TempDir::new().unwrap();
        let err = sha256_file(&tmp.path().join("gone.patch")).unwrap_err();
        assert!(err.to_string().contains("gone.patch"));
    }

    #[test]
    fn test_is_sha256_hex() {
        assert!(is_sha256_hex(HELLO));
        assert!(is_sha256_hex(&HELLO.to_uppercase()));
        assert!(!is_sha256_hex("abc"));
        assert!(!is_sha256_hex(&"g".repeat(64)));
    }

    #[test]
    fn test_fingerprint() {
        let fingerprint = |a: &str, b: &str| {
            let mut fp = Fingerprint::new();
            fp.update_pair("shared", a).update_pair("os", b);
            fp.finish_short()
        };

        assert_eq!(fingerprint("False", "Linux"), fingerprint("False", "Linux"));
        assert_ne!(fingerprint("False", "Linux"), fingerprint("True", "Linux"));
        assert_eq!(fingerprint("False", "Linux").len(), 16);
    }

    #[test]
    fn test_fingerprint_sections_separate_fields() {
        let mut a = Fingerprint::new();
        a.section("options").update_pair("os", "Linux");
        let mut b = Fingerprint::new();
        b.section("settings").update_pair("os", "Linux");
        assert_ne!(a.finish_short(), b.finish_short());
    }
}
