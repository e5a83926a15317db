//! Cache keys for media payloads.

use std::fmt;

use sha2::{Digest, Sha256};

/// File extension used for disk cache entries.
pub const CACHE_FILE_EXTENSION: &str = "cache";

/// Which representation of a URL a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePurpose {
    /// Downscaled preview.
    Thumbnail,
    /// Original bytes.
    Full,
}

impl CachePurpose {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumb_",
            Self::Full => "full_",
        }
    }
}

/// Deterministic key derived from an origin URL and a purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a key for the given URL and purpose.
    #[must_use]
    pub fn new(url: &str, purpose: CachePurpose) -> Self {
        Self(format!("{}{url}", purpose.prefix()))
    }

    /// Key for the thumbnail of `url`.
    #[must_use]
    pub fn thumbnail(url: &str) -> Self {
        Self::new(url, CachePurpose::Thumbnail)
    }

    /// Key for the full payload of `url`.
    #[must_use]
    pub fn full(url: &str) -> Self {
        Self::new(url, CachePurpose::Full)
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps an arbitrary cache key to its on-disk file name.
///
/// The name is the hex SHA-256 of the key plus [`CACHE_FILE_EXTENSION`]; the
/// key cannot be recovered from it.
#[must_use]
pub fn disk_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}.{CACHE_FILE_EXTENSION}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_differ_by_purpose() {
        let url = "https://files.example/a.png";
        assert_eq!(CacheKey::thumbnail(url).as_str(), "thumb_https://files.example/a.png");
        assert_eq!(CacheKey::full(url).as_str(), "full_https://files.example/a.png");
        assert_ne!(CacheKey::thumbnail(url), CacheKey::full(url));
    }

    #[test]
    fn test_disk_file_name_is_stable_and_safe() {
        let name = disk_file_name("full_https://files.example/a.png?x=1&y=/../");
        assert_eq!(name, disk_file_name("full_https://files.example/a.png?x=1&y=/../"));
        assert_eq!(name.len(), 64 + ".cache".len());
        assert!(name.ends_with(".cache"));
        assert!(name[..64].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
