//! Request-identity cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::Request;

/// Compute the storage hash for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identity of a stored entry: method plus absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl CacheKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        let url = url.to_string();
        let method = method.to_ascii_uppercase();
        let hash = compute_cache_key(&method, &url);
        Self { method, url, hash }
    }

    pub fn for_request(request: &Request) -> Self {
        Self::new(&request.method, &request.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://blog.test/");
        let hash2 = compute_cache_key("GET", "https://blog.test/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(compute_cache_key("get", "https://blog.test/"), compute_cache_key("GET", "https://blog.test/"));
    }

    #[test]
    fn test_hash_different_method() {
        assert_ne!(compute_cache_key("GET", "https://blog.test/"), compute_cache_key("HEAD", "https://blog.test/"));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://blog.test/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = CacheKey::new("GET", &Url::parse("https://blog.test/post/#comments").unwrap());
        let b = CacheKey::new("get", &Url::parse("https://blog.test/post/").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.url, "https://blog.test/post/");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = CacheKey::new("GET", &Url::parse("https://blog.test/search.xml?v=1").unwrap());
        let b = CacheKey::new("GET", &Url::parse("https://blog.test/search.xml?v=2").unwrap());
        assert_ne!(a.hash, b.hash);
    }
}
