use async_trait::async_trait;

use crate::errors::Result;

pub mod local;

/// Places validated file bytes on a persistent medium under an opaque name.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persists `bytes` under a freshly derived collision-resistant name and
    /// returns that name. Only the extension of `original_name` survives into
    /// the stored name.
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String>;

    async fn exists(&self, stored_name: &str) -> Result<bool>;

    /// Removes a stored object. Absence counts as success.
    async fn delete(&self, stored_name: &str) -> Result<()>;
}

/// Builds public URLs for stored objects from configured parts. Never
/// performs I/O.
#[derive(Debug, Clone)]
pub struct PublicUrls {
    base_url: String,
    prefix: String,
}

impl PublicUrls {
    pub fn new(base_url: &str, prefix: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: format!("/{}", prefix.trim_matches('/')),
        }
    }

    pub fn url_for(&self, stored_name: &str) -> String {
        format!("{}{}/{}", self.base_url, self.prefix, stored_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_base_prefix_and_stored_name() {
        let urls = PublicUrls::new("http://localhost:5001", "uploads");
        assert_eq!(
            urls.url_for("abc.png"),
            "http://localhost:5001/uploads/abc.png"
        );
    }

    #[test]
    fn stray_slashes_are_normalized() {
        let urls = PublicUrls::new("https://img.example.com/", "/uploads/");
        assert_eq!(
            urls.url_for("abc.png"),
            "https://img.example.com/uploads/abc.png"
        );
    }
}
