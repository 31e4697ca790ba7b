//! # Context Document Loading
//!
//! RDF canonicalization dereferences the `@context` URLs a credential
//! declares. Resolution goes through a [`DocumentLoader`]. The default
//! [`ContextCache`] serves well-known contexts from memory (populated from a
//! directory of cached files) and only consults a fallback loader, typically
//! a network fetcher, for URLs it does not hold. Documents the fallback
//! returns are kept for the lifetime of the cache, so each URL is fetched
//! at most once.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{CanonicalizationError, CoreError};

/// W3C Verifiable Credentials Data Model v2 context.
pub const CREDENTIALS_V2_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";
/// W3C Data Integrity v2 context.
pub const DATA_INTEGRITY_V2_CONTEXT: &str = "https://w3id.org/security/data-integrity/v2";
/// Open Badges 3.0 context.
pub const OB_V3P0_CONTEXT: &str = "https://purl.imsglobal.org/spec/ob/v3p0/context-3.0.3.json";
/// Status list 2021 context, declared by status list credentials.
pub const STATUS_LIST_2021_CONTEXT: &str = "https://w3id.org/vc/status-list/2021/v1";

/// Well-known context URLs and the file names they are cached under.
pub const KNOWN_CONTEXTS: &[(&str, &str)] = &[
    (OB_V3P0_CONTEXT, "ob-v3p0-context-3.0.3.json"),
    (CREDENTIALS_V2_CONTEXT, "credentials-v2.json"),
    (DATA_INTEGRITY_V2_CONTEXT, "data-integrity-v2.json"),
    (STATUS_LIST_2021_CONTEXT, "status-list-2021-v1.json"),
];

/// A resolved context document.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    /// The URL the document was resolved from.
    pub document_url: String,
    /// The parsed JSON document.
    pub document: Value,
}

/// Resolves context URLs to JSON documents.
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `url`.
    fn load(&self, url: &str) -> Result<RemoteDocument, CanonicalizationError>;
}

/// In-memory context cache with an optional fallback loader.
///
/// Clones share the documents fetched through the fallback.
#[derive(Clone, Default)]
pub struct ContextCache {
    documents: HashMap<String, Value>,
    fetched: Arc<RwLock<HashMap<String, Value>>>,
    fallback: Option<Arc<dyn DocumentLoader>>,
}

impl std::fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut urls: Vec<&String> = self.documents.keys().collect();
        urls.sort();
        f.debug_struct("ContextCache")
            .field("documents", &urls)
            .field("fetched", &self.fetched.read().len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ContextCache {
    /// An empty cache with no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every [`KNOWN_CONTEXTS`] file present in `dir`. Missing files are
    /// skipped; unreadable or malformed files are errors.
    pub fn from_dir(dir: &Path) -> Result<Self, CoreError> {
        let mut cache = Self::new();
        for (url, file) in KNOWN_CONTEXTS {
            let path = dir.join(file);
            if !path.exists() {
                tracing::debug!(url, path = %path.display(), "cached context file not present");
                continue;
            }
            let raw = std::fs::read_to_string(&path)?;
            let doc: Value = serde_json::from_str(&raw).map_err(|e| {
                CoreError::InvalidDocument(format!("{}: {e}", path.display()))
            })?;
            cache.insert(*url, doc);
        }
        tracing::debug!(count = cache.len(), dir = %dir.display(), "loaded cached contexts");
        Ok(cache)
    }

    /// Add or replace a cached document.
    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Consult `loader` for URLs not held in the cache.
    pub fn with_fallback(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.fallback = Some(loader);
        self
    }

    /// Whether `url` is served from memory, either preloaded or fetched
    /// earlier through the fallback.
    pub fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url) || self.fetched.read().contains_key(url)
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentLoader for ContextCache {
    fn load(&self, url: &str) -> Result<RemoteDocument, CanonicalizationError> {
        if let Some(doc) = self.documents.get(url) {
            return Ok(RemoteDocument {
                document_url: url.to_string(),
                document: doc.clone(),
            });
        }
        if let Some(doc) = self.fetched.read().get(url) {
            return Ok(RemoteDocument {
                document_url: url.to_string(),
                document: doc.clone(),
            });
        }
        match &self.fallback {
            Some(loader) => {
                tracing::warn!(url, "context not cached, using fallback loader");
                let remote = loader.load(url)?;
                self.fetched
                    .write()
                    .insert(url.to_string(), remote.document.clone());
                Ok(remote)
            }
            None => Err(CanonicalizationError::ContextLoad {
                url: url.to_string(),
                reason: "not in local cache and no fallback loader configured".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Fixed {
        calls: AtomicUsize,
    }

    impl DocumentLoader for Fixed {
        fn load(&self, url: &str) -> Result<RemoteDocument, CanonicalizationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteDocument {
                document_url: url.to_string(),
                document: json!({"@context": {"fetched": "urn:ex:fetched"}}),
            })
        }
    }

    #[test]
    fn cached_document_is_served() {
        let cache = ContextCache::new().with_document("urn:ctx", json!({"@context": {}}));
        let doc = cache.load("urn:ctx").unwrap();
        assert_eq!(doc.document_url, "urn:ctx");
    }

    #[test]
    fn miss_without_fallback_is_context_load_error() {
        let err = ContextCache::new().load("https://example.org/ctx").unwrap_err();
        assert!(matches!(err, CanonicalizationError::ContextLoad { .. }));
    }

    #[test]
    fn miss_uses_fallback() {
        let cache = ContextCache::new().with_fallback(Arc::new(Fixed::default()));
        let doc = cache.load("https://example.org/ctx").unwrap();
        assert!(doc.document["@context"]["fetched"].is_string());
    }

    #[test]
    fn fallback_documents_are_fetched_once() {
        let fixed = Arc::new(Fixed::default());
        let cache = ContextCache::new().with_fallback(fixed.clone());
        let shared = cache.clone();
        cache.load("https://example.org/ctx").unwrap();
        cache.load("https://example.org/ctx").unwrap();
        shared.load("https://example.org/ctx").unwrap();
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 1);
        assert!(shared.contains("https://example.org/ctx"));

        cache.load("https://example.org/other").unwrap();
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_fetch_is_not_remembered() {
        struct Offline;
        impl DocumentLoader for Offline {
            fn load(&self, url: &str) -> Result<RemoteDocument, CanonicalizationError> {
                Err(CanonicalizationError::ContextLoad {
                    url: url.to_string(),
                    reason: "offline".into(),
                })
            }
        }
        let cache = ContextCache::new().with_fallback(Arc::new(Offline));
        assert!(cache.load("https://example.org/ctx").is_err());
        assert!(!cache.contains("https://example.org/ctx"));
    }

    #[test]
    fn from_dir_loads_known_files_and_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("credentials-v2.json"),
            r#"{"@context": {"id": "@id"}}"#,
        )
        .unwrap();
        let cache = ContextCache::from_dir(dir.path()).unwrap();
        assert!(cache.contains(CREDENTIALS_V2_CONTEXT));
        assert!(!cache.contains(OB_V3P0_CONTEXT));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn from_dir_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data-integrity-v2.json"), "not json").unwrap();
        assert!(ContextCache::from_dir(dir.path()).is_err());
    }
}
