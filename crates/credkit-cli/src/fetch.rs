//! # HTTP Fetchers
//!
//! Blocking `reqwest` clients behind the two network seams of the library
//! crates: [`StatusListFetcher`] for published status list credentials and
//! [`DocumentLoader`] for JSON-LD contexts missing from the local cache.
//!
//! Each request is bounded by the configured timeout. Failures are mapped to
//! the caller's error type with the URL attached.

use std::time::Duration;

use serde_json::Value;

use credkit_core::{CanonicalizationError, DocumentLoader, RemoteDocument};
use credkit_vc::{StatusListFetcher, VcError};

/// Shared GET-and-parse logic.
#[derive(Debug, Clone)]
struct JsonClient {
    client: reqwest::blocking::Client,
}

impl JsonClient {
    fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("credkit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn get_json(&self, url: &str, accept: &'static str) -> Result<Value, String> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                }
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        resp.json::<Value>().map_err(|e| format!("invalid JSON: {e}"))
    }
}

/// Fetches status list credentials over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpStatusListFetcher {
    inner: JsonClient,
}

impl HttpStatusListFetcher {
    /// A fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: JsonClient::new(timeout)?,
        })
    }
}

impl StatusListFetcher for HttpStatusListFetcher {
    fn fetch(&self, url: &str) -> Result<Value, VcError> {
        tracing::debug!(url, "fetching status list credential");
        self.inner
            .get_json(url, "application/vc+ld+json, application/json")
            .map_err(|reason| VcError::Fetch {
                url: url.to_string(),
                reason,
            })
    }
}

/// Loads JSON-LD context documents over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpDocumentLoader {
    inner: JsonClient,
}

impl HttpDocumentLoader {
    /// A loader whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: JsonClient::new(timeout)?,
        })
    }
}

impl DocumentLoader for HttpDocumentLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument, CanonicalizationError> {
        tracing::debug!(url, "fetching JSON-LD context");
        let document = self
            .inner
            .get_json(url, "application/ld+json, application/json")
            .map_err(|reason| CanonicalizationError::ContextLoad {
                url: url.to_string(),
                reason,
            })?;
        Ok(RemoteDocument {
            document_url: url.to_string(),
            document,
        })
    }
}
