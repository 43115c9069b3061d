//! Sources of raw asset text.

use crate::error::{Result, ViewerError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;

/// Something that can retrieve the text of an asset given its URL or path.
///
/// The web implementation is [`HttpFetcher`](crate::web::HttpFetcher); natively
/// [`FileFetcher`] reads from disk and [`MemoryFetcher`] serves preloaded strings.
pub trait AssetFetcher {
    /// Fetches the whole text at `url`.
    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String>>;
}

/// Reads assets from a directory on the local filesystem.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileFetcher {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileFetcher {
    /// Resolves every asset path against `root`.
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        FileFetcher { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetFetcher for FileFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let path = self.root.join(url);
        std::fs::read_to_string(&path).map_err(|e| ViewerError::asset(url, e.to_string()))
    }
}

/// Serves assets from an in-memory table.
///
/// Also counts the requests it receives, which makes it handy to check that an
/// operation did not reload anything.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: RefCell<HashMap<String, String>>,
    requests: Cell<usize>,
}

impl MemoryFetcher {
    /// An empty fetcher: every request fails until files are inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the text served for `url`.
    pub fn insert(&self, url: impl Into<String>, text: impl Into<String>) {
        let _ = self.files.borrow_mut().insert(url.into(), text.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(url, text);
        self
    }

    /// Number of `fetch_text` calls received so far.
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }
}

impl AssetFetcher for MemoryFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.set(self.requests.get() + 1);
        self.files
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| ViewerError::asset(url, "not found"))
    }
}
