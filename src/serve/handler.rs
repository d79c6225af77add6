//! Request handling for the static file server

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use crate::cache::{CacheStore, FileStamp};
use crate::config::StaticFilesConfig;
use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::serve::resolve::resolve;

/// Serves files under a root directory through a shared [`CacheStore`]
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
    default_content_type: String,
    cache: CacheStore,
}

impl StaticFiles {
    pub fn new(config: &StaticFilesConfig, cache: CacheStore) -> Self {
        Self {
            root: config.root.clone(),
            index_file: config.index_file.clone(),
            default_content_type: config.default_content_type.clone(),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Produce the response for `request`
    ///
    /// Every method is answered the same way: 200 with the cached file
    /// contents, or 404 when neither the path nor its index file exists.
    pub async fn handle(&self, request: &Request) -> Response {
        let path = resolve(&self.root, &request.path);

        let Some((path, meta)) = self.locate(path).await else {
            return Response::not_found();
        };

        let body = self
            .cache
            .fetch(&path, FileStamp::from_metadata(&meta))
            .await;

        Response::file(self.content_type(&path), body)
    }

    /// Content type for a resolved path
    pub fn content_type<'a>(&'a self, path: &Path) -> &'a str {
        mime::lookup(path).unwrap_or(self.default_content_type.as_str())
    }

    /// Stat `path`, falling back to its index file when it is a directory
    ///
    /// A path that cannot be served, including an index that is itself a
    /// directory, is dropped from the cache in the background.
    async fn locate(&self, path: PathBuf) -> Option<(PathBuf, Metadata)> {
        let (path, meta) = self.stat(path).await?;
        if !meta.is_dir() {
            return Some((path, meta));
        }

        let (index, meta) = self.stat(path.join(&self.index_file)).await?;
        if meta.is_dir() {
            tracing::debug!(path = %index.display(), "Index file is a directory");
            self.cache.spawn_remove(index);
            return None;
        }
        Some((index, meta))
    }

    async fn stat(&self, path: PathBuf) -> Option<(PathBuf, Metadata)> {
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Some((path, meta)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "File not found");
                self.cache.spawn_remove(path);
                None
            }
        }
    }
}
