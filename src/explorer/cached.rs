//! Read-through caching in front of an [`ExplorerSource`].

use async_trait::async_trait;
use tracing::warn;

use crate::cache::{Cache, TtlClass};
use crate::explorer::{keys, ExplorerSource, FileItem, Folder, Paginated, SearchKind};

/// Wraps a source so that listing, lookup and search results are served from
/// the cache when present and written back after a miss.
///
/// Cache failures never surface here: a broken backend degrades to calling
/// the inner source every time.
pub struct CachedSource<S> {
    inner: S,
    cache: Cache,
}

impl<S: ExplorerSource> CachedSource<S> {
    pub fn new(inner: S, cache: Cache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Drops the cached folder and every listing cached under it.
    pub async fn invalidate_folder(&self, id: &str) {
        self.cache.del(&keys::folder(id)).await;
        match keys::folder_scope(id) {
            Ok(scope) => {
                self.cache.del_matching(&scope).await;
            }
            Err(e) => warn!(folder = id, error = %e, "Folder invalidation failed"),
        }
    }

    pub async fn invalidate_searches(&self) {
        if let Err(e) = self.cache.del_pattern(keys::search_pattern()).await {
            warn!(error = %e, "Search invalidation failed");
        }
    }
}

#[async_trait]
impl<S: ExplorerSource> ExplorerSource for CachedSource<S> {
    async fn root_folders(&self, page: u32, limit: u32) -> anyhow::Result<Paginated<Folder>> {
        self.cache
            .get_or_compute(&keys::root_folders(page), TtlClass::Medium, || {
                self.inner.root_folders(page, limit)
            })
            .await
    }

    async fn child_folders(
        &self,
        parent_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>> {
        self.cache
            .get_or_compute(
                &keys::folder_children(parent_id, page),
                TtlClass::Medium,
                || self.inner.child_folders(parent_id, page, limit),
            )
            .await
    }

    async fn folder_files(
        &self,
        folder_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>> {
        self.cache
            .get_or_compute(
                &keys::folder_content(folder_id, page),
                TtlClass::Medium,
                || self.inner.folder_files(folder_id, page, limit),
            )
            .await
    }

    // Misses are not cached, so a folder created later is found right away.
    async fn find_folder(&self, id: &str) -> anyhow::Result<Option<Folder>> {
        let key = keys::folder(id);
        if let Some(folder) = self.cache.get::<Folder>(&key).await {
            return Ok(Some(folder));
        }

        let found = self.inner.find_folder(id).await?;
        if let Some(folder) = &found {
            if let Err(e) = self
                .cache
                .set(&key, folder, Some(TtlClass::Long.duration()))
                .await
            {
                warn!(key = %key, error = %e, "Cache write-back skipped");
            }
        }

        Ok(found)
    }

    async fn search_folders(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>> {
        self.cache
            .get_or_compute(
                &keys::search(SearchKind::Folder, query, page),
                TtlClass::Short,
                || self.inner.search_folders(query, page, limit),
            )
            .await
    }

    async fn search_files(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>> {
        self.cache
            .get_or_compute(
                &keys::search(SearchKind::File, query, page),
                TtlClass::Short,
                || self.inner.search_files(query, page, limit),
            )
            .await
    }
}
