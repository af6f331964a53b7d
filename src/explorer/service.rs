//! Explorer Service
//!
//! Browsing use cases over any [`ExplorerSource`]. Cache keys do not carry
//! the page size, so the service pins one per query family.

use tracing::debug;

use crate::cache::Cache;
use crate::explorer::{
    CachedSource, ExplorerSource, FileItem, Folder, FolderContent, Page, SearchHits, SearchKind,
    SearchResults,
};

/// Page size for folder tree and folder content listings.
pub const LISTING_PAGE_SIZE: u32 = 50;

/// Page size for search results.
pub const SEARCH_PAGE_SIZE: u32 = 20;

pub struct ExplorerService<S> {
    source: S,
}

impl<S: ExplorerSource> ExplorerService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Service whose source is wrapped in read-through caching.
    pub fn cached(source: S, cache: Cache) -> ExplorerService<CachedSource<S>> {
        ExplorerService::new(CachedSource::new(source, cache))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Top-level folders.
    pub async fn tree(&self, page: u32) -> anyhow::Result<Page<Folder>> {
        let page = page.max(1);
        let result = self.source.root_folders(page, LISTING_PAGE_SIZE).await?;
        Ok(result.into())
    }

    pub async fn folder(&self, id: &str) -> anyhow::Result<Option<Folder>> {
        self.source.find_folder(id).await
    }

    /// Sub-folders and files of one folder, fetched concurrently.
    pub async fn folder_content(&self, folder_id: &str, page: u32) -> anyhow::Result<FolderContent> {
        let page = page.max(1);
        debug!(folder = folder_id, page, "Loading folder content");

        let (folders, files) = tokio::try_join!(
            self.source
                .child_folders(folder_id, page, LISTING_PAGE_SIZE),
            self.source.folder_files(folder_id, page, LISTING_PAGE_SIZE),
        )?;

        Ok(FolderContent {
            folders: folders.into(),
            files: files.into(),
        })
    }

    /// Name search over folders or files. Folders when `kind` is omitted.
    pub async fn search(
        &self,
        query: &str,
        kind: Option<SearchKind>,
        page: u32,
    ) -> anyhow::Result<SearchResults> {
        let kind = kind.unwrap_or_default();
        let page = page.max(1);

        let result = match kind {
            SearchKind::Folder => SearchHits::Folders(
                self.source
                    .search_folders(query, page, SEARCH_PAGE_SIZE)
                    .await?
                    .into(),
            ),
            SearchKind::File => {
                let files: Page<FileItem> = self
                    .source
                    .search_files(query, page, SEARCH_PAGE_SIZE)
                    .await?
                    .into();
                SearchHits::Files(files)
            }
        };

        Ok(SearchResults {
            query: query.to_string(),
            kind,
            result,
        })
    }
}
