//! The authoritative data source for browsing queries.

use async_trait::async_trait;

use crate::explorer::{FileItem, Folder, Paginated};

/// Read access to folders and files. Implemented by the relational store and
/// by [`CachedSource`](crate::explorer::CachedSource), which wraps one.
#[async_trait]
pub trait ExplorerSource: Send + Sync {
    async fn root_folders(&self, page: u32, limit: u32) -> anyhow::Result<Paginated<Folder>>;

    async fn child_folders(
        &self,
        parent_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>>;

    async fn folder_files(
        &self,
        folder_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>>;

    async fn find_folder(&self, id: &str) -> anyhow::Result<Option<Folder>>;

    async fn search_folders(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>>;

    async fn search_files(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>>;
}
