//! Explorer Module
//!
//! Folder and file browsing on top of the cache: data shapes, the source
//! trait, key templates and a caching decorator for any source.

mod cached;
pub mod keys;
mod model;
mod service;
mod source;

#[cfg(test)]
mod testing;

pub use cached::CachedSource;
pub use model::{
    FileItem, Folder, FolderContent, Page, PageMeta, Paginated, SearchHits, SearchKind,
    SearchResults,
};
pub use service::{ExplorerService, LISTING_PAGE_SIZE, SEARCH_PAGE_SIZE};
pub use source::ExplorerSource;
