//! Cache key templates for browsing results.
//!
//! The cache treats these as opaque strings; the layout only matters for
//! invalidation patterns such as `search:*` or `folder:<id>:*`.

use crate::cache::KeyPattern;
use crate::error::Result;
use crate::explorer::SearchKind;

/// A single folder looked up by id.
pub fn folder(id: &str) -> String {
    format!("folder:{id}")
}

/// Files of a folder, one page.
pub fn folder_content(id: &str, page: u32) -> String {
    format!("folder:{id}:content:{page}")
}

/// Sub-folders of a folder, one page.
pub fn folder_children(id: &str, page: u32) -> String {
    format!("folder:{id}:children:{page}")
}

pub fn root_folders(page: u32) -> String {
    format!("folders:root:{page}")
}

pub fn file(id: &str) -> String {
    format!("file:{id}")
}

pub fn search(kind: SearchKind, query: &str, page: u32) -> String {
    format!("search:{kind}:{query}:{page}")
}

/// Listings cached under one folder (`folder:<id>:...`). The folder itself
/// lives at [`folder`]. The id is matched literally.
pub fn folder_scope(id: &str) -> Result<KeyPattern> {
    KeyPattern::prefix(&format!("folder:{id}:"))
}

pub fn search_pattern() -> &'static str {
    "search:*"
}
