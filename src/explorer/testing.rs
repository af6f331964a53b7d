//! In-memory source and cache builders shared by the explorer tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::cache::{Backend, Cache, FileCache, RedisCache};
use crate::config::{FileCacheConfig, RedisConfig};
use crate::explorer::{ExplorerSource, FileItem, Folder, Paginated};

pub async fn file_cache(dir: &TempDir) -> Cache {
    let store = FileCache::open(&FileCacheConfig {
        dir: dir.path().to_path_buf(),
        sweep_interval: Duration::from_secs(3600),
    })
    .await
    .unwrap();
    Cache::new(Backend::File(store))
}

pub fn unreachable_redis_cache() -> Cache {
    let store = RedisCache::new(RedisConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout: Duration::from_millis(200),
        command_timeout: Duration::from_millis(200),
        max_retries: 0,
        ..RedisConfig::default()
    })
    .unwrap();
    Cache::new(Backend::Redis(store))
}

/// Fixed folder tree that counts how often each query runs.
pub struct FakeSource {
    folders: Vec<Folder>,
    files: Vec<FileItem>,
    fail: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeSource {
    pub fn sample() -> Self {
        let folders = vec![
            folder("root-a", "Documents", None),
            folder("root-b", "Pictures", None),
            folder("child-a1", "Reports", Some("root-a")),
            folder("child-a2", "Invoices", Some("root-a")),
        ];
        let files = vec![
            file("file-1", "report.pdf", "root-a"),
            file("file-2", "notes.txt", "root-a"),
            file("file-3", "holiday.png", "root-b"),
        ];

        Self {
            folders,
            files,
            fail: false,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::sample()
        }
    }

    pub fn calls(&self, query: &str) -> usize {
        self.calls.lock().unwrap().get(query).copied().unwrap_or(0)
    }

    fn record(&self, query: &'static str) -> anyhow::Result<()> {
        *self.calls.lock().unwrap().entry(query).or_insert(0) += 1;
        if self.fail {
            bail!("database unavailable");
        }
        Ok(())
    }
}

fn folder(id: &str, name: &str, parent: Option<&str>) -> Folder {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Folder {
        id: id.to_string(),
        name: name.to_string(),
        path: format!("/{name}"),
        parent_id: parent.map(str::to_string),
        created_at: at,
        updated_at: at,
    }
}

fn file(id: &str, name: &str, folder_id: &str) -> FileItem {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    FileItem {
        id: id.to_string(),
        name: name.to_string(),
        size: 1024,
        mime_type: "application/octet-stream".to_string(),
        path: format!("/{folder_id}/{name}"),
        folder_id: folder_id.to_string(),
        created_at: at,
        updated_at: at,
    }
}

fn paginate<T: Clone>(rows: Vec<T>, page: u32, limit: u32) -> Paginated<T> {
    let total = rows.len() as u64;
    let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    Paginated {
        data: rows.into_iter().skip(skip).take(limit as usize).collect(),
        total,
        page,
        limit,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ExplorerSource for FakeSource {
    async fn root_folders(&self, page: u32, limit: u32) -> anyhow::Result<Paginated<Folder>> {
        self.record("root_folders")?;
        let rows = self
            .folders
            .iter()
            .filter(|f| f.parent_id.is_none())
            .cloned()
            .collect();
        Ok(paginate(rows, page, limit))
    }

    async fn child_folders(
        &self,
        parent_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>> {
        self.record("child_folders")?;
        let rows = self
            .folders
            .iter()
            .filter(|f| f.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        Ok(paginate(rows, page, limit))
    }

    async fn folder_files(
        &self,
        folder_id: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>> {
        self.record("folder_files")?;
        let rows = self
            .files
            .iter()
            .filter(|f| f.folder_id == folder_id)
            .cloned()
            .collect();
        Ok(paginate(rows, page, limit))
    }

    async fn find_folder(&self, id: &str) -> anyhow::Result<Option<Folder>> {
        self.record("find_folder")?;
        Ok(self.folders.iter().find(|f| f.id == id).cloned())
    }

    async fn search_folders(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<Folder>> {
        self.record("search_folders")?;
        let rows = self
            .folders
            .iter()
            .filter(|f| contains_ignore_case(&f.name, query))
            .cloned()
            .collect();
        Ok(paginate(rows, page, limit))
    }

    async fn search_files(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> anyhow::Result<Paginated<FileItem>> {
        self.record("search_files")?;
        let rows = self
            .files
            .iter()
            .filter(|f| contains_ignore_case(&f.name, query))
            .cloned()
            .collect();
        Ok(paginate(rows, page, limit))
    }
}
