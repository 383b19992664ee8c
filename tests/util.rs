#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use cockpit_lib::repo::Repo;
use cockpit_lib::schema;
use cockpit_lib::store::{MemoryStore, StoreHandle, TableData, TabularStore};
use cockpit_lib::AppResult;

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

pub fn table(headers: &[&str], rows: &[&[&str]]) -> TableData {
    TableData {
        headers: row(headers),
        rows: rows.iter().map(|r| row(r)).collect(),
    }
}

/// Memory store pre-seeded with every table the application provisions,
/// headers only.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (name, headers) in schema::ALL_TABLES {
        store.insert_table(name, table(headers, &[]));
    }
    store
}

pub fn seeded_repo() -> (Arc<MemoryStore>, Repo) {
    let store = seeded_store();
    let repo = Repo::new(StoreHandle::new(store.clone()));
    (store, repo)
}

/// Store wrapper that counts full-table reads, for cache assertions.
pub struct CountingStore {
    inner: Arc<MemoryStore>,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        CountingStore {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabularStore for CountingStore {
    async fn read_table(&self, table: &str) -> AppResult<Option<TableData>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_table(table).await
    }

    async fn append_row(&self, table: &str, row: &[String]) -> AppResult<()> {
        self.inner.append_row(table, row).await
    }

    async fn update_cell(&self, table: &str, row: u32, col: u32, value: &str) -> AppResult<()> {
        self.inner.update_cell(table, row, col, value).await
    }

    async fn find_in_column(
        &self,
        table: &str,
        col: u32,
        needle: &str,
    ) -> AppResult<Option<u32>> {
        self.inner.find_in_column(table, col, needle).await
    }

    async fn delete_row(&self, table: &str, row: u32) -> AppResult<()> {
        self.inner.delete_row(table, row).await
    }

    async fn create_table(&self, table: &str, headers: &[String]) -> AppResult<()> {
        self.inner.create_table(table, headers).await
    }
}
