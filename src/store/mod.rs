use std::sync::Arc;

use async_trait::async_trait;

use crate::AppResult;

pub mod cache;
pub mod memory;
pub mod sheets;

pub use cache::ReadCache;
pub use memory::MemoryStore;
pub use sheets::{AuthMethod, SheetsStore};

/// One table as the store hands it back: the header row plus data rows.
/// Short rows are not padded here; the repo layer normalises row length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>) -> Self {
        TableData {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// The seam between the data-access layer and the remote tabular store.
///
/// Row and column coordinates are 1-based, matching the store's native
/// addressing; row 1 is the header row.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Full-table read. `Ok(None)` means the named table does not exist,
    /// which callers treat as "no data", not an error.
    async fn read_table(&self, table: &str) -> AppResult<Option<TableData>>;

    /// Append one positional row after the last non-empty row.
    async fn append_row(&self, table: &str, row: &[String]) -> AppResult<()>;

    /// Overwrite a single cell.
    async fn update_cell(&self, table: &str, row: u32, col: u32, value: &str) -> AppResult<()>;

    /// First row whose cell in `col` equals `needle`, string-compared.
    async fn find_in_column(&self, table: &str, col: u32, needle: &str)
        -> AppResult<Option<u32>>;

    /// Remove one row entirely, shifting the rows below it up.
    async fn delete_row(&self, table: &str, row: u32) -> AppResult<()>;

    /// Create the table with the given header row. Fails if it exists.
    async fn create_table(&self, table: &str, headers: &[String]) -> AppResult<()>;
}

/// Cloneable handle over the store implementation in use.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<dyn TabularStore>,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { inner: store }
    }

    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(MemoryStore::default()),
        }
    }

    pub fn sheets(store: SheetsStore) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl std::ops::Deref for StoreHandle {
    type Target = dyn TabularStore;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}
