use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{TableData, TabularStore};
use crate::{AppError, AppResult};

/// In-memory store used by tests and offline runs. Tables live in a plain
/// map behind one mutex; semantics mirror the remote store, including
/// 1-based coordinates with row 1 as the header row.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, TableData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table directly, bypassing the trait surface.
    pub fn insert_table(&self, table: &str, data: TableData) {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(table.to_string(), data);
    }

    /// Snapshot of a table, if present.
    pub fn table(&self, table: &str) -> Option<TableData> {
        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(table).cloned()
    }

    fn not_found(table: &str) -> AppError {
        AppError::new("STORE/TABLE_NOT_FOUND", "Table not found")
            .with_context("table", table.to_string())
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn read_table(&self, table: &str) -> AppResult<Option<TableData>> {
        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get(table).cloned())
    }

    async fn append_row(&self, table: &str, row: &[String]) -> AppResult<()> {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let data = guard
            .get_mut(table)
            .ok_or_else(|| Self::not_found(table))?;
        data.rows.push(row.to_vec());
        Ok(())
    }

    async fn update_cell(&self, table: &str, row: u32, col: u32, value: &str) -> AppResult<()> {
        if row == 0 || col == 0 {
            return Err(AppError::new(
                "STORE/BAD_COORDINATE",
                "Row and column coordinates are 1-based",
            ));
        }
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let data = guard
            .get_mut(table)
            .ok_or_else(|| Self::not_found(table))?;
        let col = col as usize - 1;
        if row == 1 {
            if data.headers.len() <= col {
                data.headers.resize(col + 1, String::new());
            }
            data.headers[col] = value.to_string();
            return Ok(());
        }
        let idx = row as usize - 2;
        if data.rows.len() <= idx {
            data.rows.resize(idx + 1, Vec::new());
        }
        let cells = &mut data.rows[idx];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    async fn find_in_column(
        &self,
        table: &str,
        col: u32,
        needle: &str,
    ) -> AppResult<Option<u32>> {
        if col == 0 {
            return Err(AppError::new(
                "STORE/BAD_COORDINATE",
                "Row and column coordinates are 1-based",
            ));
        }
        let guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let data = guard.get(table).ok_or_else(|| Self::not_found(table))?;
        let col = col as usize - 1;
        if data.headers.get(col).map(String::as_str) == Some(needle) {
            return Ok(Some(1));
        }
        for (idx, cells) in data.rows.iter().enumerate() {
            if cells.get(col).map(String::as_str) == Some(needle) {
                return Ok(Some(idx as u32 + 2));
            }
        }
        Ok(None)
    }

    async fn delete_row(&self, table: &str, row: u32) -> AppResult<()> {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let data = guard
            .get_mut(table)
            .ok_or_else(|| Self::not_found(table))?;
        if row < 2 {
            return Err(AppError::new(
                "STORE/BAD_COORDINATE",
                "Refusing to delete the header row",
            ));
        }
        let idx = row as usize - 2;
        if idx >= data.rows.len() {
            return Err(AppError::new("STORE/ROW_OUT_OF_RANGE", "Row out of range")
                .with_context("table", table.to_string())
                .with_context("row", row.to_string()));
        }
        data.rows.remove(idx);
        Ok(())
    }

    async fn create_table(&self, table: &str, headers: &[String]) -> AppResult<()> {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if guard.contains_key(table) {
            return Err(AppError::new("STORE/TABLE_EXISTS", "Table already exists")
                .with_context("table", table.to_string()));
        }
        guard.insert(table.to_string(), TableData::new(headers.to_vec()));
        Ok(())
    }
}
