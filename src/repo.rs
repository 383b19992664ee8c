use std::collections::HashMap;
use std::time::Duration;

use crate::model::NewActivity;
use crate::schema;
use crate::store::{ReadCache, StoreHandle, TableData};
use crate::time::now_jst_string;
use crate::{AppError, AppResult};

/// One data row as a field-name-to-value map keyed by the header row.
pub type Record = HashMap<String, String>;

/// Data access layer over the remote tabular store.
///
/// All reads go through a TTL cache keyed by table name; every mutation
/// invalidates the whole cache on success. Transport failures surface as
/// errors rather than empty results, so `Ok(vec![])` always means the
/// table is genuinely empty or absent.
pub struct Repo {
    store: StoreHandle,
    cache: ReadCache,
}

impl Repo {
    pub fn new(store: StoreHandle) -> Self {
        Repo {
            store,
            cache: ReadCache::default(),
        }
    }

    pub fn with_cache_ttl(store: StoreHandle, ttl: Duration) -> Self {
        Repo {
            store,
            cache: ReadCache::new(ttl),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// All data rows of `table` as header-keyed records. An absent table
    /// reads as an empty sequence. Rows shorter than the header are padded
    /// with empty strings; surplus cells are dropped.
    pub async fn get_records(&self, table: &str) -> AppResult<Vec<Record>> {
        if let Some(cached) = self.cache.get(table) {
            return Ok(cached.as_ref().clone());
        }

        let data = self
            .store
            .read_table(table)
            .await
            .map_err(|err| err.with_context("operation", "get_records"))?;
        let records = match data {
            Some(data) => records_from_table(&data),
            None => Vec::new(),
        };
        let shared = self.cache.put(table, records);
        Ok(shared.as_ref().clone())
    }

    /// Drop every cached read. Mutations through this repo already
    /// invalidate; call this before a read that must observe a write made
    /// outside the process.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Append one row of header-ordered values.
    pub async fn add_row(&self, table: &str, row: &[String]) -> AppResult<()> {
        self.store.append_row(table, row).await.map_err(|err| {
            err.with_context("operation", "add_row")
                .with_context("table", table.to_string())
        })?;
        self.cache.clear();
        Ok(())
    }

    /// Write a single field of the row whose id column equals `id`.
    ///
    /// The field name resolves against the current header row before any
    /// write happens, so an unknown field or an absent id leaves the store
    /// untouched.
    pub async fn update_cell_by_id(
        &self,
        table: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> AppResult<()> {
        let data = self
            .store
            .read_table(table)
            .await
            .map_err(|err| err.with_context("operation", "update_cell_by_id"))?
            .ok_or_else(|| {
                AppError::new("REPO/TABLE_NOT_FOUND", "Table not found")
                    .with_context("table", table.to_string())
            })?;

        let col = data
            .headers
            .iter()
            .position(|h| h == field)
            .ok_or_else(|| {
                AppError::new("REPO/UNKNOWN_FIELD", "Field not present in header row")
                    .with_context("table", table.to_string())
                    .with_context("field", field.to_string())
            })? as u32
            + 1;

        let row = self
            .store
            .find_in_column(table, 1, id)
            .await
            .map_err(|err| err.with_context("operation", "update_cell_by_id"))?
            .ok_or_else(|| {
                AppError::new("REPO/ID_NOT_FOUND", "No row with the given id")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })?;

        self.store
            .update_cell(table, row, col, value)
            .await
            .map_err(|err| {
                err.with_context("operation", "update_cell_by_id")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })?;
        self.cache.clear();
        Ok(())
    }

    /// Next id for a table: max of the integer-parsable `id` fields plus
    /// one, or 1 when there are none. Advisory only; two writers racing
    /// this can allocate the same id (single-user deployment assumption).
    pub async fn get_next_id(&self, table: &str) -> AppResult<u64> {
        let records = self.get_records(table).await?;
        let max = records
            .iter()
            .filter_map(|r| r.get("id"))
            .filter_map(|id| id.trim().parse::<u64>().ok())
            .max();
        Ok(max.map_or(1, |m| m + 1))
    }

    /// Hard-delete the row whose id column equals `id`.
    pub async fn delete_row_by_id(&self, table: &str, id: &str) -> AppResult<()> {
        let row = self
            .store
            .find_in_column(table, 1, id)
            .await
            .map_err(|err| err.with_context("operation", "delete_row_by_id"))?
            .ok_or_else(|| {
                AppError::new("REPO/ID_NOT_FOUND", "No row with the given id")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })?;
        self.store.delete_row(table, row).await.map_err(|err| {
            err.with_context("operation", "delete_row_by_id")
                .with_context("table", table.to_string())
        })?;
        self.cache.clear();
        Ok(())
    }

    /// Idempotent table provisioning.
    ///
    /// Creates the table with the header row when it is missing, writes
    /// headers onto a blank first row, rewrites headers in place when they
    /// differ but the column counts match, and refuses to touch a table
    /// whose column count differs (existing data wins).
    pub async fn ensure_sheet_exists(&self, table: &str, headers: &[&str]) -> AppResult<()> {
        let wanted: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let data = self
            .store
            .read_table(table)
            .await
            .map_err(|err| err.with_context("operation", "ensure_sheet_exists"))?;

        match data {
            None => {
                self.store.create_table(table, &wanted).await.map_err(|err| {
                    err.with_context("operation", "ensure_sheet_exists")
                        .with_context("table", table.to_string())
                })?;
                self.cache.clear();
                tracing::info!(target: "cockpit", event = "sheet_created", table);
            }
            Some(existing) if existing.headers.is_empty() => {
                for (idx, header) in wanted.iter().enumerate() {
                    self.store
                        .update_cell(table, 1, idx as u32 + 1, header)
                        .await
                        .map_err(|err| {
                            err.with_context("operation", "ensure_sheet_exists")
                                .with_context("table", table.to_string())
                        })?;
                }
                self.cache.clear();
            }
            Some(existing) if existing.headers == wanted => {}
            Some(existing) if existing.headers.len() == wanted.len() => {
                for (idx, header) in wanted.iter().enumerate() {
                    if existing.headers.get(idx) != Some(header) {
                        self.store
                            .update_cell(table, 1, idx as u32 + 1, header)
                            .await
                            .map_err(|err| {
                                err.with_context("operation", "ensure_sheet_exists")
                                    .with_context("table", table.to_string())
                            })?;
                    }
                }
                self.cache.clear();
                tracing::info!(target: "cockpit", event = "sheet_headers_rewritten", table);
            }
            Some(existing) => {
                // Column counts differ: rewriting would misalign existing
                // data, so leave the table alone.
                tracing::warn!(
                    target: "cockpit",
                    event = "sheet_header_mismatch_skipped",
                    table,
                    existing = existing.headers.len(),
                    wanted = wanted.len()
                );
            }
        }
        Ok(())
    }

    /// Append one entry to the append-only activity log, provisioning the
    /// sheet on first use.
    pub async fn log_activity(&self, activity: NewActivity) -> AppResult<()> {
        self.ensure_sheet_exists(schema::ACTIVITY_HISTORY, schema::ACTIVITY_HEADERS)
            .await?;
        let id = self.get_next_id(schema::ACTIVITY_HISTORY).await?;
        let row = vec![
            id.to_string(),
            activity.action_type,
            activity.entity_type,
            activity.entity_id,
            activity.entity_name,
            activity.old_value,
            activity.new_value,
            activity.details,
            now_jst_string(),
        ];
        self.add_row(schema::ACTIVITY_HISTORY, &row).await
    }

    /// Append a project comment snapshot. The sheet exists for external
    /// spreadsheet consumers; the activity log is the primary record.
    pub async fn log_project_comment(
        &self,
        project_id: &str,
        theme: &str,
        memo: &str,
        updated_at: &str,
    ) -> AppResult<()> {
        self.ensure_sheet_exists(
            schema::PROJECT_COMMENTS_HISTORY,
            schema::PROJECT_COMMENT_HEADERS,
        )
        .await?;
        let id = self.get_next_id(schema::PROJECT_COMMENTS_HISTORY).await?;
        let row = vec![
            id.to_string(),
            project_id.to_string(),
            theme.to_string(),
            memo.to_string(),
            updated_at.to_string(),
        ];
        self.add_row(schema::PROJECT_COMMENTS_HISTORY, &row).await
    }
}

fn records_from_table(data: &TableData) -> Vec<Record> {
    data.rows
        .iter()
        .map(|row| {
            data.headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    (header.clone(), row.get(idx).cloned().unwrap_or_default())
                })
                .collect()
        })
        .collect()
}
