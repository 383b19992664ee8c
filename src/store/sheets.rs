use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use url::Url;

use super::{TableData, TabularStore};
use crate::{AppError, AppResult};

const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com";

/// Reads hitting the store's request-rate ceiling are retried this many
/// times with a linearly increasing pause. Writes are never retried:
/// an append is not idempotent and a replay would duplicate the row.
const READ_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(700);

/// How credentials reach the store. The credential itself is supplied
/// externally; minting tokens is out of scope.
#[derive(Debug, Clone, Default)]
pub enum AuthMethod {
    /// OAuth bearer token (`Authorization: Bearer <token>`).
    Bearer(String),
    /// API key passed as the `key` query parameter.
    ApiKey(String),
    #[default]
    None,
}

impl AuthMethod {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(key.into())
    }

    fn headers(&self) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let AuthMethod::Bearer(token) = self {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
                AppError::new("STORE/AUTH_HEADER", "Credential is not a valid header value")
                    .with_cause(AppError::from(err.to_string()))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn apply_query(&self, url: &mut Url) {
        if let AuthMethod::ApiKey(key) = self {
            url.query_pairs_mut().append_pair("key", key);
        }
    }
}

/// Remote tabular store backed by the Google Sheets v4 REST API.
pub struct SheetsStore {
    http: reqwest::Client,
    endpoint: Url,
    spreadsheet_id: String,
    auth: AuthMethod,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: impl Into<String>, auth: AuthMethod) -> AppResult<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, spreadsheet_id, auth)
    }

    pub fn with_endpoint(
        endpoint: &str,
        spreadsheet_id: impl Into<String>,
        auth: AuthMethod,
    ) -> AppResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            AppError::new("STORE/ENDPOINT", "Invalid store endpoint")
                .with_context("endpoint", endpoint.to_string())
                .with_cause(AppError::from(err.to_string()))
        })?;
        Ok(SheetsStore {
            http: reqwest::Client::new(),
            endpoint,
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        })
    }

    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::new("STORE/ENDPOINT", "Store endpoint cannot carry a path")
            })?;
            path.push("v4");
            path.push("spreadsheets");
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn values_url(&self, range: &str) -> AppResult<Url> {
        self.url(&[&self.spreadsheet_id, "values", range])
    }

    async fn send(&self, method: Method, mut url: Url, body: Option<Value>) -> AppResult<Value> {
        self.auth.apply_query(&mut url);
        let retryable_read = method == Method::GET;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .headers(self.auth.headers()?);
            if let Some(body) = &body {
                request = request.json(body);
            }
            let response = request.send().await.map_err(AppError::from)?;
            let status = response.status();

            if status.is_success() {
                return response.json::<Value>().await.map_err(AppError::from);
            }

            if status == StatusCode::TOO_MANY_REQUESTS && retryable_read
                && attempt < READ_ATTEMPTS
            {
                let pause = BACKOFF_STEP * attempt;
                tracing::warn!(
                    target: "cockpit",
                    event = "store_rate_limited",
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    url = %url
                );
                tokio::time::sleep(pause).await;
                continue;
            }

            let body_text = response.text().await.unwrap_or_default();
            let code = if status == StatusCode::TOO_MANY_REQUESTS {
                "STORE/RATE_LIMITED"
            } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                "STORE/AUTH"
            } else if status == StatusCode::NOT_FOUND {
                "STORE/NOT_FOUND"
            } else if status == StatusCode::BAD_REQUEST {
                "STORE/BAD_REQUEST"
            } else {
                "STORE/HTTP_STATUS"
            };
            return Err(AppError::new(code, "Store request failed")
                .with_context("status", status.as_u16().to_string())
                .with_context("url", url.to_string())
                .with_context("body", truncate_body(&body_text)));
        }
    }

    /// Numeric sheet id for a title, needed by structural batch updates.
    async fn sheet_id(&self, table: &str) -> AppResult<Option<i64>> {
        let mut url = self.url(&[&self.spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties");
        let value = self.send(Method::GET, url, None).await?;
        let sheets = value
            .get("sheets")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for sheet in sheets {
            let props = sheet.get("properties");
            let title = props
                .and_then(|p| p.get("title"))
                .and_then(Value::as_str);
            if title == Some(table) {
                return Ok(props
                    .and_then(|p| p.get("sheetId"))
                    .and_then(Value::as_i64));
            }
        }
        Ok(None)
    }

    async fn batch_update(&self, request: Value) -> AppResult<Value> {
        // The API exposes batchUpdate as a verb suffix on the spreadsheet id.
        let verb = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.url(&[&verb])?;
        self.send(Method::POST, url, Some(request)).await
    }

    fn parse_values(value: &Value) -> TableData {
        let mut grid: Vec<Vec<String>> = value
            .get("values")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| {
                                cells.iter().map(cell_to_string).collect::<Vec<String>>()
                            })
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        if grid.is_empty() {
            return TableData::default();
        }
        let headers = grid.remove(0);
        TableData {
            headers,
            rows: grid,
        }
    }
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

/// 1-based column index to its A1 letter ("A", "Z", "AA", ...).
fn column_letter(col: u32) -> String {
    debug_assert!(col >= 1);
    let mut col = col;
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[async_trait]
impl TabularStore for SheetsStore {
    async fn read_table(&self, table: &str) -> AppResult<Option<TableData>> {
        let url = self.values_url(table)?;
        match self.send(Method::GET, url, None).await {
            Ok(value) => Ok(Some(Self::parse_values(&value))),
            // Reading a range on a sheet that does not exist comes back as
            // a range-parse rejection, which callers treat as "no table".
            Err(err) if err.code() == "STORE/BAD_REQUEST" || err.code() == "STORE/NOT_FOUND" => {
                Ok(None)
            }
            Err(err) => Err(err.with_context("table", table.to_string())),
        }
    }

    async fn append_row(&self, table: &str, row: &[String]) -> AppResult<()> {
        let verb = format!("{table}:append");
        let mut url = self.values_url(&verb)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "values": [row] });
        self.send(Method::POST, url, Some(body))
            .await
            .map_err(|err| err.with_context("table", table.to_string()))?;
        Ok(())
    }

    async fn update_cell(&self, table: &str, row: u32, col: u32, value: &str) -> AppResult<()> {
        if row == 0 || col == 0 {
            return Err(AppError::new(
                "STORE/BAD_COORDINATE",
                "Row and column coordinates are 1-based",
            ));
        }
        let range = format!("{table}!{}{row}", column_letter(col));
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "values": [[value]] });
        self.send(Method::PUT, url, Some(body))
            .await
            .map_err(|err| err.with_context("range", range.clone()))?;
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
        let letter = column_letter(col);
        let range = format!("{table}!{letter}:{letter}");
        let url = self.values_url(&range)?;
        let value = self
            .send(Method::GET, url, None)
            .await
            .map_err(|err| err.with_context("range", range.clone()))?;
        let rows = value
            .get("values")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for (idx, row) in rows.iter().enumerate() {
            let cell = row
                .as_array()
                .and_then(|cells| cells.first())
                .map(cell_to_string)
                .unwrap_or_default();
            if cell == needle {
                return Ok(Some(idx as u32 + 1));
            }
        }
        Ok(None)
    }

    async fn delete_row(&self, table: &str, row: u32) -> AppResult<()> {
        if row < 2 {
            return Err(AppError::new(
                "STORE/BAD_COORDINATE",
                "Refusing to delete the header row",
            ));
        }
        let sheet_id = self.sheet_id(table).await?.ok_or_else(|| {
            AppError::new("STORE/TABLE_NOT_FOUND", "Table not found")
                .with_context("table", table.to_string())
        })?;
        let request = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": row - 1,
                        "endIndex": row,
                    }
                }
            }]
        });
        self.batch_update(request)
            .await
            .map_err(|err| err.with_context("table", table.to_string()))?;
        Ok(())
    }

    async fn create_table(&self, table: &str, headers: &[String]) -> AppResult<()> {
        let request = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": table,
                        "gridProperties": {
                            "rowCount": 1000,
                            "columnCount": headers.len().max(1),
                        }
                    }
                }
            }]
        });
        self.batch_update(request)
            .await
            .map_err(|err| err.with_context("table", table.to_string()))?;

        let range = format!("{table}!A1");
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "values": [headers] });
        self.send(Method::PUT, url, Some(body))
            .await
            .map_err(|err| err.with_context("table", table.to_string()))?;
        Ok(())
    }
}
