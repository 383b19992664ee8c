use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::store::{AuthMethod, SheetsStore, StoreHandle};
use crate::{AppError, AppResult};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "COCKPIT_CONFIG";

/// Structured secret bundle: store credentials plus the target document.
/// Any missing or malformed required field is fatal at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub spreadsheet: SpreadsheetConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetConfig {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Endpoint override, used by tests pointing at a local stand-in.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl AppConfig {
    /// Resolve the config path: explicit argument, then `COCKPIT_CONFIG`,
    /// then `cockpit/cockpit.toml` under the user config directory.
    pub fn resolve_path(explicit: Option<PathBuf>) -> AppResult<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let base = dirs::config_dir().ok_or_else(|| {
            AppError::new("CONFIG/NO_HOME", "Failed to resolve the user config directory")
        })?;
        Ok(base.join("cockpit").join("cockpit.toml"))
    }

    pub fn load(path: &Path) -> AppResult<AppConfig> {
        let raw = fs::read_to_string(path).map_err(|err| {
            AppError::from(err)
                .with_context("operation", "read_config")
                .with_context("path", path.display().to_string())
        })?;
        let config: AppConfig = toml::from_str(&raw)
            .map_err(|err| AppError::from(err).with_context("path", path.display().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.spreadsheet.id.trim().is_empty() {
            return Err(AppError::new(
                "CONFIG/SPREADSHEET_ID",
                "spreadsheet.id must not be empty",
            ));
        }
        let has_bearer = self
            .auth
            .bearer_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        let has_key = self
            .auth
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_bearer && !has_key {
            return Err(AppError::new(
                "CONFIG/AUTH",
                "auth.bearer_token or auth.api_key is required",
            ));
        }
        Ok(())
    }

    fn auth_method(&self) -> AuthMethod {
        if let Some(token) = self
            .auth
            .bearer_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            return AuthMethod::bearer(token.trim());
        }
        if let Some(key) = self.auth.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return AuthMethod::api_key(key.trim());
        }
        AuthMethod::None
    }

    /// Build the store handle this config describes.
    pub fn store_handle(&self) -> AppResult<StoreHandle> {
        let auth = self.auth_method();
        let store = match self.store.endpoint.as_deref() {
            Some(endpoint) => {
                SheetsStore::with_endpoint(endpoint, self.spreadsheet.id.trim(), auth)?
            }
            None => SheetsStore::new(self.spreadsheet.id.trim(), auth)?,
        };
        Ok(StoreHandle::sheets(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp config");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_a_minimal_config() {
        let file = write_config(
            "[spreadsheet]\nid = \"sheet-123\"\n\n[auth]\nbearer_token = \"tok\"\n",
        );
        let config = AppConfig::load(file.path()).expect("config loads");
        assert_eq!(config.spreadsheet.id, "sheet-123");
        assert!(matches!(config.auth_method(), AuthMethod::Bearer(_)));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = AppConfig::load(Path::new("/nonexistent/cockpit.toml")).unwrap_err();
        assert!(err.code().starts_with("IO/"));
    }

    #[test]
    fn malformed_toml_is_fatal() {
        let file = write_config("[spreadsheet\nid = ");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG/PARSE");
    }

    #[test]
    fn blank_spreadsheet_id_is_rejected() {
        let file = write_config("[spreadsheet]\nid = \"  \"\n\n[auth]\napi_key = \"k\"\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG/SPREADSHEET_ID");
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let file = write_config("[spreadsheet]\nid = \"sheet-123\"\n\n[auth]\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG/AUTH");
    }

    #[test]
    fn bearer_token_wins_over_api_key() {
        let file = write_config(
            "[spreadsheet]\nid = \"s\"\n\n[auth]\nbearer_token = \"tok\"\napi_key = \"k\"\n",
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert!(matches!(config.auth_method(), AuthMethod::Bearer(_)));
    }
}
