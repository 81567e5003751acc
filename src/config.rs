//! Runtime configuration
//!
//! Defaults cover the public endpoints and the SPY benchmark. Alpaca keys come
//! from an optional JSON credentials file (`CLIENT_ID` / `CLIENT_SECRET`) and
//! environment variables override everything.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_INDEX_PROXY: &str = "SPY";
pub const DEFAULT_HORIZON_DAYS: i64 = 365;
pub const DEFAULT_ALPACA_DATA_URL: &str = "https://data.alpaca.markets";
pub const DEFAULT_PUSHSHIFT_URL: &str = "https://api.pushshift.io";
pub const DEFAULT_DATA_DIR: &str = "stock_info/data";

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(rename = "CLIENT_ID")]
    client_id: String,
    #[serde(rename = "CLIENT_SECRET")]
    client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub alpaca_key_id: String,
    pub alpaca_secret_key: String,
    pub alpaca_data_url: String,
    pub pushshift_url: String,
    pub data_dir: PathBuf,
    pub index_proxy: String,
    pub horizon_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpaca_key_id: String::new(),
            alpaca_secret_key: String::new(),
            alpaca_data_url: DEFAULT_ALPACA_DATA_URL.to_string(),
            pushshift_url: DEFAULT_PUSHSHIFT_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            index_proxy: DEFAULT_INDEX_PROXY.to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl Config {
    /// Defaults, then the credentials file if given, then the process env.
    pub fn load(credentials: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();
        if let Some(path) = credentials {
            config.apply_credentials_file(path)?;
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_credentials_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let creds: Credentials = serde_json::from_str(&contents)?;
        self.alpaca_key_id = creds.client_id;
        self.alpaca_secret_key = creds.client_secret;
        Ok(())
    }

    /// Apply overrides from `lookup`, normally `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APCA_API_KEY_ID") {
            self.alpaca_key_id = v;
        }
        if let Some(v) = lookup("APCA_API_SECRET_KEY") {
            self.alpaca_secret_key = v;
        }
        if let Some(v) = lookup("APCA_DATA_URL") {
            self.alpaca_data_url = v;
        }
        if let Some(v) = lookup("PUSHSHIFT_URL") {
            self.pushshift_url = v;
        }
        if let Some(v) = lookup("REDDIT_PICKS_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
    }

    /// Alpaca refuses unauthenticated data requests, so fail early.
    pub fn require_alpaca_keys(&self) -> Result<()> {
        if self.alpaca_key_id.is_empty() || self.alpaca_secret_key.is_empty() {
            return Err(Error::Config(
                "Alpaca keys missing: pass --credentials or set APCA_API_KEY_ID and \
                 APCA_API_SECRET_KEY"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index_proxy, "SPY");
        assert_eq!(config.horizon_days, 365);
        assert!(config.require_alpaca_keys().is_err());
    }

    #[test]
    fn test_credentials_then_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"CLIENT_ID": "file-id", "CLIENT_SECRET": "file-secret"}}"#).unwrap();

        let mut config = Config::default();
        config.apply_credentials_file(file.path()).unwrap();
        assert_eq!(config.alpaca_key_id, "file-id");

        let env: HashMap<&str, &str> = [
            ("APCA_API_KEY_ID", "env-id"),
            ("REDDIT_PICKS_DATA_DIR", "/tmp/picks"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.alpaca_key_id, "env-id");
        assert_eq!(config.alpaca_secret_key, "file-secret");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/picks"));
        assert!(config.require_alpaca_keys().is_ok());
    }

    #[test]
    fn test_missing_credentials_file() {
        let mut config = Config::default();
        let err = config.apply_credentials_file(Path::new("/nonexistent/creds.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
