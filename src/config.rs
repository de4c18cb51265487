//! Configuration file handling for moverperfect.
//!
//! The configuration file is stored at `$MOVERPERFECT_HOME/config.json` and contains the URLs of
//! the two ledger spreadsheets, the directory that scrape snapshots are read from, and
//! authentication file paths.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "moverperfect";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SNAPSHOTS: &str = "snapshots";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$MOVERPERFECT_HOME` and from there it loads `$MOVERPERFECT_HOME/config.json`. It
/// provides paths to other items that are either configurable or are expected in a certain
/// location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
    brokerage_spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file using the sheet URLs along with default settings
    /// - Moves `secret_file` into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/moverperfect`
    /// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON needed to start the Google
    ///   OAuth workflow. This will be moved from the `secret_file` path to its default location and
    ///   name in the data directory.
    /// - `sheet_url` - The URL of the investments spreadsheet, e.g.
    ///   https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    /// - `brokerage_sheet_url` - The URL of the brokerage spreadsheet.
    ///
    /// # Errors
    /// - Returns an error if either URL is not a spreadsheet URL or if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
        brokerage_sheet_url: &str,
    ) -> Result<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();
        let brokerage_spreadsheet_id = extract_spreadsheet_id(brokerage_sheet_url)
            .context("Failed to extract spreadsheet ID from brokerage sheet URL")?
            .to_string();

        // Create the directory if it does not exist
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the moverperfect home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;
        utils::make_dir(root.join(SNAPSHOTS)).await?;

        // Move the Google OAuth client credentials file to its default location in the data dir
        utils::rename(secret_file, secrets_dir.join(CLIENT_SECRET_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            brokerage_sheet_url: brokerage_sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
            brokerage_spreadsheet_id,
        })
    }

    /// This will
    /// - validate that `home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        // Validate that the home directory exists.
        let _ = utils::read_dir(&root)
            .await
            .context("The moverperfect home directory is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();
        let brokerage_spreadsheet_id = extract_spreadsheet_id(&config_file.brokerage_sheet_url)
            .context("Failed to extract spreadsheet ID from brokerage sheet URL")?
            .to_string();

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
            brokerage_spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn brokerage_sheet_url(&self) -> &str {
        &self.config_file.brokerage_sheet_url
    }

    pub fn brokerage_spreadsheet_id(&self) -> &str {
        &self.brokerage_spreadsheet_id
    }

    /// The directory that `<platform>.json` scrape snapshots are read from.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.resolve(self.config_file.snapshot_dir())
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves the relative path.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        self.resolve(self.config_file.token_path())
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is absolute.
    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "moverperfect",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "brokerage_sheet_url": "https://docs.google.com/spreadsheets/d/3hQvW8nLpZ5tR2xKcM7bYfJ9aDs4GeU1oNiT6kXrVmPw",
///   "snapshot_dir": "snapshots",
///   "client_secret_path": ".secrets/client_secret.json",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "moverperfect"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the investments spreadsheet
    sheet_url: String,

    /// URL to the brokerage spreadsheet
    brokerage_sheet_url: String,

    /// Directory holding scrape snapshots (optional, relative to config.json or absolute)
    /// Defaults to $MOVERPERFECT_HOME/snapshots if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot_dir: Option<PathBuf>,

    /// Path to the OAuth 2.0 client credentials file (optional, relative to config.json or absolute)
    /// Defaults to $MOVERPERFECT_HOME/.secrets/client_secret.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the OAuth token file (optional, relative to config.json or absolute)
    /// Defaults to $MOVERPERFECT_HOME/.secrets/token.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            brokerage_sheet_url: String::new(),
            snapshot_dir: None,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(SNAPSHOTS))
    }

    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
///
/// # Returns
/// The spreadsheet ID or an error if the URL format is invalid. Returns an empty string if the URL is empty.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    if url.is_empty() {
        return Ok(url);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            // Remove any query parameters or fragments
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHEET_URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";
    const BROKERAGE_URL: &str = "https://docs.google.com/spreadsheets/d/BrokerageIDX#gid=0";

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("moverperfect_home");
        let secret_source_file = dir.path().join("x.txt");
        let secret_content = "12345";
        utils::write(&secret_source_file, secret_content)
            .await
            .unwrap();

        let config = Config::create(&home_dir, &secret_source_file, SHEET_URL, BROKERAGE_URL)
            .await
            .unwrap();

        assert_eq!(SHEET_URL, config.sheet_url());
        assert_eq!(
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
            config.spreadsheet_id()
        );
        assert_eq!("BrokerageIDX", config.brokerage_spreadsheet_id());

        let found_secret_content = utils::read(&config.client_secret_path()).await.unwrap();
        assert_eq!(secret_content, found_secret_content);
        assert!(!secret_source_file.exists());
        assert!(config.secrets().is_dir());
        assert!(config.snapshot_dir().is_dir());
    }

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let secret_file = dir.path().join("foo.json");
        utils::write(&secret_file, "{}").await.unwrap();
        let created = Config::create(dir.path(), &secret_file, SHEET_URL, BROKERAGE_URL)
            .await
            .unwrap();

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.config_file, loaded.config_file);
        assert_eq!(loaded.brokerage_sheet_url(), BROKERAGE_URL);
        assert_eq!(loaded.token_path(), loaded.root().join(".secrets/token.json"));
        assert_eq!(loaded.config_path(), loaded.root().join("config.json"));
    }

    #[tokio::test]
    async fn test_config_create_bad_url_leaves_secret() {
        let dir = TempDir::new().unwrap();
        let secret_file = dir.path().join("foo.json");
        utils::write(&secret_file, "{}").await.unwrap();
        let home = dir.path().join("home");
        let result =
            Config::create(&home, &secret_file, SHEET_URL, "https://example.com/nope").await;
        assert!(result.is_err());
        assert!(secret_file.is_file());
        assert!(!home.exists());
    }

    #[tokio::test]
    async fn test_config_load_missing() {
        let dir = TempDir::new().unwrap();
        let error = Config::load(dir.path()).await.unwrap_err();
        assert!(error.to_string().contains("The config file is missing"));
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.sheet_url, "");
        assert_eq!(config.snapshot_dir(), PathBuf::from(SNAPSHOTS));
        assert_eq!(
            config.client_secret_path(),
            PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON)
        );
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "moverperfect",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/minimal",
            "brokerage_sheet_url": "https://docs.google.com/spreadsheets/d/broker",
            "snapshot_dir": "/var/lib/scrapes"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.sheet_url, "https://docs.google.com/spreadsheets/d/minimal");
        assert_eq!(config.snapshot_dir(), PathBuf::from("/var/lib/scrapes"));
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "sheet_url": "https://docs.google.com/spreadsheets/d/test",
            "brokerage_sheet_url": ""
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("snapshot_dir"));
        assert!(!json.contains("client_secret_path"));
        assert!(!json.contains("token_path"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        let id = extract_spreadsheet_id(SHEET_URL).unwrap();
        assert_eq!(id, "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL");

        let url = "https://docs.google.com/spreadsheets/d/ABC123?foo=bar";
        assert_eq!(extract_spreadsheet_id(url).unwrap(), "ABC123");
        assert_eq!(extract_spreadsheet_id(BROKERAGE_URL).unwrap(), "BrokerageIDX");

        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert_eq!(extract_spreadsheet_id("").unwrap(), "");
    }
}
