use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using the sheet URLs along with default settings
/// - Moves `secret_file` into its default location in the data dir.
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/moverperfect`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON needed to start the Google
///   OAuth workflow.
/// - `sheet_url` - The URL of the investments spreadsheet.
/// - `brokerage_sheet_url` - The URL of the brokerage spreadsheet.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    home: &Path,
    secret_file: &Path,
    sheet_url: &str,
    brokerage_sheet_url: &str,
) -> Result<Out<()>> {
    let config = Config::create(home, secret_file, sheet_url, brokerage_sheet_url)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the moverperfect directory and config at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("client_secret.json");
        utils::write(&secret, "{}").await.unwrap();
        let out = init(
            &dir.path().join("home"),
            &secret,
            "https://docs.google.com/spreadsheets/d/A",
            "https://docs.google.com/spreadsheets/d/B",
        )
        .await
        .unwrap();
        assert!(out.message().starts_with("Successfully created"));
        assert!(dir.path().join("home/config.json").is_file());
    }
}
