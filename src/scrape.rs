//! The boundary between the browser automation and the reconcilers.
//!
//! Browser automation is not part of this program. Each platform's scrape is exported as JSON to
//! `<snapshot_dir>/<platform>.json`, and a `Scraper` turns it into that platform's record. Scraping
//! never fails from the caller's point of view: a failed scrape is logged and the record's
//! `Default` value, with no transactions and zero totals, is returned in its place.

use crate::model::Platform;
use crate::{utils, Result};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Produces the normalized record for one platform.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    /// The normalized record. Its `Default` value is the fallback used when scraping fails.
    type Record: Default + Send;

    fn platform(&self) -> Platform;

    /// Scrapes the platform, returning any error to the caller.
    async fn try_scrape(&self) -> Result<Self::Record>;

    /// Scrapes the platform. On failure the error is logged and the fallback record is returned.
    async fn scrape(&self) -> Self::Record {
        match self.try_scrape().await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    "Unable to scrape {}, continuing with an empty record: {e:#}",
                    self.platform()
                );
                Self::Record::default()
            }
        }
    }
}

/// Reads the record of `platform` from a JSON snapshot in `dir`.
#[derive(Debug, Clone)]
pub struct SnapshotScraper<R> {
    platform: Platform,
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> SnapshotScraper<R> {
    pub fn new(platform: Platform, dir: impl AsRef<Path>) -> Self {
        Self {
            platform,
            path: snapshot_path(dir.as_ref(), platform),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl<R> Scraper for SnapshotScraper<R>
where
    R: DeserializeOwned + Default + Debug + Send,
{
    type Record = R;

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn try_scrape(&self) -> Result<R> {
        let record: R = utils::deserialize(&self.path)
            .await
            .with_context(|| format!("Unable to load the {} snapshot", self.platform))?;
        debug!("Loaded {}: {record:?}", self.path.display());
        Ok(record)
    }
}

/// `<dir>/<platform>.json`, e.g. `snapshots/standard-life.json`.
pub fn snapshot_path(dir: &Path, platform: Platform) -> PathBuf {
    dir.join(format!("{platform}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HargreavesData, NutmegData, ShareWorksData, StandardLifeData};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_scraper_reads_record() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "transactions": [
                {
                    "date": "2024-03-11",
                    "transaction_type": "Contribution",
                    "pot": "Rainy Day",
                    "amount": "£50.00"
                }
            ],
            "net_contributions": "£1,200.00",
            "current_value": "£1,264.31"
        }"#;
        utils::write(dir.path().join("nutmeg.json"), json)
            .await
            .unwrap();

        let scraper = SnapshotScraper::<NutmegData>::new(Platform::Nutmeg, dir.path());
        let data = scraper.scrape().await;
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.transactions[0].pot, "Rainy Day");
        assert_eq!(data.current_value.to_string(), "£1,264.31");
    }

    #[tokio::test]
    async fn test_missing_snapshot_falls_back() {
        let dir = TempDir::new().unwrap();
        let scraper = SnapshotScraper::<ShareWorksData>::new(Platform::Shareworks, dir.path());
        assert!(scraper.try_scrape().await.is_err());
        let data = scraper.scrape().await;
        assert_eq!(data, ShareWorksData::default());
        assert_eq!(data.exchange_rate(), "0");
    }

    #[tokio::test]
    async fn test_malformed_snapshot_falls_back() {
        let dir = TempDir::new().unwrap();
        utils::write(dir.path().join("hargreaves.json"), "{ \"transactions\": 7 }")
            .await
            .unwrap();
        let scraper = SnapshotScraper::<HargreavesData>::new(Platform::Hargreaves, dir.path());
        let data = scraper.scrape().await;
        assert!(data.transactions.is_empty());
        assert!(data.total_value.is_zero());
    }

    #[test]
    fn test_snapshot_path() {
        let scraper = SnapshotScraper::<StandardLifeData>::new(
            Platform::StandardLife,
            Path::new("/tmp/snapshots"),
        );
        assert_eq!(
            scraper.path(),
            Path::new("/tmp/snapshots/standard-life.json")
        );
    }
}
