//! The `moverperfect run` command: scrape then reconcile each platform in turn.

use crate::api::{self, Ledger, Mode, RangeStore, TokenProvider};
use crate::commands::Out;
use crate::model::{HargreavesData, NutmegData, Platform, ShareWorksData, StandardLifeData};
use crate::reconcile;
use crate::scrape::{Scraper, SnapshotScraper};
use crate::{Config, Result};
use anyhow::{bail, Context};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info};

/// What happened to each platform during a run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    outcomes: Vec<PlatformOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub rows_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn outcomes(&self) -> &[PlatformOutcome] {
        &self.outcomes
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.rows_written).sum()
    }

    pub fn failed(&self) -> Vec<Platform> {
        self.outcomes
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.platform)
            .collect()
    }

    fn push(&mut self, platform: Platform, result: Result<usize>) {
        let outcome = match result {
            Ok(rows_written) => {
                info!("Reconciled {platform}, {rows_written} rows written");
                PlatformOutcome {
                    platform,
                    rows_written,
                    error: None,
                }
            }
            Err(e) => {
                error!("Unable to reconcile {platform}: {e:#}");
                PlatformOutcome {
                    platform,
                    rows_written: 0,
                    error: Some(format!("{e:#}")),
                }
            }
        };
        self.outcomes.push(outcome);
    }
}

/// Scrapes and reconciles `platforms`, one after the other. A platform that fails to reconcile
/// does not stop the ones after it, but the run as a whole returns an error naming it.
pub async fn run(config: Config, mode: Mode, platforms: &[Platform]) -> Result<Out<RunSummary>> {
    let token_provider = match mode {
        Mode::Google => Some(
            TokenProvider::load(config.client_secret_path(), config.token_path())
                .await
                .context("Unable to load the OAuth tokens, you may need to run 'moverperfect auth'")?,
        ),
        Mode::Test => None,
    };
    let mut investments =
        api::store(&config, Ledger::Investments, mode, token_provider.clone()).await?;
    let mut brokerage = api::store(&config, Ledger::Brokerage, mode, token_provider).await?;

    let summary = reconcile_all(
        investments.as_mut(),
        brokerage.as_mut(),
        &config.snapshot_dir(),
        platforms,
    )
    .await;

    let failed = summary.failed();
    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(|p| p.to_string()).collect();
        bail!("Reconciliation failed for: {}", names.join(", "));
    }
    Ok(Out::new(
        format!(
            "Reconciled {} platforms, {} rows written",
            platforms.len(),
            summary.rows_written()
        ),
        summary,
    ))
}

async fn reconcile_all(
    investments: &mut dyn RangeStore,
    brokerage: &mut dyn RangeStore,
    snapshot_dir: &Path,
    platforms: &[Platform],
) -> RunSummary {
    let mut summary = RunSummary::default();
    for &platform in platforms {
        info!("Reconciling {platform}");
        let result = match platform {
            Platform::Nutmeg => {
                let data = SnapshotScraper::<NutmegData>::new(platform, snapshot_dir)
                    .scrape()
                    .await;
                reconcile::reconcile_nutmeg(investments, &data).await
            }
            Platform::Shareworks => {
                let data = SnapshotScraper::<ShareWorksData>::new(platform, snapshot_dir)
                    .scrape()
                    .await;
                reconcile::reconcile_shareworks(investments, &data).await
            }
            Platform::StandardLife => {
                let data = SnapshotScraper::<StandardLifeData>::new(platform, snapshot_dir)
                    .scrape()
                    .await;
                reconcile::reconcile_standard_life(investments, &data).await
            }
            Platform::Hargreaves => {
                let data = SnapshotScraper::<HargreavesData>::new(platform, snapshot_dir)
                    .scrape()
                    .await;
                reconcile::reconcile_hargreaves(brokerage, &data).await
            }
        };
        summary.push(platform, result);
    }
    summary
}
