//! Access to the spreadsheet ledger.
//!
//! Reconcilers only see the `RangeStore` trait: a named-worksheet, A1-addressed cell store. It is
//! implemented by `GoogleSheet` for real runs and by `TestSheet`, an in-memory store, for tests
//! and for running the whole program without touching Google Sheets.

mod files;
mod oauth;
mod sheet;
mod test_sheet;

use crate::model::{CellRef, RangeRef};
use crate::{Config, Result};
use sheet::GoogleSheet;
use tracing::trace;

pub(crate) use oauth::TokenProvider;
pub(crate) use test_sheet::TestSheet;

// OAuth scopes required for Sheets API access. drive.readonly is the default scope the sheets
// crate requests for some calls, so we ask for it too.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// When this environment variable is set and non-empty, `Mode::Test` is used.
const TEST_MODE_ENV: &str = "MOVERPERFECT_IN_TEST_MODE";

/// Whether we are talking to Google Sheets or to in-memory test data.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Google,
    Test,
}

impl Mode {
    /// Returns `Mode::Test` if `MOVERPERFECT_IN_TEST_MODE` is set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// The two spreadsheets that make up the ledger.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Ledger {
    /// Holds the robo-advisor, share-purchase and pension worksheets.
    Investments,
    /// The brokerage has a spreadsheet of its own.
    Brokerage,
}

/// A worksheet-addressed cell store. Values are the formatted text of each cell and an empty cell
/// is the empty string.
///
/// Implementors only provide `read_range` and `write_rows`. The provided methods build on those
/// and, in the case of `write_range`, validate input before anything is written.
#[async_trait::async_trait]
pub trait RangeStore: Send {
    /// Reads the cells of `range` (e.g. `A1:C3`) in row-major order. The result always covers the
    /// whole rectangle, with `""` for empty cells.
    async fn read_range(&mut self, worksheet: &str, range: &str) -> Result<Vec<String>>;

    /// Writes `rows` to `range`. The caller guarantees that `rows` matches the range dimensions.
    /// Values are entered as if typed by a user, so formulas are evaluated.
    async fn write_rows(&mut self, worksheet: &str, range: &str, rows: Vec<Vec<String>>)
        -> Result<()>;

    /// Reads a single cell. Returns `None` if the cell is empty.
    async fn read_cell(&mut self, worksheet: &str, address: &str) -> Result<Option<String>> {
        let cell: CellRef = address.parse()?;
        let values = self.read_range(worksheet, &cell.to_string()).await?;
        Ok(values.into_iter().next().filter(|v| !v.is_empty()))
    }

    /// Writes a single cell.
    async fn write_cell(&mut self, worksheet: &str, address: &str, value: &str) -> Result<()> {
        self.write_range(worksheet, address, &[value.to_string()])
            .await
    }

    /// Writes row-major `values` to `range`. Fails with a `DimensionMismatch` error, without
    /// writing anything, if `values` does not fill `range` exactly.
    async fn write_range(&mut self, worksheet: &str, range: &str, values: &[String]) -> Result<()> {
        let parsed: RangeRef = range.parse()?;
        let rows = parsed.shape(values)?;
        trace!("write_range {worksheet}!{parsed} {rows:?}");
        self.write_rows(worksheet, &parsed.to_string(), rows).await
    }
}

/// Creates the store for `ledger`. In `Mode::Google` a `TokenProvider` is required.
pub(crate) async fn store(
    config: &Config,
    ledger: Ledger,
    mode: Mode,
    token_provider: Option<TokenProvider>,
) -> Result<Box<dyn RangeStore>> {
    match mode {
        Mode::Google => {
            let token_provider = token_provider.ok_or_else(|| {
                anyhow::anyhow!("An OAuth token provider is required to use Google Sheets")
            })?;
            let spreadsheet_id = match ledger {
                Ledger::Investments => config.spreadsheet_id(),
                Ledger::Brokerage => config.brokerage_spreadsheet_id(),
            };
            Ok(Box::new(
                GoogleSheet::new(spreadsheet_id, token_provider).await?,
            ))
        }
        Mode::Test => Ok(Box::new(TestSheet::seeded(ledger))),
    }
}
