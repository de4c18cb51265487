//! Merges freshly scraped records into the ledger.
//!
//! Each platform has its own module exposing `reconcile(store, data)`. The ledger is append-only:
//! a reconciler finds the first empty row of its worksheet, works out which scraped records are
//! newer than what is already recorded, and writes those below it.

mod hargreaves;
mod nutmeg;
mod shareworks;
mod standard_life;

use crate::api::RangeStore;
use crate::model::cell::column_letters;
use crate::model::date::EPOCH;
use crate::Result;
use chrono::{Local, NaiveDate};
use tracing::trace;

pub use hargreaves::reconcile as reconcile_hargreaves;
pub use nutmeg::reconcile as reconcile_nutmeg;
pub use shareworks::reconcile as reconcile_shareworks;
pub use standard_life::reconcile as reconcile_standard_life;

/// The number of rows read per request while looking for the append point.
pub const BLOCK_SIZE: usize = 100;

/// Every ledger worksheet has a single header row.
pub const HEADER_ROW: usize = 1;

/// The first row that can hold a record.
pub const FIRST_DATA_ROW: usize = HEADER_ROW + 1;

/// Reads `{column}{start_row}:{column}{end_row}` and returns the row number of the first empty
/// cell, or `None` if every cell in the window has a value.
pub async fn find_empty_row(
    store: &mut dyn RangeStore,
    worksheet: &str,
    column: &str,
    start_row: usize,
    end_row: usize,
) -> Result<Option<usize>> {
    let range = format!("{column}{start_row}:{column}{end_row}");
    let values = store.read_range(worksheet, &range).await?;
    Ok(values
        .iter()
        .position(|v| v.is_empty())
        .map(|offset| start_row + offset))
}

/// Returns the first empty row of `column`, searching windows of `BLOCK_SIZE` rows starting at
/// row 1.
///
/// There is no upper bound. A worksheet whose column never has an empty cell keeps this searching.
pub async fn locate_append_point(
    store: &mut dyn RangeStore,
    worksheet: &str,
    column: &str,
) -> Result<usize> {
    let mut start_row = 1;
    loop {
        let end_row = start_row + BLOCK_SIZE - 1;
        if let Some(row) = find_empty_row(store, worksheet, column, start_row, end_row).await? {
            trace!("The append point of {worksheet}!{column} is row {row}");
            return Ok(row);
        }
        start_row = end_row + 1;
    }
}

/// Returns the column A date of the nearest row above `append_row` whose `marker_col` cell has a
/// value. Rows with an empty marker are summary rows and are passed over. Returns `EPOCH` when no
/// such row exists.
pub(crate) async fn last_recorded_date(
    store: &mut dyn RangeStore,
    worksheet: &str,
    marker_col: usize,
    append_row: usize,
) -> Result<String> {
    if append_row <= FIRST_DATA_ROW {
        return Ok(EPOCH.to_string());
    }
    let range = format!(
        "A{FIRST_DATA_ROW}:{}{}",
        column_letters(marker_col),
        append_row - 1
    );
    let values = store.read_range(worksheet, &range).await?;
    let found = values
        .chunks(marker_col)
        .rev()
        .find(|row| row.last().is_some_and(|marker| !marker.is_empty()))
        .and_then(|row| row.first())
        .filter(|date| !date.is_empty());
    Ok(found.cloned().unwrap_or_else(|| EPOCH.to_string()))
}

/// Today's date in the local timezone.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Converts `values` into owned cells.
pub(crate) fn cells<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;

    fn column_a(filled: usize) -> TestSheet {
        let mut sheet = TestSheet::default();
        sheet.put("S", (0..filled).map(|i| vec![format!("v{i}")]).collect());
        sheet
    }

    #[tokio::test]
    async fn test_find_empty_row() {
        let mut sheet = column_a(3);
        assert_eq!(find_empty_row(&mut sheet, "S", "A", 1, 100).await.unwrap(), Some(4));
        assert_eq!(find_empty_row(&mut sheet, "S", "A", 1, 3).await.unwrap(), None);
        assert_eq!(find_empty_row(&mut sheet, "S", "A", 2, 5).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_locate_append_point_first_window() {
        let mut sheet = column_a(41);
        assert_eq!(locate_append_point(&mut sheet, "S", "A").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_locate_append_point_pages() {
        let mut sheet = column_a(100);
        assert_eq!(locate_append_point(&mut sheet, "S", "A").await.unwrap(), 101);
        let mut sheet = column_a(250);
        assert_eq!(locate_append_point(&mut sheet, "S", "A").await.unwrap(), 251);
    }

    #[tokio::test]
    async fn test_locate_append_point_other_column() {
        let mut sheet = TestSheet::default();
        sheet.put(
            "S",
            vec![
                vec!["a", "", "", "", "", "", "", "h"],
                vec!["a", "", "", "", "", "", "", "h"],
                vec!["a"],
            ],
        );
        assert_eq!(locate_append_point(&mut sheet, "S", "H").await.unwrap(), 3);
        assert_eq!(locate_append_point(&mut sheet, "S", "A").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_last_recorded_date_skips_summary_rows() {
        let mut sheet = TestSheet::default();
        sheet.put(
            "S",
            vec![
                vec!["Date", "Settled", "Reference"],
                vec!["01/02/2024", "01/02/2024", "ESPP Purchase"],
                vec!["15/02/2024", "15/02/2024", "ESPP Purchase"],
                vec!["29/02/2024", "29/02/2024", ""],
            ],
        );
        let last = last_recorded_date(&mut sheet, "S", 3, 5).await.unwrap();
        assert_eq!(last, "15/02/2024");
    }

    #[tokio::test]
    async fn test_last_recorded_date_defaults_to_epoch() {
        let mut sheet = TestSheet::default();
        sheet.put("S", vec![vec!["Date", "Description"], vec!["30/09/2025", ""]]);
        assert_eq!(last_recorded_date(&mut sheet, "S", 2, 3).await.unwrap(), EPOCH);
        assert_eq!(last_recorded_date(&mut sheet, "S", 2, 2).await.unwrap(), EPOCH);
    }
}
