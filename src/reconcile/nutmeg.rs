//! Robo-advisor reconciliation: the transaction ledger and the monthly summary.

use crate::api::RangeStore;
use crate::model::date::format_ledger_date;
use crate::model::{NutmegData, NutmegTransaction};
use crate::reconcile::{cells, locate_append_point};
use crate::Result;
use tracing::{debug, info};

const LEDGER: &str = "Nutmeg";
const MONTHLY: &str = "Monthly";

/// Appends new transactions to the `Nutmeg` worksheet and a summary row to the `Monthly`
/// worksheet. Returns the number of rows written.
///
/// New transactions are found by anchoring on the date in the last written row: the newest
/// scraped transaction with that date is the anchor, and everything after it that does not share
/// its date is new. When no scraped transaction matches, nothing is written to the ledger.
pub async fn reconcile(store: &mut dyn RangeStore, data: &NutmegData) -> Result<usize> {
    let mut written = 0;
    let mut row = locate_append_point(store, LEDGER, "A").await?;
    let transactions = data.ledger_transactions();
    let previous = match row {
        1 => None,
        _ => store.read_cell(LEDGER, &format!("A{}", row - 1)).await?,
    };

    match previous.as_deref().and_then(|p| anchor(&transactions, p)) {
        Some(ix) => {
            let anchor_date = format_ledger_date(transactions[ix].date);
            for transaction in &transactions[ix..] {
                if format_ledger_date(transaction.date) == anchor_date {
                    continue;
                }
                store
                    .write_range(LEDGER, &format!("A{row}:F{row}"), &ledger_row(transaction, row))
                    .await?;
                row += 1;
                written += 1;
            }
        }
        None => debug!("No scraped transaction matches the last ledger date {previous:?}"),
    }
    info!("Wrote {written} transactions to the {LEDGER} sheet");

    let row = locate_append_point(store, MONTHLY, "H").await?;
    let summary = cells([
        data.net_contributions.to_string(),
        data.current_value.to_string(),
    ]);
    store
        .write_range(MONTHLY, &format!("H{row}:I{row}"), &summary)
        .await?;
    info!("Wrote the monthly summary to row {row} of the {MONTHLY} sheet");
    Ok(written + 1)
}

/// The index of the newest transaction dated `previous`.
fn anchor(transactions: &[&NutmegTransaction], previous: &str) -> Option<usize> {
    transactions
        .iter()
        .rposition(|t| format_ledger_date(t.date) == previous.trim())
}

fn ledger_row(transaction: &NutmegTransaction, row: usize) -> Vec<String> {
    cells([
        format_ledger_date(transaction.date),
        transaction.transaction_type.clone(),
        transaction.pot.clone(),
        transaction.amount.to_string(),
        String::new(),
        running_total(row),
    ])
}

/// The running total carries the previous row's total forward.
fn running_total(row: usize) -> String {
    format!("=F{}+D{row}", row - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestSheet;
    use crate::model::UNALLOCATED_CASH;
    use chrono::NaiveDate;

    fn tx(day: u32, pot: &str, amount: &str) -> NutmegTransaction {
        NutmegTransaction {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            transaction_type: "Contribution".to_string(),
            pot: pot.to_string(),
            amount: amount.parse().unwrap(),
        }
    }

    fn sheet(last_date: &str) -> TestSheet {
        let mut sheet = TestSheet::default();
        sheet.put(
            LEDGER,
            vec![
                vec!["Date", "Type", "Pot", "Amount", "", "Running Total"],
                vec!["01/03/2024", "Contribution", "Rainy Day", "100.00", "", "=D2"],
                vec![last_date, "Contribution", "Rainy Day", "100.00", "", "=F2+D3"],
            ],
        );
        sheet.put(MONTHLY, vec![vec!["Month", "", "", "", "", "", "", "Net", "Value"]]);
        sheet
    }

    fn data(transactions: Vec<NutmegTransaction>) -> NutmegData {
        NutmegData {
            transactions,
            net_contributions: "£1,200.00".parse().unwrap(),
            current_value: "£1,264.31".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_appends_after_anchor() {
        let mut sheet = sheet("10/03/2024");
        let data = data(vec![
            tx(10, "Rainy Day", "100.00"),
            tx(11, "Rainy Day", "50.00"),
            tx(12, "House", "75.00"),
        ]);
        let written = reconcile(&mut sheet, &data).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(
            sheet.row(LEDGER, 4),
            vec!["11/03/2024", "Contribution", "Rainy Day", "50.00", "", "=F3+D4"]
        );
        assert_eq!(
            sheet.row(LEDGER, 5),
            vec!["12/03/2024", "Contribution", "House", "75.00", "", "=F4+D5"]
        );
        assert_eq!(sheet.row_count(LEDGER), 5);
        assert_eq!(sheet.cell(MONTHLY, 2, 8), "£1,200.00");
        assert_eq!(sheet.cell(MONTHLY, 2, 9), "£1,264.31");
    }

    #[tokio::test]
    async fn test_is_idempotent() {
        let mut sheet = sheet("10/03/2024");
        let data = data(vec![tx(10, "Rainy Day", "100.00"), tx(11, "Rainy Day", "50.00")]);
        reconcile(&mut sheet, &data).await.unwrap();
        let ledger_rows = sheet.row_count(LEDGER);

        let written = reconcile(&mut sheet, &data).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(sheet.row_count(LEDGER), ledger_rows);
        assert_eq!(sheet.row_count(MONTHLY), 3);
    }

    #[tokio::test]
    async fn test_skips_transactions_sharing_the_anchor_date() {
        let mut sheet = sheet("10/03/2024");
        let data = data(vec![
            tx(9, "Rainy Day", "10.00"),
            tx(10, "Rainy Day", "20.00"),
            tx(10, "House", "30.00"),
            tx(11, "House", "40.00"),
        ]);
        reconcile(&mut sheet, &data).await.unwrap();
        assert_eq!(sheet.row_count(LEDGER), 4);
        assert_eq!(sheet.cell(LEDGER, 4, 1), "11/03/2024");
    }

    #[tokio::test]
    async fn test_unallocated_cash_is_never_written() {
        let mut sheet = sheet("10/03/2024");
        let data = data(vec![
            tx(10, "Rainy Day", "100.00"),
            tx(11, UNALLOCATED_CASH, "5.00"),
            tx(12, "Rainy Day", "50.00"),
            tx(13, UNALLOCATED_CASH, "6.00"),
        ]);
        reconcile(&mut sheet, &data).await.unwrap();
        assert_eq!(sheet.row_count(LEDGER), 4);
        assert_eq!(sheet.cell(LEDGER, 4, 1), "12/03/2024");
        assert_eq!(sheet.cell(LEDGER, 4, 3), "Rainy Day");
    }

    #[tokio::test]
    async fn test_no_anchor_writes_only_the_summary() {
        let mut sheet = sheet("02/03/2024");
        let data = data(vec![tx(10, "Rainy Day", "100.00"), tx(11, "Rainy Day", "50.00")]);
        let written = reconcile(&mut sheet, &data).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(sheet.row_count(LEDGER), 3);
        assert_eq!(sheet.row_count(MONTHLY), 2);
    }

    #[tokio::test]
    async fn test_existing_rows_are_untouched() {
        let mut sheet = sheet("10/03/2024");
        let before: Vec<_> = (1..=3).map(|r| sheet.row(LEDGER, r)).collect();
        let data = data(vec![tx(10, "Rainy Day", "100.00"), tx(12, "Rainy Day", "50.00")]);
        reconcile(&mut sheet, &data).await.unwrap();
        let after: Vec<_> = (1..=3).map(|r| sheet.row(LEDGER, r)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_running_total() {
        assert_eq!(running_total(7), "=F6+D7");
    }
}
