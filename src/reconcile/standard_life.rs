//! Pension reconciliation.

use crate::api::RangeStore;
use crate::model::date::{format_ledger_date, is_after};
use crate::model::{PensionTransaction, StandardLifeData};
use crate::reconcile::{cells, last_recorded_date, locate_append_point, today};
use crate::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

const WORKSHEET: &str = "Standard Life";

/// Transaction rows have a description in column B. Valuation rows leave it empty.
const DESCRIPTION_COL: usize = 2;

/// Appends new pension transactions and a valuation row to the `Standard Life` worksheet. Returns
/// the number of rows written.
pub async fn reconcile(store: &mut dyn RangeStore, data: &StandardLifeData) -> Result<usize> {
    reconcile_on(store, data, today()).await
}

async fn reconcile_on(
    store: &mut dyn RangeStore,
    data: &StandardLifeData,
    today: NaiveDate,
) -> Result<usize> {
    let mut row = locate_append_point(store, WORKSHEET, "A").await?;
    let last_date = last_recorded_date(store, WORKSHEET, DESCRIPTION_COL, row).await?;
    debug!("The last recorded pension transaction is dated {last_date}");

    // The provider lists its activity newest first.
    let mut written = 0;
    for transaction in data.transactions()?.iter().rev() {
        if !is_after(&transaction.date, &last_date)? {
            continue;
        }
        store
            .write_range(WORKSHEET, &format!("A{row}:C{row}"), &transaction_row(transaction))
            .await?;
        row += 1;
        written += 1;
    }
    info!("Wrote {written} transactions to the {WORKSHEET} sheet");

    let values = valuation_row(data, &format_ledger_date(today), row);
    store
        .write_range(WORKSHEET, &format!("A{row}:G{row}"), &values)
        .await?;
    info!("Wrote the valuation to row {row} of the {WORKSHEET} sheet");
    Ok(written + 1)
}

fn transaction_row(transaction: &PensionTransaction) -> Vec<String> {
    cells([
        transaction.date.as_str(),
        transaction.description.as_str(),
        transaction.amount.as_str(),
    ])
}

fn valuation_row(data: &StandardLifeData, today: &str, r: usize) -> Vec<String> {
    vec![
        today.to_string(),
        String::new(),
        String::new(),
        data.total_payments.to_string(),
        data.investment_growth.to_string(),
        format!("=E{r}/D{r}"),
        format!("=D{r}+E{r}"),
    ]
}
