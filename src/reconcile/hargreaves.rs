//! Brokerage reconciliation. The brokerage has a spreadsheet of its own with a `Transactions`
//! worksheet and a `Portfolio` worksheet.

use crate::api::RangeStore;
use crate::model::date::is_after;
use crate::model::{Amount, HargreavesData, HargreavesTransaction, PLAIN_FORMAT};
use crate::reconcile::{cells, locate_append_point};
use crate::Result;
use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{debug, error, info};

const TRANSACTIONS: &str = "Transactions";
const PORTFOLIO: &str = "Portfolio";

/// The symbols of the tracked holdings.
const SYMBOLS: &str = "E3:E10";

/// The prices of the tracked holdings, in pounds, alongside `SYMBOLS`.
const PRICES: &str = "D3:D10";

/// The portfolio total the spreadsheet computes from `PRICES`.
const TOTAL: &str = "D11";

/// Appends new transactions to the `Transactions` worksheet, then refreshes the holding prices on
/// the `Portfolio` worksheet and checks its total against the scraped one. Returns the number of
/// transaction rows written.
pub async fn reconcile(store: &mut dyn RangeStore, data: &HargreavesData) -> Result<usize> {
    let written = append_transactions(store, data).await?;
    update_prices(store, data).await?;
    check_total(store, data).await?;
    Ok(written)
}

async fn append_transactions(store: &mut dyn RangeStore, data: &HargreavesData) -> Result<usize> {
    let mut row = locate_append_point(store, TRANSACTIONS, "A").await?;
    let previous = row.saturating_sub(1).max(1);
    let last_date = store
        .read_cell(TRANSACTIONS, &format!("A{previous}"))
        .await?
        .with_context(|| format!("There is no date above row {row} of the {TRANSACTIONS} sheet"))?;
    debug!("The last recorded brokerage transaction is dated {last_date}");

    // The brokerage lists transactions newest first.
    let mut written = 0;
    for transaction in data.transactions.iter().rev() {
        if !is_after(&transaction.trade_date, &last_date)? {
            continue;
        }
        store
            .write_range(TRANSACTIONS, &format!("A{row}:G{row}"), &transaction_row(transaction))
            .await?;
        row += 1;
        written += 1;
    }
    info!("Wrote {written} transactions to the {TRANSACTIONS} sheet");
    Ok(written)
}

fn transaction_row(transaction: &HargreavesTransaction) -> Vec<String> {
    cells([
        transaction.trade_date.as_str(),
        transaction.settle_date.as_str(),
        transaction.reference.as_str(),
        transaction.ledger_description(),
        transaction.unit_cost.as_str(),
        transaction.quantity.as_str(),
        transaction.value.as_str(),
    ])
}

/// Overwrites the price of each tracked holding with its scraped price. A symbol the brokerage
/// did not report, such as an `Unused` placeholder, gets a price of 0.
async fn update_prices(store: &mut dyn RangeStore, data: &HargreavesData) -> Result<()> {
    let symbols = store.read_range(PORTFOLIO, SYMBOLS).await?;
    let prices: Vec<String> = symbols
        .iter()
        .map(|symbol| price(data, symbol).to_string())
        .collect();
    store.write_range(PORTFOLIO, PRICES, &prices).await?;
    info!("Updated the prices of {} holdings", data.holdings.len());
    Ok(())
}

fn price(data: &HargreavesData, symbol: &str) -> Amount {
    match data.holdings.get(symbol.trim()) {
        Some(pence) => pence.pence_to_pounds(),
        None => Amount::new_with_format(Decimal::ZERO, PLAIN_FORMAT),
    }
}

/// Logs an error if the spreadsheet total disagrees with the scraped total. This is never fatal.
async fn check_total(store: &mut dyn RangeStore, data: &HargreavesData) -> Result<()> {
    let sheet_total = store.read_cell(PORTFOLIO, TOTAL).await?.unwrap_or_default();
    match sheet_total.parse::<Amount>() {
        Ok(total) if total.value() == data.total_value.value() => {
            debug!("The {PORTFOLIO} total matches the brokerage total of {}", data.total_value)
        }
        _ => error!(
            "The {PORTFOLIO} total of '{sheet_total}' does not match the brokerage total of {}",
            data.total_value
        ),
    }
    Ok(())
}
