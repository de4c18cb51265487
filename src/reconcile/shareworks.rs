//! Share-purchase reconciliation.
//!
//! The `Shareworks` worksheet interleaves two kinds of rows: purchase rows, which carry a reference
//! in column C, and summary rows, which leave column C empty. Each run appends the new purchases
//! followed by one summary row whose formulas chain from the previous summary row (the anchor).

use crate::api::RangeStore;
use crate::model::date::{format_ledger_date, is_after};
use crate::model::{Purchase, ShareWorksData, NOT_APPLICABLE};
use crate::reconcile::{
    cells, last_recorded_date, locate_append_point, today, FIRST_DATA_ROW, HEADER_ROW,
};
use crate::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

const WORKSHEET: &str = "Shareworks";
const REFERENCE: &str = "ESPP Purchase";

/// Column C holds the purchase reference.
const REFERENCE_COL: usize = 3;

/// Appends new purchases and a summary row to the `Shareworks` worksheet. Returns the number of
/// rows written.
pub async fn reconcile(store: &mut dyn RangeStore, data: &ShareWorksData) -> Result<usize> {
    reconcile_on(store, data, today()).await
}

async fn reconcile_on(
    store: &mut dyn RangeStore,
    data: &ShareWorksData,
    today: NaiveDate,
) -> Result<usize> {
    let mut row = locate_append_point(store, WORKSHEET, "A").await?;
    let last_date = last_recorded_date(store, WORKSHEET, REFERENCE_COL, row).await?;
    debug!("The last recorded purchase is dated {last_date}");

    let mut purchases = data.purchases()?;
    purchases.reverse();

    // Each purchase appears twice in the activity statement, so only every other row is visited,
    // oldest first.
    let mut written = 0;
    for ix in (0..purchases.len()).rev().step_by(2) {
        let purchase = &purchases[ix];
        if !is_after(&purchase.date, &last_date)? {
            continue;
        }
        let values = purchase_row(purchase, data.exchange_rate());
        store
            .write_range(WORKSHEET, &format!("A{row}:M{row}"), &values)
            .await?;
        row += 1;
        written += 1;
    }
    info!("Wrote {written} purchases to the {WORKSHEET} sheet");

    let anchor = find_anchor(store, row).await?;
    let values = summary_row(data, &format_ledger_date(today), row, anchor);
    store
        .write_range(WORKSHEET, &format!("A{row}:M{row}"), &values)
        .await?;
    info!("Wrote the summary to row {row} of the {WORKSHEET} sheet, anchored on row {anchor}");
    Ok(written + 1)
}

/// The nearest row above `row` whose reference cell is empty, i.e. the previous summary row.
/// Falls back to the header row when there is none.
async fn find_anchor(store: &mut dyn RangeStore, row: usize) -> Result<usize> {
    if row <= FIRST_DATA_ROW {
        return Ok(HEADER_ROW);
    }
    let references = store
        .read_range(WORKSHEET, &format!("C{FIRST_DATA_ROW}:C{}", row - 1))
        .await?;
    Ok(references
        .iter()
        .rposition(|r| r.is_empty())
        .map(|offset| FIRST_DATA_ROW + offset)
        .unwrap_or(HEADER_ROW))
}

fn purchase_row(purchase: &Purchase, exchange_rate: &str) -> Vec<String> {
    let mut values = cells([
        purchase.date.as_str(),
        purchase.date.as_str(),
        REFERENCE,
        purchase.price.as_str(),
    ]);
    values.push(format!("={exchange_rate}*2"));
    values.push(purchase.price.clone());
    values.push(format!("={}*2", purchase.quantity));
    values.push(String::new());
    values.extend(vec![NOT_APPLICABLE.to_string(); 5]);
    values
}

/// The 13 cells of the summary row at `s`, chained from the summary row at `a`.
fn summary_row(data: &ShareWorksData, today: &str, s: usize, a: usize) -> Vec<String> {
    vec![
        today.to_string(),
        today.to_string(),
        String::new(),
        data.current_value.to_string(),
        data.exchange_rate().to_string(),
        price_per_share(s),
        data.total_shares().to_string(),
        currency_weight(s),
        holding_value(s),
        cumulative_return(s, a),
        per_share_return(s),
        employer_return(s, a),
        blended_total(s),
    ]
}

/// The value of the holdings bought between the anchor and the summary row, or `0` if there are
/// no rows between them.
fn purchases_since(s: usize, a: usize) -> String {
    if a + 1 == s {
        return "0".to_string();
    }
    let (first, last) = (a + 1, s - 1);
    format!("SUM(ARRAYFORMULA(G{first}:G{last} * F{first}:F{last}))")
}

fn price_per_share(s: usize) -> String {
    format!("=IF(G{s}=0,0,D{s} / G{s})")
}

fn currency_weight(s: usize) -> String {
    format!("=IF(E{s}=0,0,1 / E{s})")
}

fn holding_value(s: usize) -> String {
    format!("=G{s} * F{s}")
}

fn cumulative_return(s: usize, a: usize) -> String {
    let sum = purchases_since(s, a);
    format!("=IF(H{s}=0,0,J{a} + ((G{s} * F{s}) - (G{a} * F{a}) - ({sum})) * H{s})")
}

fn per_share_return(s: usize) -> String {
    format!("=IF(G{s}=0,0,J{s} / G{s})")
}

fn employer_return(s: usize, a: usize) -> String {
    let sum = purchases_since(s, a);
    format!("=IF(H{s}=0,0,L{a} + (({sum}) / 2) * H{s})")
}

fn blended_total(s: usize) -> String {
    format!("=J{s} + L{s}")
}
