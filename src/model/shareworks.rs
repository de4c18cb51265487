use crate::model::{date, Amount};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// The only activity rows we record.
pub const YOU_BOUGHT: &str = "You bought";

/// The date format used in the share-purchase activity statement, e.g. `15-Mar-2024`.
pub const SOURCE_DATE_FORMAT: &str = "%d-%b-%Y";

// Cell positions within an activity statement row.
const DATE: usize = 0;
const ACTION: usize = 1;
const QUANTITY: usize = 3;
const PRICE: usize = 4;

/// What the share-purchase scrape produces.
///
/// `transaction_data` holds the cells of the activity statement table, one `Vec` per row, in the
/// order the statement lists them (ascending by date).
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ShareWorksData {
    pub transaction_data: Vec<Vec<String>>,
    /// As displayed, e.g. `1.2678 USD`.
    pub exchange_rate: String,
    pub current_value: Amount,
    pub total_shares: String,
}

impl ShareWorksData {
    /// The numeric part of the displayed exchange rate, `0` if there is none.
    pub fn exchange_rate(&self) -> &str {
        self.exchange_rate.split_whitespace().next().unwrap_or("0")
    }

    /// The share count, `0` if there is none.
    pub fn total_shares(&self) -> &str {
        match self.total_shares.trim() {
            "" => "0",
            s => s,
        }
    }

    /// The `You bought` rows, in statement order, with their dates converted to ledger dates.
    pub fn purchases(&self) -> Result<Vec<Purchase>> {
        self.transaction_data
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(ACTION).map(|s| s.trim()) == Some(YOU_BOUGHT))
            .map(|(ix, row)| {
                Purchase::from_row(row)
                    .with_context(|| format!("Unable to read activity row {ix}: {row:?}"))
            })
            .collect()
    }
}

/// A single share purchase.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Purchase {
    /// `DD/MM/YYYY`
    pub date: String,
    pub price: String,
    pub quantity: String,
}

impl Purchase {
    fn from_row(row: &[String]) -> Result<Self> {
        let cell = |ix: usize, name: &str| {
            row.get(ix)
                .map(|s| s.trim().to_string())
                .with_context(|| format!("The row has no {name} cell"))
        };
        Ok(Self {
            date: date::reformat(&cell(DATE, "date")?, SOURCE_DATE_FORMAT)?,
            price: cell(PRICE, "price")?,
            quantity: cell(QUANTITY, "quantity")?,
        })
    }
}
