use crate::model::Amount;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// What the pension scrape produces.
///
/// `transaction_data` holds the cells of the pension activity table, one `Vec` per row, each row
/// being `[date, description, amount]`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StandardLifeData {
    pub transaction_data: Vec<Vec<String>>,
    pub total_payments: Amount,
    pub investment_growth: Amount,
    pub total_value: Amount,
}

impl StandardLifeData {
    pub fn transactions(&self) -> Result<Vec<PensionTransaction>> {
        self.transaction_data
            .iter()
            .enumerate()
            .map(|(ix, row)| {
                PensionTransaction::from_row(row)
                    .with_context(|| format!("Unable to read pension activity row {ix}"))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PensionTransaction {
    /// `DD/MM/YYYY`
    pub date: String,
    pub description: String,
    pub amount: String,
}

impl PensionTransaction {
    fn from_row(row: &[String]) -> Result<Self> {
        let [date, description, amount] = row else {
            bail!("Expected 3 cells but found {}: {row:?}", row.len());
        };
        Ok(Self {
            date: date.trim().to_string(),
            description: description.trim().to_string(),
            amount: amount.trim().to_string(),
        })
    }
}
