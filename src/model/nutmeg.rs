use crate::model::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transactions in this pot never reach the ledger.
pub const UNALLOCATED_CASH: &str = "Unallocated Cash";

/// What the robo-advisor scrape produces. Transactions are in ascending date order.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NutmegData {
    pub transactions: Vec<NutmegTransaction>,
    pub net_contributions: Amount,
    pub current_value: Amount,
}

impl NutmegData {
    /// The transactions that belong in the ledger, i.e. everything outside of unallocated cash.
    pub fn ledger_transactions(&self) -> Vec<&NutmegTransaction> {
        self.transactions
            .iter()
            .filter(|t| t.pot != UNALLOCATED_CASH)
            .collect()
    }
}

#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NutmegTransaction {
    pub date: NaiveDate,
    pub transaction_type: String,
    pub pot: String,
    pub amount: Amount,
}
