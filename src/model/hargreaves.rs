use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The unit cost shown for cash movements.
pub const NOT_APPLICABLE: &str = "n/a";

/// The description recorded for cash movements.
pub const CASH: &str = "Cash";

/// What the brokerage scrape produces.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HargreavesData {
    /// Newest first, as the brokerage lists them.
    pub transactions: Vec<HargreavesTransaction>,
    /// Stock symbol to current price in pence.
    pub holdings: BTreeMap<String, Amount>,
    pub total_value: Amount,
}

#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HargreavesTransaction {
    /// `DD/MM/YYYY`
    pub trade_date: String,
    pub settle_date: String,
    pub reference: String,
    pub description: String,
    pub unit_cost: String,
    pub quantity: String,
    pub value: String,
}

impl HargreavesTransaction {
    /// The description to record: cash movements are always recorded as `Cash`.
    pub fn ledger_description(&self) -> &str {
        if self.unit_cost.trim() == NOT_APPLICABLE {
            CASH
        } else {
            &self.description
        }
    }
}

#[test]
fn ledger_description_test() {
    let mut t = HargreavesTransaction {
        description: "Card Web Deposit".to_string(),
        unit_cost: "n/a".to_string(),
        ..Default::default()
    };
    assert_eq!(t.ledger_description(), "Cash");
    t.unit_cost = "412.30".to_string();
    assert_eq!(t.ledger_description(), "Card Web Deposit");
}
