//! Types that represent the core data model: the normalized records each platform scrape produces,
//! and the cell, date and money types the ledger is written with.
mod amount;
pub mod cell;
pub mod date;
mod hargreaves;
mod nutmeg;
mod shareworks;
mod standard_life;

pub use amount::{Amount, AmountFormat, PLAIN_FORMAT};
pub use cell::{CellRef, DimensionMismatch, RangeRef};
pub use hargreaves::{HargreavesData, HargreavesTransaction, CASH, NOT_APPLICABLE};
pub use nutmeg::{NutmegData, NutmegTransaction, UNALLOCATED_CASH};
use serde::{Deserialize, Serialize};
pub use shareworks::{Purchase, ShareWorksData, SOURCE_DATE_FORMAT, YOU_BOUGHT};
pub use standard_life::{PensionTransaction, StandardLifeData};

/// The investment platforms that are scraped and reconciled, in the order they are processed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// The robo-advisor.
    Nutmeg,
    /// The employee share-purchase portal.
    Shareworks,
    /// The pension provider.
    StandardLife,
    /// The brokerage.
    Hargreaves,
}

serde_plain::derive_display_from_serialize!(Platform);
serde_plain::derive_fromstr_from_deserialize!(Platform);

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Nutmeg,
        Platform::Shareworks,
        Platform::StandardLife,
        Platform::Hargreaves,
    ];
}

#[test]
fn platform_display_test() {
    assert_eq!(Platform::StandardLife.to_string(), "standard-life");
    assert_eq!(
        "hargreaves".parse::<Platform>().unwrap(),
        Platform::Hargreaves
    );
}
