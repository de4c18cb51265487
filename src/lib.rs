//! moverperfect reconciles scraped investment platform data into a spreadsheet ledger.
//!
//! Each platform's scrape becomes a normalized record (see `model`), and a per-platform reconciler
//! (see `reconcile`) appends whatever the ledger does not already hold through the `RangeStore`
//! trait.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod reconcile;
pub mod scrape;
mod utils;

pub use api::{Ledger, Mode, RangeStore};
pub use config::Config;
pub use error::Error;
pub use error::Result;
