//! Implements the `RangeStore` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{Ledger, RangeStore};
use crate::model::RangeRef;
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::io::Cursor;

/// An implementation of the `RangeStore` trait that holds worksheets in memory. The map key is the
/// worksheet name and the map value is its rows, which may be ragged.
#[derive(Debug, Default, Clone)]
pub(crate) struct TestSheet {
    data: HashMap<String, Vec<Vec<String>>>,
    writes: usize,
}

impl TestSheet {
    pub(crate) fn new(data: HashMap<String, Vec<Vec<String>>>) -> Self {
        Self { data, writes: 0 }
    }

    /// Creates a `TestSheet` holding sample worksheets for `ledger`.
    pub(crate) fn seeded(ledger: Ledger) -> Self {
        let seeds: &[(&str, &str)] = match ledger {
            Ledger::Investments => &[
                ("Nutmeg", NUTMEG_DATA),
                ("Monthly", MONTHLY_DATA),
                ("Shareworks", SHAREWORKS_DATA),
                ("Standard Life", STANDARD_LIFE_DATA),
            ],
            Ledger::Brokerage => &[
                ("Transactions", HARGREAVES_DATA),
                ("Portfolio", PORTFOLIO_DATA),
            ],
        };
        let mut data = HashMap::new();
        for (worksheet, csv_data) in seeds {
            let rows = load_csv(csv_data).unwrap_or_default();
            data.insert(worksheet.to_string(), rows);
        }
        Self::new(data)
    }

    #[cfg(test)]
    /// Sets the rows of `worksheet`, replacing anything that was there.
    pub(crate) fn put<S: Into<String>>(&mut self, worksheet: &str, rows: Vec<Vec<S>>) {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.data.insert(worksheet.to_string(), rows);
    }

    /// The value of a cell, `""` if it is empty. Row and column are 1-based.
    pub(crate) fn cell(&self, worksheet: &str, row: usize, col: usize) -> &str {
        self.data
            .get(worksheet)
            .and_then(|rows| rows.get(row - 1))
            .and_then(|r| r.get(col - 1))
            .map(|s| s.as_str())
            .unwrap_or_default()
    }

    #[cfg(test)]
    /// The cells of `row` (1-based) up to and including the last non-empty one.
    pub(crate) fn row(&self, worksheet: &str, row: usize) -> Vec<String> {
        let mut cells = self
            .data
            .get(worksheet)
            .and_then(|rows| rows.get(row - 1))
            .cloned()
            .unwrap_or_default();
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        cells
    }

    #[cfg(test)]
    /// The number of rows of `worksheet` up to and including the last non-empty one.
    pub(crate) fn row_count(&self, worksheet: &str) -> usize {
        let rows = self.data.get(worksheet).map(Vec::len).unwrap_or_default();
        (1..=rows)
            .rev()
            .find(|&row| !self.row(worksheet, row).is_empty())
            .unwrap_or_default()
    }

    #[cfg(test)]
    /// How many times `write_rows` has been called.
    pub(crate) fn writes(&self) -> usize {
        self.writes
    }
}

#[async_trait::async_trait]
impl RangeStore for TestSheet {
    async fn read_range(&mut self, worksheet: &str, range: &str) -> Result<Vec<String>> {
        let range: RangeRef = range.parse()?;
        self.data
            .get(worksheet)
            .with_context(|| format!("Sheet '{worksheet}' not found"))?;
        Ok(range
            .cells()
            .map(|c| self.cell(worksheet, c.row, c.col).to_string())
            .collect())
    }

    async fn write_rows(
        &mut self,
        worksheet: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<()> {
        let range: RangeRef = range.parse()?;
        let sheet = self
            .data
            .get_mut(worksheet)
            .with_context(|| format!("Sheet '{worksheet}' not found"))?;
        for (row_offset, values) in rows.into_iter().enumerate() {
            let row_ix = range.start().row - 1 + row_offset;
            if sheet.len() <= row_ix {
                sheet.resize(row_ix + 1, Vec::new());
            }
            let row = &mut sheet[row_ix];
            for (col_offset, value) in values.into_iter().enumerate() {
                let col_ix = range.start().col - 1 + col_offset;
                if row.len() <= col_ix {
                    row.resize(col_ix + 1, String::new());
                }
                row[col_ix] = value;
            }
        }
        self.writes += 1;
        Ok(())
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed robo-advisor ledger.
const NUTMEG_DATA: &str = r##"Date,Type,Pot,Amount,,Running Total
05/08/2025,Contribution,Rainy Day,500.00,,=D2
05/09/2025,Contribution,Rainy Day,500.00,,=F2+D3
06/10/2025,Contribution,House Deposit,250.00,,=F3+D4
"##;

/// Seed monthly summary. Net contributions and value live in columns H and I.
const MONTHLY_DATA: &str = r##"Month,,,,,,,Net Contributions,Current Value
"##;

/// Seed share-purchase ledger.
const SHAREWORKS_DATA: &str = r##"Date,Settled,Reference,Price,FX,Price,Quantity,Weight,Value,Return,Per Share,Employer Return,Total
15/09/2025,15/09/2025,ESPP Purchase,31.40,=1.27*2,31.40,=12*2,,n/a,n/a,n/a,n/a,n/a
30/09/2025,30/09/2025,,760.00,1.27,=IF(G3=0,0,D3 / G3),24,=IF(E3=0,0,1 / E3),=G3 * F3,=IF(H3=0,0,J1 + ((G3 * F3) - (G1 * F1) - (SUM(ARRAYFORMULA(G2:G2 * F2:F2)))) * H3),=IF(G3=0,0,J3 / G3),=IF(H3=0,0,L1 + ((SUM(ARRAYFORMULA(G2:G2 * F2:F2))) / 2) * H3),=J3 + L3
"##;

/// Seed pension ledger.
const STANDARD_LIFE_DATA: &str = r##"Date,Description,Amount,Total Payments,Investment Growth,Growth %,Total Value
28/08/2025,Regular contribution,412.50
28/09/2025,Regular contribution,412.50
30/09/2025,,,825.00,31.12,=E4/D4,=D4+E4
"##;

/// Seed brokerage transactions.
const HARGREAVES_DATA: &str = r##"Trade Date,Settle Date,Reference,Description,Unit Cost (p),Quantity,Value (£)
01/09/2025,01/09/2025,DEP001,Cash,n/a,,1000.00
03/09/2025,05/09/2025,B771203,Vanguard FTSE Global All Cap,201.34,490,-986.57
"##;

/// Seed brokerage portfolio. Symbols in column E, prices in pounds in column D, total in D11.
const PORTFOLIO_DATA: &str = r##"Portfolio,,,,
Holding,,,Price (£),Symbol
,,,2.0134,VGAC
,,,0,Unused
,,,0,Unused
,,,0,Unused
,,,0,Unused
,,,0,Unused
,,,0,Unused
,,,0,Unused
Total,,,986.57,
"##;
