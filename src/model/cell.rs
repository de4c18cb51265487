//! A1-style cell and range addressing, e.g. `C12` and `A5:F5`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single cell address. Both `row` and `col` are 1-based, so `A1` is `CellRef { row: 1, col: 1 }`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| anyhow::anyhow!("Cell address has no row number: '{s}'"))?;
        let (letters, digits) = s.split_at(split);
        let col = column_index(letters)?;
        let row = digits
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid row number in '{s}': {e}"))?;
        if row == 0 {
            anyhow::bail!("Row numbers start at 1, got: '{s}'");
        }
        Ok(CellRef { row, col })
    }
}

impl Serialize for CellRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CellRef::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A rectangular block of cells, inclusive at both corners.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct RangeRef {
    start: CellRef,
    end: CellRef,
}

impl RangeRef {
    /// Creates a range from its top-left and bottom-right corners.
    pub fn new(start: CellRef, end: CellRef) -> anyhow::Result<Self> {
        if end.row < start.row || end.col < start.col {
            anyhow::bail!("Range end {end} comes before range start {start}");
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> CellRef {
        self.start
    }

    pub fn end(&self) -> CellRef {
        self.end
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    /// Iterates the cells of the range in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col))
        })
    }

    /// Splits row-major `values` into the rows of this range. Returns an error when the values do
    /// not fill the range exactly.
    pub fn shape(&self, values: &[String]) -> Result<Vec<Vec<String>>, DimensionMismatch> {
        let mismatch = || DimensionMismatch {
            range: self.to_string(),
            rows: self.rows(),
            cols: self.cols(),
            values: values.len(),
        };
        if values.is_empty() || values.len() % self.cols() != 0 {
            return Err(mismatch());
        }
        let rows: Vec<Vec<String>> = values.chunks(self.cols()).map(|c| c.to_vec()).collect();
        if rows.len() != self.rows() {
            return Err(mismatch());
        }
        Ok(rows)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for RangeRef {
    type Err = anyhow::Error;

    /// Parses `A1:C3`. A lone cell address such as `B2` is a one-cell range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((start, end)) => RangeRef::new(start.parse()?, end.parse()?),
            None => {
                let cell: CellRef = s.parse()?;
                RangeRef::new(cell, cell)
            }
        }
    }
}

/// The values written to a range do not match its dimensions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DimensionMismatch {
    pub range: String,
    pub rows: usize,
    pub cols: usize,
    pub values: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The dimensions of the input values do not match the dimensions of the range: \
            {} values cannot fill {} ({} rows x {} columns)",
            self.values, self.range, self.rows, self.cols
        )
    }
}

impl std::error::Error for DimensionMismatch {}

/// Converts a 1-based column index to its letters: `1` -> `A`, `27` -> `AA`.
pub fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Converts column letters to a 1-based column index: `A` -> `1`, `AA` -> `27`.
pub fn column_index(letters: &str) -> anyhow::Result<usize> {
    if letters.is_empty() {
        anyhow::bail!("Cell address has no column letters");
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_alphabetic() {
            anyhow::bail!("Invalid column letter '{c}' in '{letters}'");
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        Ok(acc * 26 + digit)
    })
}
