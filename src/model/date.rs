//! Date handling for the ledger. The ledger stores dates as `DD/MM/YYYY` text in column A.

use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;

/// The `strftime` format of ledger dates.
pub const LEDGER_DATE_FORMAT: &str = "%d/%m/%Y";

/// The last recorded date of a ledger that has no transaction rows yet.
pub const EPOCH: &str = "01/01/1970";

/// Parses a `DD/MM/YYYY` ledger date.
pub fn parse_ledger_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), LEDGER_DATE_FORMAT)
        .with_context(|| format!("Unable to parse '{s}' as a DD/MM/YYYY date"))
}

/// Formats `date` the way the ledger stores it.
pub fn format_ledger_date(date: NaiveDate) -> String {
    date.format(LEDGER_DATE_FORMAT).to_string()
}

/// Parses `s` using the `strftime` format `from` and returns it as a ledger date.
pub fn reformat(s: &str, from: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(s.trim(), from)
        .with_context(|| format!("Unable to parse '{s}' as a date with format '{from}'"))?;
    Ok(format_ledger_date(date))
}

/// Returns `true` if ledger date `a` is chronologically after ledger date `b`.
pub fn is_after(a: &str, b: &str) -> Result<bool> {
    Ok(parse_ledger_date(a)? > parse_ledger_date(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_after() {
        assert!(is_after("11/03/2024", "10/03/2024").unwrap());
        assert!(!is_after("10/03/2024", "10/03/2024").unwrap());
        assert!(!is_after("09/03/2024", "10/03/2024").unwrap());
    }

    #[test]
    fn test_is_after_compares_chronologically_not_lexically() {
        // Lexically "02/01/2025" < "31/12/2024"
        assert!(is_after("02/01/2025", "31/12/2024").unwrap());
        assert!(is_after("01/02/2024", "31/01/2024").unwrap());
    }

    #[test]
    fn test_is_after_epoch() {
        assert!(is_after("01/01/2000", EPOCH).unwrap());
    }

    #[test]
    fn test_is_after_bad_input() {
        assert!(is_after("2024-03-10", "10/03/2024").is_err());
        assert!(is_after("10/03/2024", "").is_err());
    }

    #[test]
    fn test_reformat() {
        assert_eq!(reformat("15-Mar-2024", "%d-%b-%Y").unwrap(), "15/03/2024");
        assert!(reformat("2024/03/15", "%d-%b-%Y").is_err());
    }

    #[test]
    fn test_format_ledger_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_ledger_date(date), "05/03/2024");
    }
}
