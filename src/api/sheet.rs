//! Implements the `RangeStore` trait using the `sheets::Client` to interact with a Google sheet.

use crate::api::{RangeStore, TokenProvider};
use crate::model::RangeRef;
use crate::Result;
use anyhow::Context;
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Implements the `RangeStore` trait for one spreadsheet. It takes a `TokenProvider`, which it
/// asks for a fresh token before each request.
pub(super) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
}

impl GoogleSheet {
    pub(super) async fn new(
        spreadsheet_id: impl Into<String>,
        mut token_provider: TokenProvider,
    ) -> Result<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            token_provider,
            client,
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RangeStore for GoogleSheet {
    async fn read_range(&mut self, worksheet: &str, range: &str) -> Result<Vec<String>> {
        trace!("read_range {worksheet}!{range}");
        let parsed: RangeRef = range.parse()?;
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                &a1(worksheet, range),
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to read {range} from the {worksheet} sheet"))?;
        Ok(fill(&parsed, response.body.values))
    }

    async fn write_rows(
        &mut self,
        worksheet: &str,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<()> {
        self.refresh_client().await?;
        let request = BatchUpdateValuesRequest {
            data: vec![ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: a1(worksheet, range),
                values: rows,
            }],
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to write {range} to the {worksheet} sheet"))?;
        Ok(())
    }
}

/// Qualifies `range` with a quoted worksheet name, e.g. `'Standard Life'!A2:C2`.
fn a1(worksheet: &str, range: &str) -> String {
    format!("'{}'!{range}", worksheet.replace('\'', "''"))
}

/// The API leaves out trailing empty rows and cells. This puts them back so that the result covers
/// every cell of `range` in row-major order.
fn fill(range: &RangeRef, mut rows: Vec<Vec<String>>) -> Vec<String> {
    rows.resize(range.rows(), Vec::new());
    rows.into_iter()
        .flat_map(|mut row| {
            row.resize(range.cols(), String::new());
            row
        })
        .collect()
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?;

    // The sheets crate requires client_id, client_secret, and redirect_uri, but we don't need them
    // for API calls, only the access token
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token.to_string(),
        String::new(), // refresh_token (not needed, we handle refresh ourselves)
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_quotes_worksheet() {
        assert_eq!(a1("Standard Life", "A2:C2"), "'Standard Life'!A2:C2");
        assert_eq!(a1("Bob's", "A1"), "'Bob''s'!A1");
    }

    #[test]
    fn test_fill_pads_missing_cells() {
        let range: RangeRef = "A1:B3".parse().unwrap();
        let rows = vec![vec!["x".to_string()], vec!["y".to_string(), "z".to_string()]];
        assert_eq!(fill(&range, rows), vec!["x", "", "y", "z", "", ""]);
    }

    #[test]
    fn test_fill_empty_response() {
        let range: RangeRef = "A1:A3".parse().unwrap();
        assert_eq!(fill(&range, Vec::new()), vec!["", "", ""]);
    }
}
