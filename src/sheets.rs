//! # Google Sheets Client
//!
//! [`TableClient`] over the Sheets v4 REST API (`spreadsheets.values.get`,
//! `spreadsheets.values.update` and `spreadsheets.values.batchUpdate`).
//!
//! Reads ask for unformatted values, so checkboxes arrive as JSON booleans and
//! numbers as numbers; dates stay formatted strings. Writes use `USER_ENTERED`, the
//! same as typing into the sheet.
//!
//! Every request carries a bearer token from the [`TokenSource`]. A request answered
//! with 401 gets a refreshed token and is sent once more.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sync_framework::{
    A1Range, BatchAck, FrameworkError, RangeWrite, Rows, TableClient, WriteAck,
};
use tracing::{debug, instrument, warn};

use crate::auth::TokenSource;
use crate::config::DeskConfig;
use crate::error::DeskError;

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Body of `values.get` responses and `values.update` requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub major_dimension: String,
    /// Omitted by the API when the range holds no data.
    #[serde(default)]
    pub values: Rows,
}

impl ValueRange {
    pub fn rows(range: &A1Range, values: Rows) -> Self {
        Self {
            range: range.to_string(),
            major_dimension: "ROWS".to_string(),
            values,
        }
    }
}

/// Body of `values.batchUpdate` requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub value_input_option: String,
    pub data: Vec<ValueRange>,
}

pub struct SheetsClient {
    http: Client,
    base: Url,
    spreadsheet_id: String,
    auth: TokenSource,
}

impl SheetsClient {
    pub fn new(
        spreadsheet_id: &str,
        auth: TokenSource,
        timeout: Duration,
    ) -> Result<Self, DeskError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::RemoteCall(e.to_string()))?;
        let base = Url::parse(SHEETS_API).map_err(|e| DeskError::ConfigInvalid(e.to_string()))?;
        Ok(Self {
            http,
            base,
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
        })
    }

    pub fn from_config(config: &DeskConfig) -> Result<Self, DeskError> {
        let auth = TokenSource::load(&config.token_path)?;
        Self::new(&config.spreadsheet_id, auth, config.request_timeout())
    }

    /// Points the client at another endpoint (a proxy or a local fake).
    pub fn with_base_url(mut self, base: &str) -> Result<Self, DeskError> {
        self.base = Url::parse(base).map_err(|e| DeskError::ConfigInvalid(e.to_string()))?;
        Ok(self)
    }

    /// `{base}/{spreadsheet_id}/values/{range}` with the range as one path segment.
    pub fn values_url(&self, range: &A1Range) -> Result<Url, FrameworkError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FrameworkError::Remote(format!("Cannot be a base URL: {}", self.base)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&range.to_string());
        Ok(url)
    }

    /// `{base}/{spreadsheet_id}/values:batchUpdate`
    pub fn batch_url(&self) -> Result<Url, FrameworkError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FrameworkError::Remote(format!("Cannot be a base URL: {}", self.base)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values:batchUpdate");
        Ok(url)
    }

    /// Sends the request built by `request` with a bearer token. On 401 the token
    /// is refreshed and the request is built and sent once more.
    async fn send<F>(&self, request: F) -> Result<Response, FrameworkError>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let token = self.auth.bearer(&self.http).await?;
        let response = request(&token).send().await.map_err(remote)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        warn!("Access token rejected, refreshing");
        let token = self.auth.refresh(&self.http, Some(&token)).await?;
        let response = request(&token).send().await.map_err(remote)?;
        check_status(response).await
    }
}

#[async_trait]
impl TableClient for SheetsClient {
    #[instrument(skip(self, range), fields(range = %range))]
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        let url = self.values_url(range)?;
        let response = self
            .send(|token| {
                self.http
                    .get(url.clone())
                    .bearer_auth(token)
                    .query(&[
                        ("majorDimension", "ROWS"),
                        ("valueRenderOption", "UNFORMATTED_VALUE"),
                        ("dateTimeRenderOption", "FORMATTED_STRING"),
                    ])
            })
            .await?;

        let body: ValueRange = response.json().await.map_err(remote)?;
        debug!(rows = body.values.len(), "Read");
        Ok(body.values)
    }

    #[instrument(skip(self, range, rows), fields(range = %range, rows = rows.len()))]
    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        let url = self.values_url(range)?;
        let body = ValueRange::rows(range, rows);
        let response = self
            .send(|token| {
                self.http
                    .put(url.clone())
                    .bearer_auth(token)
                    .query(&[("valueInputOption", "USER_ENTERED")])
                    .json(&body)
            })
            .await?;

        let ack: WriteAck = response.json().await.map_err(remote)?;
        debug!(updated_cells = ack.updated_cells, "Wrote");
        Ok(ack)
    }

    #[instrument(skip(self, writes), fields(ranges = writes.len()))]
    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        let url = self.batch_url()?;
        let body = BatchUpdateRequest {
            value_input_option: "USER_ENTERED".to_string(),
            data: writes
                .into_iter()
                .map(|(range, rows)| ValueRange::rows(&range, rows))
                .collect(),
        };
        let response = self
            .send(|token| self.http.post(url.clone()).bearer_auth(token).json(&body))
            .await?;

        let ack: BatchAck = response.json().await.map_err(remote)?;
        debug!(updated_cells = ack.total_updated_cells, "Wrote batch");
        Ok(ack)
    }
}

pub(crate) async fn check_status(response: Response) -> Result<Response, FrameworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FrameworkError::Remote(format!("HTTP {}: {}", status, body.trim())))
}

pub(crate) fn remote(e: reqwest::Error) -> FrameworkError {
    FrameworkError::Remote(e.to_string())
}
