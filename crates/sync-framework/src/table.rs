//! # Remote Table Client
//!
//! The [`TableClient`] trait is the seam between the scheduler and whatever
//! actually stores the rows (a Google spreadsheet, an in-memory grid, a mock).
//!
//! A flush is always one remote call: [`TableClient::write_batch`] carries every
//! dirty range at once.
//!
//! [`SerializedTable`] is the remote channel. Every read and write goes through
//! one async mutex, so the remote side never sees two overlapping requests: a
//! second caller simply waits until the first call has completed.

use crate::a1::A1Range;
use crate::cell::Rows;
use crate::error::FrameworkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Acknowledgement returned by a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriteAck {
    pub updated_range: String,
    pub updated_rows: u32,
    pub updated_columns: u32,
    pub updated_cells: u32,
}

/// A partial write: the target range and the rows to put there.
pub type RangeWrite = (A1Range, Rows);

/// Acknowledgement returned by a successful batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchAck {
    pub total_updated_rows: u32,
    pub total_updated_columns: u32,
    pub total_updated_cells: u32,
    pub responses: Vec<WriteAck>,
}

impl BatchAck {
    /// Sums the per-range acknowledgements.
    pub fn from_responses(responses: Vec<WriteAck>) -> Self {
        Self {
            total_updated_rows: responses.iter().map(|ack| ack.updated_rows).sum(),
            total_updated_columns: responses
                .iter()
                .map(|ack| ack.updated_columns)
                .max()
                .unwrap_or(0),
            total_updated_cells: responses.iter().map(|ack| ack.updated_cells).sum(),
            responses,
        }
    }
}

/// Reads and writes rectangular cell ranges.
#[async_trait]
pub trait TableClient: Send + Sync + 'static {
    /// Reads `range` row by row. Trailing empty cells may be omitted.
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError>;

    /// Overwrites `range` with `rows`.
    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError>;

    /// Overwrites several ranges in a single call. Either every range is written or
    /// the call fails.
    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError>;
}

#[async_trait]
impl<C: TableClient + ?Sized> TableClient for Arc<C> {
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        (**self).read(range).await
    }

    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        (**self).write(range, rows).await
    }

    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        (**self).write_batch(writes).await
    }
}

/// A [`TableClient`] behind a single-lane lock.
///
/// Clones share the same lane.
pub struct SerializedTable<C> {
    inner: Arc<C>,
    lane: Arc<Mutex<()>>,
}

impl<C> Clone for SerializedTable<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            lane: self.lane.clone(),
        }
    }
}

impl<C: TableClient> SerializedTable<C> {
    pub fn new(inner: C) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    pub fn from_arc(inner: Arc<C>) -> Self {
        Self {
            inner,
            lane: Arc::new(Mutex::new(())),
        }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &Arc<C> {
        &self.inner
    }
}

#[async_trait]
impl<C: TableClient> TableClient for SerializedTable<C> {
    #[instrument(skip(self, range), fields(range = %range))]
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        let _lane = self.lane.lock().await;
        debug!("Remote read");
        let rows = self.inner.read(range).await?;
        debug!(rows = rows.len(), "Remote read done");
        Ok(rows)
    }

    #[instrument(skip(self, range, rows), fields(range = %range, rows = rows.len()))]
    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        let _lane = self.lane.lock().await;
        debug!("Remote write");
        let ack = self.inner.write(range, rows).await?;
        debug!(cells = ack.updated_cells, "Remote write done");
        Ok(ack)
    }

    #[instrument(skip(self, writes), fields(ranges = writes.len()))]
    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        let _lane = self.lane.lock().await;
        debug!("Remote batch write");
        let ack = self.inner.write_batch(writes).await?;
        debug!(cells = ack.total_updated_cells, "Remote batch write done");
        Ok(ack)
    }
}
