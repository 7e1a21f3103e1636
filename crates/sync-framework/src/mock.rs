//! # Mock Tables & Testing Guide
//!
//! Two in-memory [`TableClient`]s and a few channel helpers for testing without a
//! network.
//!
//! | Type | Use Case |
//! |------|----------|
//! | [`MemoryTable`] | A plain grid. Reads return what was written. Also used for offline runs. |
//! | [`MockTable`] | A `MemoryTable` plus a call log, in-flight tracking, injected latency and scripted failures. |
//! | [`create_mock_client`] | A `SyncClient` whose requests land on a receiver you control. |
//!
//! ## Testing Strategies
//!
//! **Pattern 0: Client logic (no actor).** Use [`create_mock_client`] and answer the
//! requests by hand with [`expect_edit`] / [`expect_get`].
//!
//! **Pattern 1: Scheduler with a mock table.** Spawn a real `SyncActor` over a
//! `MockTable` and drive time with `tokio::time::pause()`. The call log tells you how
//! many writes a burst of edits produced and in which order reads and writes happened.
//!
//! ```rust,ignore
//! let mock = Arc::new(MockTable::with_rows(rows));
//! mock.set_latency(Duration::from_secs(2));
//! mock.expect_write().return_err(FrameworkError::Remote("quota".into()));
//! let table = SerializedTable::from_arc(mock.clone());
//! // ... spawn the actor, send edits, advance time ...
//! assert_eq!(mock.writes().len(), 1);
//! assert_eq!(mock.max_in_flight(), 1);
//! mock.verify();
//! ```
//!
//! ## Testing Failure Scenarios
//!
//! Scripted responses are consumed by the next call of the matching kind. Calls with no
//! scripted response fall through to the backing grid.

use crate::a1::A1Range;
use crate::cell::{Cell, Rows};
use crate::client::SyncClient;
use crate::entity::SyncEntity;
use crate::error::FrameworkError;
use crate::message::{Response, SyncRequest, SyncState};
use crate::table::{BatchAck, RangeWrite, TableClient, WriteAck};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

// =============================================================================
// IN-MEMORY GRID
// =============================================================================

/// A single sheet held in memory. Row 1 of the sheet is `grid[0]`.
///
/// Reads behave like the Sheets API: trailing empty cells and trailing empty rows
/// are left out of the response.
#[derive(Debug, Default)]
pub struct MemoryTable {
    sheet: Option<String>,
    grid: Mutex<Rows>,
}

impl MemoryTable {
    pub fn new(sheet: Option<&str>, grid: Rows) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            grid: Mutex::new(grid),
        }
    }

    /// An unnamed sheet; any sheet name in a range is accepted.
    pub fn with_rows(grid: Rows) -> Self {
        Self::new(None, grid)
    }

    /// A copy of the whole grid.
    pub fn rows(&self) -> Rows {
        self.grid.lock().unwrap().clone()
    }

    /// The cell at 1-based `row` and zero-based `col`.
    pub fn cell(&self, row: u32, col: usize) -> Cell {
        let grid = self.grid.lock().unwrap();
        grid.get((row as usize).saturating_sub(1))
            .and_then(|r| r.get(col))
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrites one cell, growing the grid as needed.
    pub fn set_cell(&self, row: u32, col: usize, value: Cell) {
        let mut grid = self.grid.lock().unwrap();
        put(&mut grid, row as usize - 1, col, value);
    }

    fn check_sheet(&self, range: &A1Range) -> Result<(), FrameworkError> {
        match (&self.sheet, &range.sheet) {
            (Some(ours), Some(theirs)) if ours != theirs => Err(FrameworkError::Remote(format!(
                "Unable to parse range: {}",
                range
            ))),
            _ => Ok(()),
        }
    }

    fn read_range(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        self.check_sheet(range)?;
        let grid = self.grid.lock().unwrap();
        let first = range.start_row as usize - 1;
        let last = range
            .end_row
            .map(|end| end as usize)
            .unwrap_or(grid.len())
            .min(grid.len());

        let mut rows: Rows = (first..last)
            .map(|r| {
                let mut row: Vec<Cell> = (range.start_col..=range.end_col)
                    .map(|c| grid[r].get(c).cloned().unwrap_or_default())
                    .collect();
                while row.last().is_some_and(is_blank) {
                    row.pop();
                }
                row
            })
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        Ok(rows)
    }

    fn check_write(&self, range: &A1Range, rows: &Rows) -> Result<(), FrameworkError> {
        self.check_sheet(range)?;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width > range.width() || range.height().is_some_and(|height| rows.len() > height) {
            return Err(FrameworkError::Remote(format!(
                "Requested writing within range [{}], but tried writing {} rows of {} columns",
                range,
                rows.len(),
                width
            )));
        }
        Ok(())
    }

    fn write_range(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        self.check_write(range, &rows)?;
        let mut grid = self.grid.lock().unwrap();
        Ok(put_rows(&mut grid, range, &rows))
    }

    /// Every range is checked before any cell changes.
    fn write_ranges(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        for (range, rows) in &writes {
            self.check_write(range, rows)?;
        }
        let mut grid = self.grid.lock().unwrap();
        let responses = writes
            .iter()
            .map(|(range, rows)| put_rows(&mut grid, range, rows))
            .collect();
        Ok(BatchAck::from_responses(responses))
    }
}

fn put_rows(grid: &mut Rows, range: &A1Range, rows: &Rows) -> WriteAck {
    let mut cells = 0;
    for (i, row) in rows.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            put(
                grid,
                range.start_row as usize - 1 + i,
                range.start_col + j,
                value.clone(),
            );
            cells += 1;
        }
    }
    WriteAck {
        updated_range: range.to_string(),
        updated_rows: rows.len() as u32,
        updated_columns: rows.iter().map(Vec::len).max().unwrap_or(0) as u32,
        updated_cells: cells,
    }
}

fn is_blank(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => s.is_empty(),
        _ => false,
    }
}

fn put(grid: &mut Rows, row: usize, col: usize, value: Cell) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= col {
        cells.resize(col + 1, Cell::Empty);
    }
    cells[col] = value;
}

#[async_trait]
impl TableClient for MemoryTable {
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        self.read_range(range)
    }

    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        self.write_range(range, rows)
    }

    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        self.write_ranges(writes)
    }
}

// =============================================================================
// MOCK TABLE
// =============================================================================

/// One call observed by a [`MockTable`]. A single-range write and a batch are both
/// one `Write` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCall {
    Read { range: String },
    Write { ranges: Vec<(String, Rows)> },
}

/// A scripted response for the next call of the matching kind.
enum Expectation {
    Read {
        response: Result<Rows, FrameworkError>,
    },
    Write {
        response: Result<WriteAck, FrameworkError>,
    },
}

/// A [`MemoryTable`] that records every call.
///
/// # Example
/// ```ignore
/// let mock = MockTable::with_rows(rows);
/// mock.expect_read().return_err(FrameworkError::Remote("503".into()));
/// // first read fails, later reads hit the grid
/// mock.verify(); // all scripted responses were used
/// ```
#[derive(Default)]
pub struct MockTable {
    backing: MemoryTable,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    calls: Mutex<Vec<TableCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Mutex<Duration>,
}

impl MockTable {
    pub fn new(backing: MemoryTable) -> Self {
        Self {
            backing,
            ..Self::default()
        }
    }

    pub fn with_rows(grid: Rows) -> Self {
        Self::new(MemoryTable::with_rows(grid))
    }

    /// Every call now takes `latency` (use with a paused Tokio clock).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn backing(&self) -> &MemoryTable {
        &self.backing
    }

    /// Scripts the response of the next read.
    pub fn expect_read(&self) -> ReadExpectationBuilder {
        ReadExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Scripts the response of the next write or batch write.
    pub fn expect_write(&self) -> WriteExpectationBuilder {
        WriteExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Calls in the order they started.
    pub fn calls(&self) -> Vec<TableCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TableCall::Read { .. }))
            .count()
    }

    /// `(range, rows)` of every range written, in order. A batch contributes one
    /// entry per range.
    pub fn writes(&self) -> Vec<(String, Rows)> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                TableCall::Write { ranges } => ranges,
                TableCall::Read { .. } => Vec::new(),
            })
            .collect()
    }

    /// Number of remote write calls, however many ranges each carried.
    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, TableCall::Write { .. }))
            .count()
    }

    /// Highest number of calls that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Verifies that all scripted responses were used.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }

    fn enter(&self, call: TableCall) -> Duration {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        *self.latency.lock().unwrap()
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn scripted_read(&self) -> Option<Result<Rows, FrameworkError>> {
        let mut exps = self.expectations.lock().unwrap();
        match exps.front() {
            Some(Expectation::Read { .. }) => match exps.pop_front() {
                Some(Expectation::Read { response }) => Some(response),
                _ => None,
            },
            _ => None,
        }
    }

    fn scripted_write(&self) -> Option<Result<WriteAck, FrameworkError>> {
        let mut exps = self.expectations.lock().unwrap();
        match exps.front() {
            Some(Expectation::Write { .. }) => match exps.pop_front() {
                Some(Expectation::Write { response }) => Some(response),
                _ => None,
            },
            _ => None,
        }
    }
}

#[async_trait]
impl TableClient for MockTable {
    async fn read(&self, range: &A1Range) -> Result<Rows, FrameworkError> {
        let latency = self.enter(TableCall::Read {
            range: range.to_string(),
        });
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let result = match self.scripted_read() {
            Some(response) => response,
            None => self.backing.read_range(range),
        };
        self.leave();
        result
    }

    async fn write(&self, range: &A1Range, rows: Rows) -> Result<WriteAck, FrameworkError> {
        let latency = self.enter(TableCall::Write {
            ranges: vec![(range.to_string(), rows.clone())],
        });
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let result = match self.scripted_write() {
            Some(response) => response,
            None => self.backing.write_range(range, rows),
        };
        self.leave();
        result
    }

    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<BatchAck, FrameworkError> {
        let latency = self.enter(TableCall::Write {
            ranges: writes
                .iter()
                .map(|(range, rows)| (range.to_string(), rows.clone()))
                .collect(),
        });
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let result = match self.scripted_write() {
            Some(response) => response.map(|ack| BatchAck::from_responses(vec![ack])),
            None => self.backing.write_ranges(writes),
        };
        self.leave();
        result
    }
}

/// Builder for scripted reads.
pub struct ReadExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ReadExpectationBuilder {
    /// The next read returns `rows` instead of the grid.
    pub fn return_ok(self, rows: Rows) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Read { response: Ok(rows) });
    }

    /// The next read fails.
    pub fn return_err(self, error: FrameworkError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Read {
            response: Err(error),
        });
    }
}

/// Builder for scripted writes.
pub struct WriteExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl WriteExpectationBuilder {
    /// The next write is acknowledged without touching the grid.
    pub fn return_ok(self, ack: WriteAck) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Write { response: Ok(ack) });
    }

    /// The next write fails.
    pub fn return_err(self, error: FrameworkError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation::Write {
            response: Err(error),
        });
    }
}

// =============================================================================
// CLIENT HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// # Testing Strategy
/// Domain clients (e.g. an order desk client) are thin wrappers. To test the wrapper
/// alone, hand it this client and answer the requests yourself.
pub fn create_mock_client<T: SyncEntity>(
    buffer_size: usize,
) -> (SyncClient<T>, mpsc::Receiver<SyncRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (_state, state_rx) = watch::channel(SyncState::Idle);
    (SyncClient::new(sender, state_rx), receiver)
}

/// Helper to verify that the next message is an Edit request
pub async fn expect_edit<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<SyncRequest<T>>,
) -> Option<(T::Edit, Response<T::Record>)> {
    match receiver.recv().await {
        Some(SyncRequest::Edit { edit, respond_to }) => Some((edit, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<SyncRequest<T>>,
) -> Option<(T::Id, Response<Option<T::Record>>)> {
    match receiver.recv().await {
        Some(SyncRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Snapshot request
pub async fn expect_snapshot<T: SyncEntity>(
    receiver: &mut mpsc::Receiver<SyncRequest<T>>,
) -> Option<Response<Vec<T::Record>>> {
    match receiver.recv().await {
        Some(SyncRequest::Snapshot { respond_to }) => Some(respond_to),
        _ => None,
    }
}
