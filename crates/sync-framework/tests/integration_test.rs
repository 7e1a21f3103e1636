use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use sync_framework::mock::{MockTable, TableCall};
use sync_framework::{
    A1Range, Cell, FrameworkError, RangeWrite, Rows, SerializedTable, SyncActor, SyncEntity,
    SyncEvent, SyncState, SyncTiming,
};
use tokio::sync::mpsc;
use tokio::time::sleep;

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq)]
struct Chore {
    id: u32,
    name: String,
    done: bool,
}

#[derive(Debug)]
struct Board {
    chores: BTreeMap<u32, Chore>,
}

#[derive(Clone, Debug)]
struct MarkDone {
    id: u32,
    done: bool,
}

#[derive(Debug, thiserror::Error)]
enum BoardError {
    #[error("Row {row}: bad flag {value:?}")]
    BadFlag { row: u32, value: String },
}

impl SyncEntity for Board {
    type Id = u32;
    type Record = Chore;
    type Edit = MarkDone;
    type Context = ();
    type Error = BoardError;

    fn fetch_range(_ctx: &()) -> A1Range {
        A1Range::columns(Some("Board"), 0, 1, 2)
    }

    fn decode(rows: Rows, _ctx: &()) -> Result<Self, BoardError> {
        let mut chores = BTreeMap::new();
        for (i, row) in rows.into_iter().enumerate() {
            let id = i as u32;
            let done = match row.get(1) {
                None | Some(Cell::Empty) => false,
                Some(Cell::Bool(b)) => *b,
                Some(other) => {
                    return Err(BoardError::BadFlag {
                        row: id,
                        value: other.to_string(),
                    })
                }
            };
            let name = row.first().map(|c| c.to_string()).unwrap_or_default();
            chores.insert(id, Chore { id, name, done });
        }
        Ok(Self { chores })
    }

    fn edit_target(edit: &MarkDone) -> u32 {
        edit.id
    }

    fn apply_edit(&mut self, edit: &MarkDone) -> Result<(), BoardError> {
        if let Some(chore) = self.chores.get_mut(&edit.id) {
            chore.done = edit.done;
        }
        Ok(())
    }

    fn contains(&self, id: &u32) -> bool {
        self.chores.contains_key(id)
    }

    fn get(&self, id: &u32) -> Option<Chore> {
        self.chores.get(id).cloned()
    }

    fn records(&self) -> Vec<Chore> {
        self.chores.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.chores.len()
    }

    fn flush_writes(&self, dirty: &BTreeSet<u32>, _ctx: &()) -> Vec<RangeWrite> {
        dirty
            .iter()
            .filter_map(|id| self.chores.get(id))
            .map(|chore| {
                let row = chore.id + 2;
                (
                    A1Range::block(Some("Board"), 1, row, 1, row),
                    vec![vec![Cell::Bool(chore.done)]],
                )
            })
            .collect()
    }
}

// --- Helpers ---

fn sheet() -> Rows {
    vec![
        vec![Cell::text("chore"), Cell::text("done")],
        vec![Cell::text("dishes"), Cell::Bool(false)],
        vec![Cell::text("laundry")],
        vec![Cell::text("plants"), Cell::Bool(true)],
    ]
}

fn timing(debounce: u64, poll: u64) -> SyncTiming {
    SyncTiming {
        debounce: Duration::from_secs(debounce),
        poll_interval: Duration::from_secs(poll),
    }
}

fn spawn_board(
    mock: &Arc<MockTable>,
    timing: SyncTiming,
) -> (
    sync_framework::SyncClient<Board>,
    tokio::task::JoinHandle<()>,
) {
    let table = SerializedTable::from_arc(mock.clone());
    let (actor, client) = SyncActor::<Board, _>::new(16, table, timing);
    let handle = tokio::spawn(actor.run(()));
    (client, handle)
}

// --- Tests ---

#[tokio::test(start_paused = true)]
async fn test_initial_fetch_populates_snapshot() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));

    let chores = client.snapshot().await.unwrap();
    assert_eq!(chores.len(), 3);
    assert_eq!(chores[1].name, "laundry");
    assert!(!chores[1].done);
    assert!(chores[2].done);
    assert_eq!(mock.reads(), 1);
    assert_eq!(client.current_state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_produces_one_write() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    for i in 0..5 {
        client
            .edit(MarkDone {
                id: 0,
                done: i % 2 == 0,
            })
            .await
            .unwrap();
        assert_eq!(client.current_state(), SyncState::DebouncePending);
        sleep(Duration::from_secs(1)).await;
    }

    // last edit at t=4s, deadline at t=9s
    sleep(Duration::from_secs(3)).await;
    assert!(mock.writes().is_empty());

    sleep(Duration::from_secs(2)).await;
    let writes = mock.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "Board!B2:B2");
    assert_eq!(writes[0].1, vec![vec![Cell::Bool(true)]]);
    assert_eq!(mock.backing().cell(2, 1), Cell::Bool(true));
    assert_eq!(client.current_state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_flush_is_followed_by_refetch() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 1, done: true }).await.unwrap();
    sleep(Duration::from_secs(6)).await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], TableCall::Read { .. }));
    assert!(matches!(calls[1], TableCall::Write { .. }));
    assert!(matches!(calls[2], TableCall::Read { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_poll_during_flush_waits_for_it() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    mock.set_latency(Duration::from_secs(10));
    let (client, _handle) = spawn_board(&mock, timing(12, 20));

    // initial read takes t=0..10, poll ticks from t=30
    client.snapshot().await.unwrap();
    client.edit(MarkDone { id: 2, done: false }).await.unwrap();

    // write t=22..32 (poll due at t=30), re-fetch t=32..42, deferred poll t=42..52
    sleep(Duration::from_secs(45)).await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 4, "calls: {:?}", calls);
    assert!(matches!(calls[0], TableCall::Read { .. }));
    assert!(matches!(calls[1], TableCall::Write { .. }));
    assert!(matches!(calls[2], TableCall::Read { .. }));
    assert!(matches!(calls[3], TableCall::Read { .. }));
    assert_eq!(mock.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_previous_records() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    let before = client.snapshot().await.unwrap();

    mock.backing().set_cell(2, 0, Cell::text("dishes (urgent)"));
    mock.expect_read()
        .return_err(FrameworkError::Remote("503 Service Unavailable".into()));

    let result = client.refresh().await;
    assert!(matches!(result, Err(FrameworkError::Remote(_))));
    assert_eq!(client.snapshot().await.unwrap(), before);

    assert_eq!(client.refresh().await.unwrap(), 3);
    assert_eq!(client.snapshot().await.unwrap()[0].name, "dishes (urgent)");
    mock.verify();
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_rows_keep_previous_records() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    let before = client.snapshot().await.unwrap();

    mock.backing().set_cell(3, 1, Cell::text("maybe"));
    let result = client.refresh().await;
    assert!(matches!(result, Err(FrameworkError::EntityError(_))));
    assert_eq!(client.snapshot().await.unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn test_failed_flush_is_retried_on_next_poll() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    mock.expect_write()
        .return_err(FrameworkError::Remote("429 Too Many Requests".into()));
    client.edit(MarkDone { id: 1, done: true }).await.unwrap();

    sleep(Duration::from_secs(10)).await;
    assert_eq!(mock.writes().len(), 1);
    assert_eq!(mock.backing().cell(3, 1), Cell::Empty);
    // the edit is still visible locally
    assert!(client.get(1).await.unwrap().unwrap().done);

    sleep(Duration::from_secs(55)).await;
    assert_eq!(mock.writes().len(), 2);
    assert_eq!(mock.backing().cell(3, 1), Cell::Bool(true));
    mock.verify();
}

#[tokio::test(start_paused = true)]
async fn test_pending_edit_survives_poll_inside_debounce_window() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(30, 10));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 0, done: true }).await.unwrap();

    sleep(Duration::from_secs(15)).await;
    assert!(mock.reads() >= 2);
    assert!(mock.writes().is_empty());
    assert!(client.get(0).await.unwrap().unwrap().done);
    assert_eq!(client.current_state(), SyncState::DebouncePending);

    sleep(Duration::from_secs(20)).await;
    assert_eq!(mock.writes().len(), 1);
    assert_eq!(mock.backing().cell(2, 1), Cell::Bool(true));
}

#[tokio::test(start_paused = true)]
async fn test_manual_flush_skips_the_debounce() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(30, 60));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 0, done: true }).await.unwrap();
    client.edit(MarkDone { id: 2, done: false }).await.unwrap();
    assert_eq!(client.flush().await.unwrap(), 2);
    assert_eq!(mock.write_calls(), 1);
    assert_eq!(mock.writes().len(), 2);
    assert_eq!(client.current_state(), SyncState::Idle);

    // the cancelled deadline never fires a second flush
    sleep(Duration::from_secs(40)).await;
    assert_eq!(mock.write_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scattered_edits_are_one_remote_call() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 0, done: true }).await.unwrap();
    client.edit(MarkDone { id: 2, done: false }).await.unwrap();
    client.edit(MarkDone { id: 1, done: true }).await.unwrap();
    sleep(Duration::from_secs(6)).await;

    assert_eq!(mock.write_calls(), 1);
    let ranges: Vec<String> = mock.writes().into_iter().map(|(range, _)| range).collect();
    assert_eq!(ranges, vec!["Board!B2:B2", "Board!B3:B3", "Board!B4:B4"]);
    assert_eq!(mock.backing().cell(3, 1), Cell::Bool(true));
    assert_eq!(mock.backing().cell(4, 1), Cell::Bool(false));
}

#[tokio::test(start_paused = true)]
async fn test_empty_flush_does_not_refetch() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    assert_eq!(client.flush().await.unwrap(), 0);
    assert_eq!(mock.reads(), 1);
    assert_eq!(mock.write_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_edit_whose_record_vanished_cancels_the_debounce() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 2, done: false }).await.unwrap();
    // someone clears the last row before the debounce fires
    mock.backing().set_cell(4, 0, Cell::Empty);
    mock.backing().set_cell(4, 1, Cell::Empty);
    assert_eq!(client.refresh().await.unwrap(), 2);
    assert_eq!(client.current_state(), SyncState::Idle);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(mock.write_calls(), 0);
    assert_eq!(mock.reads(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edit_for_unknown_record_is_rejected() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, _handle) = spawn_board(&mock, timing(5, 60));
    client.snapshot().await.unwrap();

    let result = client.edit(MarkDone { id: 42, done: true }).await;
    assert!(matches!(result, Err(FrameworkError::NotFound(id)) if id == "42"));
    assert_eq!(client.current_state(), SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_flushes_pending_edits() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (client, handle) = spawn_board(&mock, timing(30, 60));
    client.snapshot().await.unwrap();

    client.edit(MarkDone { id: 2, done: false }).await.unwrap();
    drop(client);
    handle.await.unwrap();

    assert_eq!(mock.writes().len(), 1);
    assert_eq!(mock.backing().cell(4, 1), Cell::Bool(false));
}

#[tokio::test(start_paused = true)]
async fn test_events_reach_the_presentation_layer() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (events_tx, mut events) = mpsc::channel(16);
    let table = SerializedTable::from_arc(mock.clone());
    let (actor, client) = SyncActor::<Board, _>::new(16, table, timing(5, 60));
    let _handle = tokio::spawn(actor.with_events(events_tx).run(()));

    match events.recv().await {
        Some(SyncEvent::Refreshed(chores)) => assert_eq!(chores.len(), 3),
        other => panic!("Expected Refreshed, got {:?}", other),
    }

    client.edit(MarkDone { id: 0, done: true }).await.unwrap();
    sleep(Duration::from_secs(6)).await;

    assert_eq!(events.recv().await, Some(SyncEvent::Flushed { rows: 1 }));
    assert!(matches!(events.recv().await, Some(SyncEvent::Refreshed(_))));
}

#[tokio::test(start_paused = true)]
async fn test_full_event_channel_does_not_stall_the_scheduler() {
    let mock = Arc::new(MockTable::with_rows(sheet()));
    let (events_tx, mut events) = mpsc::channel(1);
    let table = SerializedTable::from_arc(mock.clone());
    let (actor, client) = SyncActor::<Board, _>::new(16, table, timing(5, 60));
    let _handle = tokio::spawn(actor.with_events(events_tx).run(()));

    // nobody reads the events while the scheduler keeps working
    for _ in 0..5 {
        assert_eq!(client.refresh().await.unwrap(), 3);
    }
    client.edit(MarkDone { id: 0, done: true }).await.unwrap();
    assert_eq!(client.flush().await.unwrap(), 1);
    assert_eq!(mock.reads(), 7);

    // only the first event fit; the rest were dropped
    assert!(matches!(events.try_recv(), Ok(SyncEvent::Refreshed(_))));
    assert!(events.try_recv().is_err());
}
