use sync_framework::{SerializedTable, SyncEvent, TableClient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clients::OrderDeskClient;
use crate::config::DeskConfig;
use crate::error::DeskError;
use crate::model::Order;

/// What the scheduler tells the presentation layer.
pub type DeskEvent = SyncEvent<Order>;

/// Events the presentation layer may leave unread before new ones are dropped.
pub const EVENT_BUFFER: usize = 64;

/// The running order desk: one scheduler task and the client that talks to it.
///
/// # Example
///
/// ```ignore
/// let (system, mut events) = DeskSystem::start(table, &config);
///
/// system.client.set_flag(RowId(3), Flag::Approved, true).await?;
/// // ... render events ...
///
/// system.shutdown().await?;
/// ```
pub struct DeskSystem {
    /// Client for the order book scheduler
    pub client: OrderDeskClient,

    /// Task handle of the scheduler (used for graceful shutdown)
    handle: JoinHandle<()>,
}

impl DeskSystem {
    /// Spawns the scheduler over `table`.
    ///
    /// The first fetch starts right away; its result arrives as the first
    /// [`SyncEvent::Refreshed`] (or [`SyncEvent::FetchFailed`]) on the returned
    /// receiver. The receiver holds at most [`EVENT_BUFFER`] unread events.
    pub fn start<C: TableClient>(
        table: C,
        config: &DeskConfig,
    ) -> (Self, mpsc::Receiver<DeskEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (actor, client) = crate::book::new(SerializedTable::new(table), config.timing());

        let handle = tokio::spawn(actor.with_events(events_tx).run(config.layout()));
        info!(sheet = %config.sheet, "Order desk started");

        (Self { client, handle }, events_rx)
    }

    /// Stops the scheduler.
    ///
    /// Dropping the client closes the request channel; the scheduler flushes edits
    /// that are still pending and exits. Clones of the client held elsewhere must
    /// be dropped first, or this waits for them.
    pub async fn shutdown(self) -> Result<(), DeskError> {
        info!("Shutting down order desk...");
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Scheduler task failed: {:?}", e);
            return Err(DeskError::ActorCommunication(format!(
                "Scheduler task failed: {:?}",
                e
            )));
        }

        info!("Order desk shutdown complete.");
        Ok(())
    }
}
