//! # Order Desk Client
//!
//! Provides a high-level API for the order book scheduler. It wraps a
//! `SyncClient<OrderBook>` and speaks in rows and flags.
use async_trait::async_trait;
use sync_framework::{ActorClient, FrameworkError, SyncClient, SyncState};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::error::DeskError;
use crate::model::{Flag, FlagEdit, Order, OrderBook, RowId};

/// Client for the order book scheduler.
#[derive(Clone)]
pub struct OrderDeskClient {
    inner: SyncClient<OrderBook>,
}

impl OrderDeskClient {
    pub fn new(inner: SyncClient<OrderBook>) -> Self {
        Self { inner }
    }

    /// Sets one flag of one order and returns the updated order.
    ///
    /// The change is visible immediately; it reaches the spreadsheet once the
    /// operator has been idle for the debounce period.
    #[instrument(skip(self))]
    pub async fn set_flag(&self, row: RowId, flag: Flag, value: bool) -> Result<Order, DeskError> {
        debug!("Sending request");
        self.inner
            .edit(FlagEdit::new(row, flag, value))
            .await
            .map_err(DeskError::from_framework)
    }

    /// Flips one flag, the way a checkbox click does.
    #[instrument(skip(self))]
    pub async fn toggle_flag(&self, row: RowId, flag: Flag) -> Result<Order, DeskError> {
        let current = self.select(row).await?.flag(flag);
        self.set_flag(row, flag, !current).await
    }

    /// Detail of the order the operator clicked on.
    #[instrument(skip(self))]
    pub async fn select(&self, row: RowId) -> Result<Order, DeskError> {
        self.get(row)
            .await?
            .ok_or_else(|| DeskError::OrderNotFound(row.to_string()))
    }

    /// Orders still in progress, in sheet order.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, DeskError> {
        let orders = self.snapshot().await?;
        Ok(orders.into_iter().filter(|o| !o.is_complete()).collect())
    }

    /// Writes pending edits now instead of waiting for the debounce.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<usize, DeskError> {
        debug!("Sending request");
        self.inner.flush().await.map_err(DeskError::from_framework)
    }

    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.inner.state()
    }

    pub fn current_state(&self) -> SyncState {
        self.inner.current_state()
    }
}

#[async_trait]
impl ActorClient<OrderBook> for OrderDeskClient {
    type Error = DeskError;

    fn inner(&self) -> &SyncClient<OrderBook> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DeskError::from_framework(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use sync_framework::mock::{create_mock_client, expect_edit, expect_get, expect_snapshot};

    #[tokio::test]
    async fn test_set_flag_sends_edit() {
        let (client, mut receiver) = create_mock_client::<OrderBook>(10);
        let client = OrderDeskClient::new(client);

        let handle =
            tokio::spawn(async move { client.set_flag(RowId(2), Flag::Paid, true).await });

        let (edit, responder) = expect_edit(&mut receiver).await.unwrap();
        assert_eq!(edit, FlagEdit::new(RowId(2), Flag::Paid, true));
        let mut order = demo::sample_order(RowId(2));
        order.paid = true;
        responder.send(Ok(order)).unwrap();

        let result = handle.await.unwrap().unwrap();
        assert!(result.paid);
    }

    #[tokio::test]
    async fn test_toggle_flag_reads_then_writes() {
        let (client, mut receiver) = create_mock_client::<OrderBook>(10);
        let client = OrderDeskClient::new(client);

        let handle = tokio::spawn(async move { client.toggle_flag(RowId(0), Flag::Approved).await });

        let (id, responder) = expect_get(&mut receiver).await.unwrap();
        assert_eq!(id, RowId(0));
        let mut order = demo::sample_order(RowId(0));
        order.approved = true;
        responder.send(Ok(Some(order.clone()))).unwrap();

        let (edit, responder) = expect_edit(&mut receiver).await.unwrap();
        assert_eq!(edit, FlagEdit::new(RowId(0), Flag::Approved, false));
        order.approved = false;
        responder.send(Ok(order)).unwrap();

        assert!(!handle.await.unwrap().unwrap().approved);
    }

    #[tokio::test]
    async fn test_select_missing_row() {
        let (client, mut receiver) = create_mock_client::<OrderBook>(10);
        let client = OrderDeskClient::new(client);

        let handle = tokio::spawn(async move { client.select(RowId(9)).await });

        let (_, responder) = expect_get(&mut receiver).await.unwrap();
        responder.send(Ok(None)).unwrap();

        assert_eq!(
            handle.await.unwrap(),
            Err(DeskError::OrderNotFound("row_9".to_string()))
        );
    }

    #[tokio::test]
    async fn test_pending_orders_hides_completed() {
        let (client, mut receiver) = create_mock_client::<OrderBook>(10);
        let client = OrderDeskClient::new(client);

        let handle = tokio::spawn(async move { client.pending_orders().await });

        let responder = expect_snapshot(&mut receiver).await.unwrap();
        let mut done = demo::sample_order(RowId(1));
        done.completion = 1.0;
        responder
            .send(Ok(vec![demo::sample_order(RowId(0)), done]))
            .unwrap();

        let pending = handle.await.unwrap().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].row, RowId(0));
    }

    #[tokio::test]
    async fn test_not_found_is_mapped() {
        let (client, mut receiver) = create_mock_client::<OrderBook>(10);
        let client = OrderDeskClient::new(client);

        let handle = tokio::spawn(async move { client.set_flag(RowId(0), Flag::Printed, true).await });

        let (_, responder) = expect_edit(&mut receiver).await.unwrap();
        responder
            .send(Err(FrameworkError::NotFound("row_0".into())))
            .unwrap();

        assert_eq!(
            handle.await.unwrap(),
            Err(DeskError::OrderNotFound("row_0".to_string()))
        );
    }
}
