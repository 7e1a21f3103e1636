//! # Generic Client
//!
//! This module defines the generic client for communicating with a [`SyncActor`](crate::SyncActor).

use crate::entity::SyncEntity;
use crate::error::FrameworkError;
use crate::message::{SyncRequest, SyncState};
use tokio::sync::{mpsc, oneshot, watch};

/// ## SyncClient
///
/// The `SyncClient<T>` provides a type‑safe, async API for talking to a `SyncActor<T, _>`.
/// Requests travel over a Tokio mpsc channel and answers come back on oneshot channels.
/// The client only holds a sender and a state receiver, so it is cheap to clone and share.
pub struct SyncClient<T: SyncEntity> {
    sender: mpsc::Sender<SyncRequest<T>>,
    state: watch::Receiver<SyncState>,
}

impl<T: SyncEntity> Clone for SyncClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: SyncEntity> SyncClient<T> {
    pub fn new(sender: mpsc::Sender<SyncRequest<T>>, state: watch::Receiver<SyncState>) -> Self {
        Self { sender, state }
    }

    /// Applies a local edit and returns the edited record.
    pub async fn edit(&self, edit: T::Edit) -> Result<T::Record, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Edit { edit, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T::Record>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Get { id, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn snapshot(&self) -> Result<Vec<T::Record>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Snapshot { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn refresh(&self) -> Result<usize, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Refresh { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn flush(&self) -> Result<usize, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SyncRequest::Flush { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Watches scheduler state transitions.
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> SyncState {
        *self.state.borrow()
    }
}
