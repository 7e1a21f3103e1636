//! # ActorClient Trait
//!
//! Provides a common interface for domain clients, adding default `get`, `snapshot` and
//! `refresh` methods built on top of a generic [`SyncClient`].
use crate::{FrameworkError, SyncClient, SyncEntity};
use async_trait::async_trait;

/// Trait for domain-specific clients to inherit the standard read operations.
///
/// A domain client wraps a `SyncClient<T>`, says how framework errors map onto its own
/// error type, and gets `get`, `snapshot` and `refresh` for free.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl ActorClient<OrderBook> for OrderDeskClient {
///     type Error = DeskError;
///
///     fn inner(&self) -> &SyncClient<OrderBook> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         DeskError::from_framework(e)
///     }
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: SyncEntity>: Send + Sync {
    /// The domain-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic SyncClient.
    fn inner(&self) -> &SyncClient<T>;

    /// Map framework errors to the domain error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch one record by id.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T::Record>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every record currently held by the scheduler.
    #[tracing::instrument(skip(self))]
    async fn snapshot(&self) -> Result<Vec<T::Record>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().snapshot().await.map_err(Self::map_error)
    }

    /// Re-read the remote table now.
    #[tracing::instrument(skip(self))]
    async fn refresh(&self) -> Result<usize, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().refresh().await.map_err(Self::map_error)
    }
}
