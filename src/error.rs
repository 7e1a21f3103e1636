//! Error types for the order desk.

use std::path::PathBuf;
use sync_framework::FrameworkError;
use thiserror::Error;

use crate::model::RowId;

/// Errors that can occur while loading, editing or syncing orders.
///
/// `ConfigMissing` and `ConfigInvalid` are fatal at startup. `DataIntegrity` and
/// `RemoteCall` only cost one sync cycle: the scheduler keeps the previous orders
/// and tries again on the next tick.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeskError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigMissing(PathBuf),

    /// The configuration file exists but cannot be used.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A cell holds a value its column cannot take.
    #[error("Data integrity error at {row}, column {column}: unexpected value {value:?}")]
    DataIntegrity {
        row: RowId,
        column: &'static str,
        value: String,
    },

    /// No order lives at the requested row.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The spreadsheet could not be read or written.
    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    /// An error occurred while communicating with the scheduler.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl DeskError {
    /// Maps a framework error back onto the desk taxonomy.
    ///
    /// Entity errors raised by the order transform come back boxed; they are
    /// unwrapped so callers can match on `DataIntegrity` directly.
    pub fn from_framework(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => DeskError::OrderNotFound(id),
            FrameworkError::Remote(msg) => DeskError::RemoteCall(msg),
            FrameworkError::EntityError(inner) => match inner.downcast::<DeskError>() {
                Ok(desk) => *desk,
                Err(other) => DeskError::ActorCommunication(other.to_string()),
            },
            other => DeskError::ActorCommunication(other.to_string()),
        }
    }
}

impl From<String> for DeskError {
    fn from(msg: String) -> Self {
        DeskError::ActorCommunication(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_error_is_unwrapped() {
        let original = DeskError::DataIntegrity {
            row: RowId(4),
            column: "PAID",
            value: "yes".to_string(),
        };
        let framework = FrameworkError::EntityError(Box::new(original.clone()));
        assert_eq!(DeskError::from_framework(framework), original);
    }

    #[test]
    fn test_framework_variants_map_onto_desk_errors() {
        assert_eq!(
            DeskError::from_framework(FrameworkError::NotFound("row_9".into())),
            DeskError::OrderNotFound("row_9".into())
        );
        assert_eq!(
            DeskError::from_framework(FrameworkError::Remote("503".into())),
            DeskError::RemoteCall("503".into())
        );
        assert!(matches!(
            DeskError::from_framework(FrameworkError::ActorClosed),
            DeskError::ActorCommunication(_)
        ));
    }

    #[test]
    fn test_data_integrity_message_names_the_cell() {
        let err = DeskError::DataIntegrity {
            row: RowId(2),
            column: "APPROVED",
            value: "si".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data integrity error at row_2, column APPROVED: unexpected value \"si\""
        );
    }
}
