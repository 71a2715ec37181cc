//! Abstract storage traits for slotwatch.
//!
//! These traits define the contract that storage backends must implement:
//! - In-memory backends for tests and embedded use
//! - JSON file backends for the server
//!
//! Both collections are append-only. Nothing is ever updated or deleted.

use std::path::PathBuf;

use thiserror::Error;

use crate::recipient::{DeliveryRecord, Recipient};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored file could not be encoded or decoded.
    #[error("Serialization error in {}: {message}", path.display())]
    SerializationError {
        /// File involved.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for the recipient registry.
///
/// Recipients keep their registration order. Re-registering an existing
/// recipient is a no-op, not an error.
pub trait RecipientStore: Send + Sync {
    /// All recipients in registration order.
    fn list_recipients(&self) -> Result<Vec<Recipient>, StorageError>;

    /// Register a recipient. Returns true if it was not registered before.
    fn add_recipient(&self, recipient: Recipient) -> Result<bool, StorageError>;
}

/// Storage trait for the delivery history.
pub trait DeliveryStore: Send + Sync {
    /// Append one delivery record.
    fn append_delivery(&self, record: DeliveryRecord) -> Result<(), StorageError>;

    /// All delivery records in append order.
    fn read_deliveries(&self) -> Result<Vec<DeliveryRecord>, StorageError>;
}
