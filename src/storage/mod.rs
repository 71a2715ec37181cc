//! Storage for the recipient registry and the delivery history.
//!
//! The traits define the interface; `memory` and `json_file` provide the
//! backends.

mod json_file;
mod memory;
mod traits;

pub use json_file::{
    open_json_stores, JsonFileDeliveryStore, JsonFileRecipientStore, JsonFileStores,
    DELIVERIES_FILE, RECIPIENTS_FILE,
};
pub use memory::{InMemoryDeliveryStore, InMemoryRecipientStore};
pub use traits::{DeliveryStore, RecipientStore, StorageError};

/// Run a store call on tokio's blocking pool.
///
/// The file backend does synchronous I/O, so async callers go through here
/// instead of calling the store on a runtime worker.
///
/// # Errors
/// The store's own error, or `BackendError` if the blocking task panicked.
pub async fn run_blocking<T, F>(op: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StorageError::BackendError(format!("storage task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::recipient::Recipient;

    #[tokio::test]
    async fn run_blocking_returns_the_store_result() {
        let store = Arc::new(InMemoryRecipientStore::new());
        let number = Recipient::parse("+111").unwrap();

        let writer = Arc::clone(&store);
        let added = run_blocking(move || writer.add_recipient(number)).await.unwrap();
        assert!(added);

        let reader = Arc::clone(&store);
        let listed = run_blocking(move || reader.list_recipients()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn run_blocking_leaves_the_runtime_thread() {
        let caller = std::thread::current().id();
        let worker = run_blocking(move || Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(caller, worker);
    }

    #[tokio::test]
    async fn panicking_store_call_becomes_a_backend_error() {
        let err = run_blocking::<(), _>(|| panic!("disk on fire")).await.unwrap_err();
        assert!(matches!(err, StorageError::BackendError(_)));
    }
}
