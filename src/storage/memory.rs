//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the storage traits, intended for
//! tests and embedded usage. Contents are lost with the process.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::recipient::{DeliveryRecord, Recipient};
use crate::storage::traits::{DeliveryStore, RecipientStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct RecipientState {
    ordered: Vec<Recipient>,
    known: HashSet<Recipient>,
}

/// In-memory recipient registry.
#[derive(Debug, Default)]
pub struct InMemoryRecipientStore {
    state: RwLock<RecipientState>,
}

impl InMemoryRecipientStore {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecipientStore for InMemoryRecipientStore {
    fn list_recipients(&self) -> Result<Vec<Recipient>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("recipients.list"))?;
        Ok(state.ordered.clone())
    }

    fn add_recipient(&self, recipient: Recipient) -> Result<bool, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("recipients.add"))?;
        if !state.known.insert(recipient.clone()) {
            return Ok(false);
        }
        state.ordered.push(recipient);
        Ok(true)
    }
}

/// In-memory delivery history.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryStore {
    records: RwLock<Vec<DeliveryRecord>>,
}

impl InMemoryDeliveryStore {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliveryStore for InMemoryDeliveryStore {
    fn append_delivery(&self, record: DeliveryRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| lock_err("deliveries.append"))?;
        records.push(record);
        Ok(())
    }

    fn read_deliveries(&self) -> Result<Vec<DeliveryRecord>, StorageError> {
        let records = self.records.read().map_err(|_| lock_err("deliveries.read"))?;
        Ok(records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::recipient::DeliveryOrigin;

    fn r(n: &str) -> Recipient {
        Recipient::parse(n).unwrap()
    }

    #[test]
    fn registering_twice_keeps_one_entry() {
        let store = InMemoryRecipientStore::new();
        assert!(store.add_recipient(r("+111")).unwrap());
        assert!(!store.add_recipient(r("+111")).unwrap());
        assert_eq!(store.list_recipients().unwrap(), vec![r("+111")]);
    }

    #[test]
    fn recipients_keep_registration_order() {
        let store = InMemoryRecipientStore::new();
        for n in ["+333", "+111", "+222", "+111"] {
            store.add_recipient(r(n)).unwrap();
        }
        assert_eq!(
            store.list_recipients().unwrap(),
            vec![r("+333"), r("+111"), r("+222")]
        );
    }

    #[test]
    fn deliveries_are_append_only_and_ordered() {
        let store = InMemoryDeliveryStore::new();
        store
            .append_delivery(DeliveryRecord::new(r("+111"), DeliveryOrigin::Alert))
            .unwrap();
        store
            .append_delivery(DeliveryRecord::new(r("+111"), DeliveryOrigin::Alert))
            .unwrap();
        store
            .append_delivery(DeliveryRecord::new(r("+222"), DeliveryOrigin::Test))
            .unwrap();

        let history = store.read_deliveries().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].recipient, r("+222"));
        assert_eq!(history[2].origin, DeliveryOrigin::Test);
    }
}
