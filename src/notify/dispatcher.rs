use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::NotifyError;
use crate::recipient::{DeliveryOrigin, DeliveryRecord, Recipient};
use crate::storage::{run_blocking, DeliveryStore};

use super::sender::{MessageReceipt, MessageSender};

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Send attempts made (one per recipient).
    pub attempted: usize,
    /// Recipients whose send succeeded, in dispatch order.
    pub delivered: Vec<Recipient>,
    /// Recipients whose send failed, with the error text.
    pub failed: Vec<(Recipient, String)>,
}

/// Sends the alert message and records deliveries.
pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
    deliveries: Arc<dyn DeliveryStore>,
    message: String,
}

impl Dispatcher {
    #[allow(missing_docs)]
    pub fn new(
        sender: Arc<dyn MessageSender>,
        deliveries: Arc<dyn DeliveryStore>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            deliveries,
            message: message.into(),
        }
    }

    /// Send the alert to every recipient, once each.
    ///
    /// Per-recipient failures are logged and collected in the report; they
    /// never abort the pass. Failed recipients are not retried.
    pub async fn dispatch(&self, recipients: &[Recipient]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for recipient in recipients {
            report.attempted += 1;
            match self.sender.send(recipient, &self.message).await {
                Ok(receipt) => {
                    info!(
                        recipient = %recipient.fingerprint(),
                        message_id = receipt.message_id.as_deref().unwrap_or("-"),
                        "alert delivered"
                    );
                    self.record(recipient, DeliveryOrigin::Alert).await;
                    report.delivered.push(recipient.clone());
                }
                Err(err) => {
                    warn!(recipient = %recipient.fingerprint(), error = %err, "alert delivery failed");
                    report.failed.push((recipient.clone(), err.to_string()));
                }
            }
        }

        report
    }

    /// Send the alert to a single recipient outside any availability window.
    pub async fn send_test(&self, recipient: &Recipient) -> Result<MessageReceipt, NotifyError> {
        let receipt = self.sender.send(recipient, &self.message).await?;
        info!(recipient = %recipient.fingerprint(), "test message delivered");
        self.record(recipient, DeliveryOrigin::Test).await;
        Ok(receipt)
    }

    // The message already went out; a history write failure must not turn it into a send failure.
    async fn record(&self, recipient: &Recipient, origin: DeliveryOrigin) {
        let record = DeliveryRecord::new(recipient.clone(), origin);
        let store = Arc::clone(&self.deliveries);
        if let Err(err) = run_blocking(move || store.append_delivery(record)).await {
            error!(recipient = %recipient.fingerprint(), error = %err, "failed to record delivery");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::{InMemoryDeliveryStore, StorageError};
    use crate::testing::RecordingSender;

    fn recipients(numbers: &[&str]) -> Vec<Recipient> {
        numbers.iter().map(|n| Recipient::parse(n).unwrap()).collect()
    }

    #[tokio::test]
    async fn failing_recipient_does_not_stop_the_pass() {
        let [a, b, c]: [Recipient; 3] = recipients(&["+111", "+222", "+333"]).try_into().unwrap();
        let sender = Arc::new(RecordingSender::failing_for([b.clone()]));
        let deliveries = Arc::new(InMemoryDeliveryStore::new());
        let dispatcher = Dispatcher::new(sender.clone(), deliveries.clone(), "hay turnos");

        let report = dispatcher.dispatch(&[a.clone(), b.clone(), c.clone()]).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, vec![a.clone(), c.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, b);

        let history = deliveries.read_deliveries().unwrap();
        let recorded: Vec<_> = history.iter().map(|r| r.recipient.clone()).collect();
        assert_eq!(recorded, vec![a, c]);
        assert!(history.iter().all(|r| r.origin == DeliveryOrigin::Alert));
        assert_eq!(sender.send_count(), 3);
    }

    #[tokio::test]
    async fn empty_recipient_list_is_a_no_op() {
        let sender = Arc::new(RecordingSender::default());
        let deliveries = Arc::new(InMemoryDeliveryStore::new());
        let dispatcher = Dispatcher::new(sender.clone(), deliveries.clone(), "hay turnos");

        let report = dispatcher.dispatch(&[]).await;
        assert_eq!(report, DispatchReport::default());
        assert_eq!(sender.send_count(), 0);
    }

    struct BrokenHistory;

    impl DeliveryStore for BrokenHistory {
        fn append_delivery(&self, _record: DeliveryRecord) -> Result<(), StorageError> {
            Err(StorageError::BackendError("disk full".to_string()))
        }

        fn read_deliveries(&self) -> Result<Vec<DeliveryRecord>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn history_write_failure_still_counts_as_delivered() {
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(sender.clone(), Arc::new(BrokenHistory), "hay turnos");

        let report = dispatcher.dispatch(&recipients(&["+111"])).await;
        assert_eq!(report.delivered.len(), 1);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn send_test_records_a_test_delivery() {
        let sender = Arc::new(RecordingSender::default());
        let deliveries = Arc::new(InMemoryDeliveryStore::new());
        let dispatcher = Dispatcher::new(sender.clone(), deliveries.clone(), "hay turnos");
        let target = Recipient::parse("+5493410000000").unwrap();

        dispatcher.send_test(&target).await.unwrap();

        let history = deliveries.read_deliveries().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].origin, DeliveryOrigin::Test);
        assert_eq!(sender.sent(), vec![(target, "hay turnos".to_string())]);
    }

    #[tokio::test]
    async fn send_test_failure_records_nothing() {
        let target = Recipient::parse("+5493410000000").unwrap();
        let sender = Arc::new(RecordingSender::failing_for([target.clone()]));
        let deliveries = Arc::new(InMemoryDeliveryStore::new());
        let dispatcher = Dispatcher::new(sender, deliveries.clone(), "hay turnos");

        assert!(dispatcher.send_test(&target).await.is_err());
        assert!(deliveries.read_deliveries().unwrap().is_empty());
    }
}
