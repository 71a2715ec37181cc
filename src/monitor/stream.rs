use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::error::{SlotwatchError, SlotwatchResult};

use super::events::MonitorEvent;

/// Fan-out of monitor events to any number of bounded subscribers.
///
/// Publishing never blocks the monitor: a full subscriber loses the event
/// (counted in `dropped`), a disconnected one is removed.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<MonitorEvent>>>,
    dropped: AtomicU64,
}

impl EventBus {
    pub(crate) fn subscribe(&self, capacity: usize) -> EventStream {
        let (tx, rx) = bounded(capacity.max(1));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        EventStream { rx }
    }

    pub(crate) fn publish(&self, event: &MonitorEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A subscription stream for monitor events.
///
/// Dropping the stream unsubscribes it on the next publish.
#[derive(Debug)]
pub struct EventStream {
    rx: Receiver<MonitorEvent>,
}

impl EventStream {
    /// Next event if one is already queued.
    #[must_use]
    pub fn try_recv(&self) -> Option<MonitorEvent> {
        self.rx.try_recv().ok()
    }

    /// Receive the next event with a timeout.
    ///
    /// # Errors
    /// `Timeout` if nothing arrives in time, `Disconnected` once the monitor
    /// has been dropped and the queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> SlotwatchResult<MonitorEvent> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => SlotwatchError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => SlotwatchError::Disconnected {
                path: "monitor_events".to_string(),
            },
        })
    }

    /// All events queued right now.
    pub fn drain(&self) -> Vec<MonitorEvent> {
        self.rx.try_iter().collect()
    }
}
