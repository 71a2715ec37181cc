//! Deterministic collaborators for tests and local runs.
//!
//! These stand in for the network-facing page source and message sender so
//! the monitor and HTTP layer can be exercised without Twilio or the target
//! site.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{FetchError, NotifyError};
use crate::notify::{MessageReceipt, MessageSender};
use crate::probe::{PageSource, ADULTS_PHRASE, NO_SLOTS_PHRASE};
use crate::recipient::Recipient;

/// Page source that replays a fixed script of fetch results.
///
/// Once the script is exhausted every fetch fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedPageSource {
    script: Mutex<VecDeque<Result<String, FetchError>>>,
    fetches: AtomicUsize,
}

impl ScriptedPageSource {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new(script: Vec<Result<String, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// One page per entry: an open-slots page for `true`, the no-slots
    /// notice for `false`.
    #[must_use]
    pub fn from_availability(script: &[bool]) -> Self {
        Self::new(
            script
                .iter()
                .map(|&open| Ok(if open { open_page() } else { closed_page() }))
                .collect(),
        )
    }

    /// Append more results to the end of the script.
    pub fn push(&self, result: Result<String, FetchError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Number of fetches made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedPageSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::Transport {
                    message: "script exhausted".to_string(),
                })
            })
    }
}

/// HTML of a page listing open slots.
#[must_use]
pub fn open_page() -> String {
    format!("<html><body><h2>Turnos</h2><h3>{}</h3><form></form></body></html>", ADULTS_PHRASE.to_uppercase())
}

/// HTML of the no-slots notice.
#[must_use]
pub fn closed_page() -> String {
    format!("<html><body><p>{NO_SLOTS_PHRASE}.</p></body></html>")
}

/// Message sender that records every send and fails for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingSender {
    failing: HashSet<Recipient>,
    sent: Mutex<Vec<(Recipient, String)>>,
    attempts: AtomicUsize,
}

impl RecordingSender {
    /// Sender that rejects every recipient in `failing`.
    pub fn failing_for(failing: impl IntoIterator<Item = Recipient>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Successful sends in order.
    pub fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Send attempts, failed ones included.
    pub fn send_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<MessageReceipt, NotifyError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.contains(recipient) {
            return Err(NotifyError::Rejected {
                status: 400,
                message: format!("recipient {} rejected", recipient.fingerprint()),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((recipient.clone(), body.to_string()));
        Ok(MessageReceipt {
            message_id: Some(format!("SM{attempt:032}")),
        })
    }
}
