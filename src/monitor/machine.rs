use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::notify::Dispatcher;
use crate::probe::{extract_text, AvailabilityProber, PageSource};
use crate::storage::{run_blocking, RecipientStore};

use super::events::{MonitorEvent, TickOutcome, WindowId};
use super::state::{Phase, SystemState};
use super::stream::{EventBus, EventStream};

/// Default time between two polls of the target page.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Polls the target page and announces each new availability window once.
///
/// The announced flag and the current window are owned by the monitor; the
/// shared [`SystemState`] only mirrors the phase and the last announcement
/// time for readers.
pub struct Monitor {
    state: Arc<SystemState>,
    source: Arc<dyn PageSource>,
    prober: AvailabilityProber,
    recipients: Arc<dyn RecipientStore>,
    dispatcher: Arc<Dispatcher>,
    events: EventBus,
    announced: bool,
    window: Option<WindowId>,
    ticks: u64,
}

impl Monitor {
    #[allow(missing_docs)]
    pub fn new(
        state: Arc<SystemState>,
        source: Arc<dyn PageSource>,
        recipients: Arc<dyn RecipientStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            state,
            source,
            prober: AvailabilityProber::default(),
            recipients,
            dispatcher,
            events: EventBus::default(),
            announced: false,
            window: None,
            ticks: 0,
        }
    }

    /// Subscribe to tick events. `capacity` bounds the queue; events beyond
    /// it are dropped rather than stalling the monitor.
    pub fn subscribe(&self, capacity: usize) -> EventStream {
        self.events.subscribe(capacity)
    }

    /// Events lost to full subscriber queues.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    /// Ticks run so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[cfg(test)]
    pub(crate) const fn is_announced(&self) -> bool {
        self.announced
    }

    /// Run one poll-decide-dispatch step.
    pub async fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        let outcome = self.step().await;
        debug!(tick = self.ticks, phase = %self.state.phase(), "tick complete");
        self.events.publish(&MonitorEvent {
            tick: self.ticks,
            timestamp: Utc::now(),
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn step(&mut self) -> TickOutcome {
        if self.state.is_paused() {
            self.state.set_phase(Phase::Paused);
            return TickOutcome::Paused;
        }

        let (available, fetch_failed) = self.signal().await;
        if !available {
            if self.announced {
                info!(tick = self.ticks, "availability window closed");
            }
            self.announced = false;
            self.window = None;
            self.state.set_phase(Phase::Waiting);
            return TickOutcome::Unavailable { fetch_failed };
        }

        let window = *self.window.get_or_insert_with(WindowId::new);
        if self.announced {
            self.state.set_phase(Phase::AnnouncedIdle);
            return TickOutcome::AlreadyAnnounced { window };
        }

        self.state.set_phase(Phase::Dispatching);
        let span = info_span!("dispatch", tick = self.ticks, window = %window);
        let store = Arc::clone(&self.recipients);
        let recipients = match run_blocking(move || store.list_recipients()).await {
            Ok(recipients) => recipients,
            Err(err) => {
                span.in_scope(|| error!(error = %err, "cannot read recipients; dispatch deferred"));
                self.state.set_phase(Phase::Waiting);
                return TickOutcome::Deferred {
                    window,
                    reason: err.to_string(),
                };
            }
        };

        span.in_scope(|| info!(recipients = recipients.len(), "slots available; sending alerts"));
        let report = self.dispatcher.dispatch(&recipients).instrument(span.clone()).await;
        self.announced = true;
        self.state.record_announcement(Utc::now());
        span.in_scope(|| {
            info!(
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "alert pass finished"
            );
        });
        TickOutcome::Dispatched { window, report }
    }

    // Returns (available, fetch_failed).
    async fn signal(&self) -> (bool, bool) {
        if self.state.is_simulation() {
            return (true, false);
        }
        match self.source.fetch().await {
            Ok(html) => (self.prober.probe(&extract_text(&html)), false),
            Err(err) => {
                warn!(tick = self.ticks, error = %err, "page fetch failed; treating as unavailable");
                (false, true)
            }
        }
    }

    /// Tick forever, waiting `interval` after each tick finishes. The first
    /// tick runs immediately, so a slow dispatch pass delays the next poll
    /// instead of shortening the wait.
    pub async fn run(mut self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        info!(interval_secs = interval.as_secs(), "monitor started");
        loop {
            self.tick().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Spawn [`Monitor::run`] on the current tokio runtime.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(self.run(interval))
    }
}
