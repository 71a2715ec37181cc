//! # slotwatch - appointment availability watcher
//!
//! slotwatch polls a public web page on a fixed interval, decides from its
//! visible text whether appointment slots are open, and sends one WhatsApp
//! alert per registered phone number each time slots open. It stays quiet
//! until the slots close and open again.
//!
//! ## Core Concepts
//!
//! - **Recipient**: a registered phone number
//! - **Availability window**: consecutive ticks that see slots open; each
//!   window is announced at most once
//! - **Monitor**: the tick state machine driving fetch, probe and dispatch
//! - **Control surface**: key-gated pause and simulation toggles
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use slotwatch::monitor::{Monitor, SystemState};
//! use slotwatch::notify::Dispatcher;
//! use slotwatch::storage::{InMemoryDeliveryStore, InMemoryRecipientStore};
//! use slotwatch::testing::{RecordingSender, ScriptedPageSource};
//!
//! let state = Arc::new(SystemState::new(false, false));
//! let dispatcher = Arc::new(Dispatcher::new(
//!     Arc::new(RecordingSender::default()),
//!     Arc::new(InMemoryDeliveryStore::new()),
//!     "¡Hay turnos!",
//! ));
//! let mut monitor = Monitor::new(
//!     state,
//!     Arc::new(ScriptedPageSource::from_availability(&[false, true])),
//!     Arc::new(InMemoryRecipientStore::new()),
//!     dispatcher,
//! );
//! monitor.tick().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod control;
pub mod error;
pub mod export;
pub mod http;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod probe;
pub mod recipient;
pub mod storage;
pub mod testing;

// Re-export primary types at crate root for convenience
pub use config::Config;
pub use control::{AdminCredential, ControlSurface};
pub use error::{
    ConfigError, FetchError, NotifyError, SlotwatchError, SlotwatchResult, ValidationError,
};
pub use http::{build_router, AppState};
pub use monitor::{Monitor, MonitorEvent, Phase, StatusSnapshot, SystemState, TickOutcome};
pub use notify::{DispatchReport, Dispatcher, MessageSender, TwilioSender};
pub use probe::{AvailabilityProber, HttpPageSource, PageSource};
pub use recipient::{DeliveryOrigin, DeliveryRecord, Recipient};
pub use storage::{DeliveryStore, RecipientStore, StorageError};
