//! The polling monitor.
//!
//! A [`Monitor`] owns the announced flag and runs the fixed-interval loop:
//! check the pause toggle, obtain the availability signal (page fetch or
//! simulation), and dispatch alerts once per availability window. Each tick
//! is published as a [`MonitorEvent`] to bounded subscriber streams.

/// Tick outcome and event types.
pub mod events;
/// The tick state machine and run loop.
pub mod machine;
/// Shared state read by the control surface.
pub mod state;
/// Subscriber stream handle.
pub mod stream;

pub use events::{MonitorEvent, TickOutcome, WindowId};
pub use machine::{Monitor, DEFAULT_POLL_INTERVAL};
pub use state::{Phase, StatusSnapshot, SystemState};
pub use stream::EventStream;
