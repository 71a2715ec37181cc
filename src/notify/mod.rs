//! Notification delivery.
//!
//! The [`Dispatcher`] walks a recipient list once per availability window,
//! handing each message to a [`MessageSender`] and recording every
//! successful delivery. A failure for one recipient never stops the pass.

/// Per-window dispatch pass and test sends.
pub mod dispatcher;
/// Message transport (Twilio Messages API).
pub mod sender;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use sender::{MessageReceipt, MessageSender, TwilioConfig, TwilioSender};
