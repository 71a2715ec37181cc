use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notify::DispatchReport;

/// Identifier of one availability window.
///
/// A window starts on the tick that sees slots open after seeing them closed
/// (or at startup) and ends on the first tick that sees them closed again.
/// At most one dispatch happens per window.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(Uuid);

impl WindowId {
    /// Create a new random window id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a single monitor tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Polling is paused; nothing was fetched.
    Paused,
    /// Slots are closed. `fetch_failed` is set when the page could not be
    /// fetched at all, which also counts as closed.
    Unavailable { fetch_failed: bool },
    /// Slots are open and this window was already announced.
    AlreadyAnnounced { window: WindowId },
    /// A new window opened and the alert went out.
    Dispatched {
        window: WindowId,
        report: DispatchReport,
    },
    /// A new window opened but the recipient list could not be read. The
    /// window stays unannounced and the next tick tries again.
    Deferred { window: WindowId, reason: String },
}

impl TickOutcome {
    /// True if this tick sent alerts.
    #[must_use]
    pub const fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Event published to subscribers after every tick.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorEvent {
    /// 1-based tick counter since the monitor was created.
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub outcome: TickOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_ids_are_unique() {
        assert_ne!(WindowId::new(), WindowId::new());
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(TickOutcome::Unavailable { fetch_failed: true }).unwrap();
        assert_eq!(json["kind"], "unavailable");
        assert_eq!(json["fetch_failed"], true);

        let json = serde_json::to_value(TickOutcome::Paused).unwrap();
        assert_eq!(json["kind"], "paused");
    }
}
