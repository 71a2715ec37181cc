//! Shared system state.
//!
//! One `SystemState` is created at startup and shared (`Arc`) between the
//! monitor task and the HTTP handlers. Every field is individually atomic;
//! there are no invariants spanning two fields.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No tick has run yet.
    #[default]
    Initial,
    /// Slots are not open; the next opening will be announced.
    Waiting,
    /// An opening was just detected and alerts are going out.
    Dispatching,
    /// Slots are still open and this window was already announced.
    AnnouncedIdle,
    /// Polling is suspended by an administrator.
    Paused,
}

impl Phase {
    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Waiting => "waiting",
            Self::Dispatching => "dispatching",
            Self::AnnouncedIdle => "announced_idle",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-lifetime state read by the status endpoint.
///
/// `paused` and `simulation` are written by administrators; `phase` and the
/// last announcement time are written only by the monitor.
#[derive(Debug, Default)]
pub struct SystemState {
    paused: AtomicBool,
    simulation: AtomicBool,
    phase: RwLock<Phase>,
    last_announcement: RwLock<Option<DateTime<Utc>>>,
}

impl SystemState {
    /// State with the given initial toggles and phase `initial`.
    #[must_use]
    pub fn new(paused: bool, simulation: bool) -> Self {
        Self {
            paused: AtomicBool::new(paused),
            simulation: AtomicBool::new(simulation),
            ..Self::default()
        }
    }

    #[allow(missing_docs)]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    #[allow(missing_docs)]
    pub fn set_paused(&self, on: bool) {
        self.paused.store(on, Ordering::Release);
    }

    #[allow(missing_docs)]
    pub fn is_simulation(&self) -> bool {
        self.simulation.load(Ordering::Acquire)
    }

    #[allow(missing_docs)]
    pub fn set_simulation(&self, on: bool) {
        self.simulation.store(on, Ordering::Release);
    }

    /// Current monitor phase.
    pub fn phase(&self) -> Phase {
        *self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        *self.phase.write().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// When alerts last went out, if ever since startup.
    pub fn last_announcement(&self) -> Option<DateTime<Utc>> {
        *self.last_announcement.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_announcement(&self, at: DateTime<Utc>) {
        *self.last_announcement.write().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Point-in-time copy of every field.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            paused: self.is_paused(),
            simulation_mode: self.is_simulation(),
            last_announcement_time: self.last_announcement(),
            phase: self.phase(),
        }
    }
}

/// Serializable view of [`SystemState`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(rename = "pausado")]
    pub paused: bool,
    #[serde(rename = "modo_simulacion")]
    pub simulation_mode: bool,
    #[serde(rename = "ultimo_aviso")]
    pub last_announcement_time: Option<DateTime<Utc>>,
    #[serde(rename = "estado")]
    pub phase: Phase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_in_initial_phase() {
        let state = SystemState::new(true, false);
        let snap = state.snapshot();
        assert!(snap.paused);
        assert!(!snap.simulation_mode);
        assert_eq!(snap.phase, Phase::Initial);
        assert_eq!(snap.last_announcement_time, None);
    }

    #[test]
    fn snapshot_serializes_with_wire_names() {
        let state = SystemState::new(false, true);
        state.set_phase(Phase::AnnouncedIdle);
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["pausado"], false);
        assert_eq!(json["modo_simulacion"], true);
        assert_eq!(json["estado"], "announced_idle");
        assert!(json["ultimo_aviso"].is_null());
    }

    #[test]
    fn phase_display_matches_serde() {
        for phase in [
            Phase::Initial,
            Phase::Waiting,
            Phase::Dispatching,
            Phase::AnnouncedIdle,
            Phase::Paused,
        ] {
            let json = serde_json::to_value(phase).unwrap();
            assert_eq!(json, phase.to_string());
        }
    }
}
