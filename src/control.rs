//! Administrative control surface.
//!
//! Administrators flip the pause and simulation toggles and read a status
//! snapshot. Every admin operation is gated by a shared key supplied as the
//! `clave` query parameter.

use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::monitor::{StatusSnapshot, SystemState};

/// The administrator key, held only as a BLAKE3 digest.
///
/// When no key is configured every check fails, so the admin endpoints are
/// closed rather than open.
#[derive(Clone, Default)]
pub struct AdminCredential {
    digest: Option<blake3::Hash>,
}

impl AdminCredential {
    /// Credential for `key`; `None` or a blank key denies everything.
    #[must_use]
    pub fn new(key: Option<&str>) -> Self {
        Self {
            digest: key.filter(|k| !k.is_empty()).map(|k| blake3::hash(k.as_bytes())),
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    /// True iff a key is configured and `supplied` matches it exactly.
    #[must_use]
    pub fn verify(&self, supplied: Option<&str>) -> bool {
        match (&self.digest, supplied) {
            // blake3::Hash equality is constant-time.
            (Some(expected), Some(supplied)) => *expected == blake3::hash(supplied.as_bytes()),
            _ => false,
        }
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredential")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Reads and writes the toggles on the shared [`SystemState`].
#[derive(Debug, Clone)]
pub struct ControlSurface {
    state: Arc<SystemState>,
}

impl ControlSurface {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new(state: Arc<SystemState>) -> Self {
        Self { state }
    }

    #[allow(missing_docs)]
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    /// Takes effect at the monitor's next tick.
    pub fn set_paused(&self, on: bool) {
        self.state.set_paused(on);
    }

    #[allow(missing_docs)]
    pub fn is_simulation(&self) -> bool {
        self.state.is_simulation()
    }

    /// Takes effect at the monitor's next tick.
    pub fn set_simulation(&self, on: bool) {
        self.state.set_simulation(on);
    }

    #[allow(missing_docs)]
    pub fn status_snapshot(&self) -> StatusSnapshot {
        self.state.snapshot()
    }
}

/// Reads a boolean word, case-insensitively: `true|1|yes|on|si|sí` or
/// `false|0|no|off`. Shared by query toggles and environment flags.
pub(crate) fn bool_word(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "si" | "sí" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses a toggle value from a query string.
///
/// # Errors
/// `InvalidToggle` for anything outside `true|1|yes|on|si|sí` and
/// `false|0|no|off` (case-insensitive).
pub fn parse_toggle(field: &str, raw: &str) -> Result<bool, ValidationError> {
    bool_word(raw).ok_or_else(|| ValidationError::InvalidToggle {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_credential_denies_everything() {
        let cred = AdminCredential::new(None);
        assert!(!cred.is_configured());
        assert!(!cred.verify(None));
        assert!(!cred.verify(Some("")));
        assert!(!cred.verify(Some("anything")));

        assert!(!AdminCredential::new(Some("")).is_configured());
    }

    #[test]
    fn configured_credential_needs_exact_match() {
        let cred = AdminCredential::new(Some("s3cret"));
        assert!(cred.verify(Some("s3cret")));
        assert!(!cred.verify(Some("S3cret")));
        assert!(!cred.verify(Some("s3cret ")));
        assert!(!cred.verify(None));
    }

    #[test]
    fn debug_does_not_leak_the_key() {
        let rendered = format!("{:?}", AdminCredential::new(Some("s3cret")));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("configured: true"));
    }

    #[test]
    fn toggles_accept_common_spellings() {
        for raw in ["true", "1", "ON", "yes", "si", "Sí"] {
            assert_eq!(parse_toggle("on", raw), Ok(true), "{raw}");
        }
        for raw in ["false", "0", "off", "No"] {
            assert_eq!(parse_toggle("on", raw), Ok(false), "{raw}");
        }
        assert!(matches!(
            parse_toggle("on", "maybe"),
            Err(ValidationError::InvalidToggle { .. })
        ));
    }

    #[test]
    fn surface_writes_through_to_shared_state() {
        let state = Arc::new(SystemState::new(false, false));
        let surface = ControlSurface::new(state.clone());

        surface.set_paused(true);
        surface.set_simulation(true);

        assert!(state.is_paused());
        assert!(state.is_simulation());
        let snap = surface.status_snapshot();
        assert!(snap.paused && snap.simulation_mode);
    }
}
