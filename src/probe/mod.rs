//! Availability detection over the monitored page.
//!
//! The page is fetched by a [`PageSource`], reduced to visible text by
//! [`extract_text`] and classified by an [`AvailabilityProber`].

mod source;
mod text;

pub use source::{HttpPageSource, PageSource};
pub use text::extract_text;

use std::sync::OnceLock;

/// Shown while the parish has no open slots. Overrides every other phrase.
pub const NO_SLOTS_PHRASE: &str = "en este momento la parroquia no cuenta con cupos para enfermos";

/// Heading of the open-slots section for minors.
pub const MINORS_PHRASE: &str = "turnos enfermos menores de 17 años";

/// Heading of the open-slots section for adults.
pub const ADULTS_PHRASE: &str = "turnos enfermos mayores de 18 años";

/// Fixed substring rules deciding whether slots are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityProber {
    unavailable: Vec<&'static str>,
    available: Vec<&'static str>,
}

impl Default for AvailabilityProber {
    fn default() -> Self {
        Self {
            unavailable: vec![NO_SLOTS_PHRASE],
            available: vec![MINORS_PHRASE, ADULTS_PHRASE],
        }
    }
}

impl AvailabilityProber {
    /// Returns true when the page text announces open slots.
    ///
    /// Matching is case-insensitive and whitespace-insensitive. The
    /// no-slots phrase wins over the open-slot headings.
    #[must_use]
    pub fn probe(&self, page_text: &str) -> bool {
        let text = text::collapse_whitespace(&page_text.to_lowercase());
        if self.unavailable.iter().any(|phrase| text.contains(*phrase)) {
            return false;
        }
        self.available.iter().any(|phrase| text.contains(*phrase))
    }
}

/// [`AvailabilityProber::probe`] with the default rules.
#[must_use]
pub fn probe(page_text: &str) -> bool {
    static DEFAULT: OnceLock<AvailabilityProber> = OnceLock::new();
    DEFAULT.get_or_init(AvailabilityProber::default).probe(page_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_slots_phrase_wins_over_everything() {
        let text = "Turnos enfermos menores de 17 años. Turnos enfermos mayores de 18 años. \
                    En este momento la parroquia NO cuenta con cupos para enfermos.";
        assert!(!probe(text));
        assert!(!probe(NO_SLOTS_PHRASE));
    }

    #[test]
    fn either_age_bracket_means_available() {
        assert!(probe("Reserve aquí: TURNOS ENFERMOS MENORES DE 17 AÑOS"));
        assert!(probe("turnos enfermos mayores de 18 años - completar formulario"));
    }

    #[test]
    fn neither_phrase_means_unavailable() {
        assert!(!probe(""));
        assert!(!probe("Parroquia Natividad del Señor - horarios de misa"));
        assert!(!probe("turnos enfermos menores de 18 años"));
    }

    #[test]
    fn matching_tolerates_line_breaks_inside_phrases() {
        assert!(probe("Turnos enfermos\n   mayores de 18\taños"));
        assert!(!probe("en este momento la parroquia\nno cuenta con cupos para enfermos\nturnos enfermos mayores de 18 años"));
    }
}
