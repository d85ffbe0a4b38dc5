//! Scent archetypes and the synthesized scent-DNA label.

use core::fmt;

use serde::{Deserialize, Serialize};

/// One of the catalogued scent-personality categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    ObsidianNomad,
    SolarAlchemist,
    CyberOud,
    VelvetMinimalist,
}

impl Archetype {
    /// Every archetype, in catalogue order.
    pub const ALL: [Self; 4] = [
        Self::ObsidianNomad,
        Self::SolarAlchemist,
        Self::CyberOud,
        Self::VelvetMinimalist,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ObsidianNomad => "Obsidian Nomad",
            Self::SolarAlchemist => "Solar Alchemist",
            Self::CyberOud => "Cyber Oud",
            Self::VelvetMinimalist => "Velvet Minimalist",
        }
    }

    /// Marketing description appended to the label.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ObsidianNomad => "Thermal Reactive — Intense PM — Notes of Smoked Oud & Leather",
            Self::SolarAlchemist => "UV Responsive — Fresh AM — Notes of Bergamot & White Jasmine",
            Self::CyberOud => {
                "Humidity Adaptive — Evening Transition — Notes of Metallic Rose & Amber"
            }
            Self::VelvetMinimalist => "PH Balanced — All-Day Versatility — Notes of White Musk & Iris",
        }
    }

    /// Look up an archetype by its display name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|archetype| archetype.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The synthesized result attached to a session.
///
/// Stored as a single opaque `"<name> — <description>"` string; the lab
/// never parses it back beyond recovering the headline name for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScentDna(String);

impl ScentDna {
    /// Wrap a stored result string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The full label for an archetype.
    #[must_use]
    pub fn from_archetype(archetype: Archetype) -> Self {
        Self(format!("{} — {}", archetype.name(), archetype.description()))
    }

    /// Headline name (text before the first em-dash separator).
    #[must_use]
    pub fn headline(&self) -> &str {
        self.0.split(" — ").next().unwrap_or(&self.0).trim()
    }

    /// The full result string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScentDna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_format() {
        let dna = ScentDna::from_archetype(Archetype::SolarAlchemist);
        assert_eq!(
            dna.as_str(),
            "Solar Alchemist — UV Responsive — Fresh AM — Notes of Bergamot & White Jasmine"
        );
        assert_eq!(dna.headline(), "Solar Alchemist");
    }

    #[test]
    fn test_headline_of_opaque_value() {
        assert_eq!(ScentDna::new("Custom").headline(), "Custom");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Archetype::from_name("cyber oud"), Some(Archetype::CyberOud));
        assert_eq!(Archetype::from_name("All"), None);
    }
}
