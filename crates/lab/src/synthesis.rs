//! Scent-DNA synthesis and blend recommendations.
//!
//! There is no model behind this: [`LocalSynthesizer`] waits out a fixed
//! delay and picks one of two archetypes from the voice pitch. The
//! [`ScentSynthesizer`] trait is the seam where a real service would plug in.

use std::future::Future;
use std::time::Duration;

use pulse_core::{
    Archetype, BehavioralProfile, BiometricProfile, Fragrance, FragranceId, ScentDna, VoicePitch,
    VoiceProfile,
};
use tracing::debug;

/// Turns scan summaries into a scent-DNA result.
pub trait ScentSynthesizer {
    /// Synthesize a result. Never fails.
    fn synthesize(
        &self,
        biometrics: &BiometricProfile,
        behavior: &BehavioralProfile,
        voice: &VoiceProfile,
    ) -> impl Future<Output = ScentDna> + Send;
}

/// Archetype chosen for a voice summary.
///
/// A `High` pitch maps to Solar Alchemist; every other classification,
/// including a missing pitch, maps to Obsidian Nomad. Cyber Oud and Velvet
/// Minimalist have no mapping and are never produced here.
#[must_use]
pub fn select_archetype(voice: &VoiceProfile) -> Archetype {
    match voice.pitch {
        Some(VoicePitch::High) => Archetype::SolarAlchemist,
        _ => Archetype::ObsidianNomad,
    }
}

/// Local synthesizer with simulated latency.
#[derive(Debug, Clone, Copy)]
pub struct LocalSynthesizer {
    delay: Duration,
}

impl LocalSynthesizer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for LocalSynthesizer {
    fn default() -> Self {
        Self::new(Duration::from_millis(2500))
    }
}

impl ScentSynthesizer for LocalSynthesizer {
    fn synthesize(
        &self,
        _biometrics: &BiometricProfile,
        _behavior: &BehavioralProfile,
        voice: &VoiceProfile,
    ) -> impl Future<Output = ScentDna> + Send {
        let delay = self.delay;
        let archetype = select_archetype(voice);
        debug!(pitch = ?voice.pitch, %archetype, "Running local biometric synthesis");
        async move {
            tokio::time::sleep(delay).await;
            ScentDna::from_archetype(archetype)
        }
    }
}

/// One component of a blend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendRatio {
    pub fragrance_id: FragranceId,
    pub name: String,
    pub percentage: u8,
}

/// A layering recipe built from the wardrobe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendRecipe {
    pub name: String,
    pub ratios: Vec<BlendRatio>,
    pub analysis: String,
}

/// Blend the wardrobe for a scent-DNA result.
///
/// `None` for an empty wardrobe. The first fragrance carries 70%, each
/// further fragrance 30%, as the lab has always presented it.
#[must_use]
pub fn recommend_blend(dna: &ScentDna, wardrobe: &[Fragrance]) -> Option<BlendRecipe> {
    if wardrobe.is_empty() {
        return None;
    }

    let ratios = wardrobe
        .iter()
        .enumerate()
        .map(|(i, fragrance)| BlendRatio {
            fragrance_id: fragrance.id.clone(),
            name: fragrance.name.clone(),
            percentage: if i == 0 { 70 } else { 30 },
        })
        .collect();

    Some(BlendRecipe {
        name: "Local Synthesis #1".to_owned(),
        ratios,
        analysis: format!(
            "Layering tuned for {} using on-device sensory logic.",
            dna.headline()
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use pulse_core::Price;

    use super::*;

    fn voice(pitch: Option<VoicePitch>) -> VoiceProfile {
        VoiceProfile {
            mood: None,
            pitch,
            tempo: None,
        }
    }

    #[test]
    fn test_only_two_archetypes_reachable() {
        assert_eq!(
            select_archetype(&voice(Some(VoicePitch::High))),
            Archetype::SolarAlchemist
        );
        for pitch in [
            None,
            Some(VoicePitch::MidRange),
            Some(VoicePitch::Low),
            Some(VoicePitch::Unclassified),
        ] {
            assert_eq!(select_archetype(&voice(pitch)), Archetype::ObsidianNomad);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesize_is_deterministic_after_delay() {
        let synthesizer = LocalSynthesizer::default();
        let behavior = BehavioralProfile {
            usage_habits: None,
            activity_level: None,
            day_night_behavior: None,
            timestamp: Utc::now(),
        };
        let started = tokio::time::Instant::now();
        let first = synthesizer
            .synthesize(&BiometricProfile::default(), &behavior, &voice(Some(VoicePitch::High)))
            .await;
        assert_eq!(started.elapsed(), Duration::from_millis(2500));

        let second = synthesizer
            .synthesize(&BiometricProfile::default(), &behavior, &voice(Some(VoicePitch::High)))
            .await;
        assert_eq!(first, second);
        assert_eq!(first.headline(), "Solar Alchemist");
    }

    #[test]
    fn test_blend_ratios() {
        let dna = ScentDna::from_archetype(Archetype::ObsidianNomad);
        assert!(recommend_blend(&dna, &[]).is_none());

        let fragrance = |id: &str, name: &str| Fragrance {
            id: FragranceId::new(id),
            brand: "Brand".to_owned(),
            name: name.to_owned(),
            notes: Vec::new(),
            family: "Floral".to_owned(),
            price: Price::eur(100),
            is_active: true,
            image_url: None,
        };
        let recipe = recommend_blend(
            &dna,
            &[fragrance("a", "Libre"), fragrance("b", "Alien"), fragrance("c", "Sì")],
        )
        .unwrap();
        let percentages: Vec<u8> = recipe.ratios.iter().map(|r| r.percentage).collect();
        assert_eq!(percentages, [70, 30, 30]);
        assert!(recipe.analysis.contains("Obsidian Nomad"));
    }
}
