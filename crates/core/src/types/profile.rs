//! Biometric, behavioral and voice profile summaries.
//!
//! These are the summaries a completed scan attaches to an identity and
//! feeds to synthesis. Every field is optional: the synthetic payload only
//! fills a few of them, and persisted records may predate new fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archetype::Archetype;

/// Facial and skin summary captured during the face phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facial_geometry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_expressions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality_archetype: Option<Archetype>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayNightBehavior {
    Diurnal,
    Nocturnal,
}

/// Habits and context captured during the sensor phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_habits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_night_behavior: Option<DayNightBehavior>,
    pub timestamp: DateTime<Utc>,
}

/// Pitch classification of the captured voice sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoicePitch {
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Mid-range")]
    MidRange,
    #[serde(rename = "Low")]
    Low,
    /// Any tag this build does not recognize.
    #[serde(other)]
    Unclassified,
}

impl VoicePitch {
    /// Classify a free-form pitch tag, ignoring case and separators.
    #[must_use]
    pub fn classify(tag: &str) -> Self {
        let normalized: String = tag
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "high" => Self::High,
            "midrange" | "mid" | "medium" => Self::MidRange,
            "low" => Self::Low,
            _ => Self::Unclassified,
        }
    }
}

/// Summary of the voice phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<VoicePitch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pitch() {
        assert_eq!(VoicePitch::classify("High"), VoicePitch::High);
        assert_eq!(VoicePitch::classify("mid-range"), VoicePitch::MidRange);
        assert_eq!(VoicePitch::classify(" LOW "), VoicePitch::Low);
        assert_eq!(VoicePitch::classify("squeaky"), VoicePitch::Unclassified);
    }

    #[test]
    fn test_unknown_pitch_tag_deserializes() {
        let voice: VoiceProfile =
            serde_json::from_str(r#"{"mood":"Calm","pitch":"Falsetto"}"#).unwrap();
        assert_eq!(voice.pitch, Some(VoicePitch::Unclassified));
    }

    #[test]
    fn test_biometric_keys_are_camel_case() {
        let profile = BiometricProfile {
            facial_geometry: Some("Oval".to_owned()),
            ..BiometricProfile::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"facialGeometry":"Oval"}"#);
    }
}
