//! Signed-in identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::profile::{BehavioralProfile, BiometricProfile, VoiceProfile};
use super::role::Role;

/// A lab identity.
///
/// Identities are fabricated on the client at sign-in; nothing is verified.
/// The role is fixed at construction and has no setter. The JSON shape uses
/// camelCase keys so previously persisted records keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    id: UserId,
    email: Email,
    name: String,
    image: String,
    role: Role,
    sensor_consent: bool,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    biometric_profile: Option<BiometricProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    behavioral_profile: Option<BehavioralProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice_profile: Option<VoiceProfile>,
}

impl Identity {
    /// Create an identity with no profile summaries attached.
    #[must_use]
    pub fn new(
        id: UserId,
        email: Email,
        name: impl Into<String>,
        image: impl Into<String>,
        role: Role,
        sensor_consent: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            image: image.into(),
            role,
            sensor_consent,
            created_at,
            biometric_profile: None,
            behavioral_profile: None,
            voice_profile: None,
        }
    }

    /// Fabricate the deterministic sign-in identity for a role.
    ///
    /// Each role maps to a fixed id, display name and avatar; only the email
    /// and creation time vary. Sensor consent is granted at sign-in.
    #[must_use]
    pub fn fabricate(email: Email, role: Role, now: DateTime<Utc>) -> Self {
        let (id, name, image) = match role {
            Role::Admin => (
                "adm_001",
                "Admin Architect",
                "https://i.pravatar.cc/150?u=admin",
            ),
            Role::User => (
                "usr_123",
                "Julian de Luxe",
                "https://i.pravatar.cc/150?u=luxe123",
            ),
        };
        Self::new(UserId::new(id), email, name, image, role, true, now)
    }

    /// Attach a biometric summary (builder style, for seeded records).
    #[must_use]
    pub fn with_biometric_profile(mut self, profile: BiometricProfile) -> Self {
        self.biometric_profile = Some(profile);
        self
    }

    /// Record the summaries produced by a completed scan.
    pub fn attach_profiles(
        &mut self,
        biometric: BiometricProfile,
        behavioral: BehavioralProfile,
        voice: VoiceProfile,
    ) {
        self.biometric_profile = Some(biometric);
        self.behavioral_profile = Some(behavioral);
        self.voice_profile = Some(voice);
    }

    /// Withdraw or grant sensor consent.
    pub const fn set_sensor_consent(&mut self, consent: bool) {
        self.sensor_consent = consent;
    }

    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Avatar image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn sensor_consent(&self) -> bool {
        self.sensor_consent
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn biometric_profile(&self) -> Option<&BiometricProfile> {
        self.biometric_profile.as_ref()
    }

    #[must_use]
    pub const fn behavioral_profile(&self) -> Option<&BehavioralProfile> {
        self.behavioral_profile.as_ref()
    }

    #[must_use]
    pub const fn voice_profile(&self) -> Option<&VoiceProfile> {
        self.voice_profile.as_ref()
    }
}
