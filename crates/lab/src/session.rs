//! Session store: the signed-in identity and its scent-DNA result.
//!
//! Both values live in memory and are mirrored into a [`KeyValueStore`]
//! under two keys. The identity entry is a versioned JSON envelope; the
//! scent-DNA entry is the plain result string.

use chrono::{DateTime, Utc};
use pulse_core::{BehavioralProfile, BiometricProfile, Email, Identity, Role, ScentDna, VoiceProfile};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Storage keys for persisted session data.
pub mod keys {
    /// Key for the JSON identity envelope.
    pub const IDENTITY: &str = "pulse_user";

    /// Key for the plain-text scent-DNA result.
    pub const SCENT_DNA: &str = "pulse_dna";
}

/// Current version of the identity envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A stored entry could not be decoded.
    #[error("malformed persisted state under {key}: {reason}")]
    MalformedState { key: &'static str, reason: String },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityEnvelope {
    schema_version: u32,
    identity: Identity,
}

/// Identity and scent-DNA for the current session.
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
    identity: Option<Identity>,
    scent_dna: Option<ScentDna>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Load the persisted session from `store`.
    ///
    /// Missing, unreadable or malformed entries yield an empty session; the
    /// problem is logged and never surfaced.
    pub fn load(store: S) -> Self {
        let identity = match read_identity(&store) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Ignoring persisted identity");
                None
            }
        };
        let scent_dna = match store.get(keys::SCENT_DNA) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()).map(ScentDna::new),
            Err(e) => {
                warn!(error = %e, "Ignoring persisted scent DNA");
                None
            }
        };

        if let Some(identity) = &identity {
            info!(user_id = %identity.id(), role = %identity.role(), "Restored session");
        }

        Self {
            store,
            identity,
            scent_dna,
        }
    }

    /// Sign in with a fabricated identity for `role`, replacing any existing one.
    ///
    /// No credentials are checked. The previous scent-DNA result is kept, as
    /// only sign-out or a new scan clears or replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be persisted; the in-memory
    /// session is unchanged in that case.
    pub fn sign_in(
        &mut self,
        email: Email,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<&Identity, SessionError> {
        let identity = Identity::fabricate(email, role, now);
        self.write_identity(&identity)?;
        info!(user_id = %identity.id(), role = %role, "Signed in");
        Ok(self.identity.insert(identity))
    }

    /// Clear the session in memory and in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be removed. Memory is cleared
    /// regardless.
    pub fn sign_out(&mut self) -> Result<(), SessionError> {
        if let Some(identity) = self.identity.take() {
            info!(user_id = %identity.id(), "Signed out");
        }
        self.scent_dna = None;
        let identity_removed = self.store.remove(keys::IDENTITY);
        let dna_removed = self.store.remove(keys::SCENT_DNA);
        identity_removed.and(dna_removed)?;
        Ok(())
    }

    /// Grant or withdraw sensor consent on the signed-in identity.
    ///
    /// Returns `false` when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated identity cannot be persisted.
    pub fn set_sensor_consent(&mut self, consent: bool) -> Result<bool, SessionError> {
        let Some(mut identity) = self.identity.clone() else {
            return Ok(false);
        };
        identity.set_sensor_consent(consent);
        self.write_identity(&identity)?;
        info!(user_id = %identity.id(), consent, "Sensor consent updated");
        self.identity = Some(identity);
        Ok(true)
    }

    /// Attach a synthesized result to the session and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be persisted.
    pub fn record_scent_dna(&mut self, dna: ScentDna) -> Result<(), SessionError> {
        self.store.set(keys::SCENT_DNA, dna.as_str())?;
        info!(headline = dna.headline(), "Recorded scent DNA");
        self.scent_dna = Some(dna);
        Ok(())
    }

    /// Store the scan summaries on the signed-in identity.
    ///
    /// Does nothing when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated identity cannot be persisted.
    pub fn attach_profiles(
        &mut self,
        biometric: BiometricProfile,
        behavioral: BehavioralProfile,
        voice: VoiceProfile,
    ) -> Result<(), SessionError> {
        let Some(mut identity) = self.identity.clone() else {
            return Ok(());
        };
        identity.attach_profiles(biometric, behavioral, voice);
        self.write_identity(&identity)?;
        self.identity = Some(identity);
        Ok(())
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn scent_dna(&self) -> Option<&ScentDna> {
        self.scent_dna.as_ref()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Role of the signed-in identity, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(Identity::role)
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn write_identity(&mut self, identity: &Identity) -> Result<(), SessionError> {
        let envelope = IdentityEnvelope {
            schema_version: SCHEMA_VERSION,
            identity: identity.clone(),
        };
        let json = serde_json::to_string(&envelope).map_err(|e| SessionError::MalformedState {
            key: keys::IDENTITY,
            reason: e.to_string(),
        })?;
        self.store.set(keys::IDENTITY, &json)?;
        Ok(())
    }
}

fn read_identity<S: KeyValueStore>(store: &S) -> Result<Option<Identity>, SessionError> {
    let Some(raw) = store.get(keys::IDENTITY)? else {
        return Ok(None);
    };
    let envelope: IdentityEnvelope =
        serde_json::from_str(&raw).map_err(|e| SessionError::MalformedState {
            key: keys::IDENTITY,
            reason: e.to_string(),
        })?;
    if envelope.schema_version != SCHEMA_VERSION {
        return Err(SessionError::MalformedState {
            key: keys::IDENTITY,
            reason: format!("unsupported schema version {}", envelope.schema_version),
        });
    }
    Ok(Some(envelope.identity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_sign_in_then_load_in_fresh_instance() {
        for role in [Role::User, Role::Admin] {
            let mut session = SessionStore::load(MemoryStore::new());
            session.sign_in(email("a@b.com"), role, Utc::now()).unwrap();

            let reloaded = SessionStore::load(session.store().clone());
            let identity = reloaded.identity().unwrap();
            assert_eq!(identity.role(), role);
            assert_eq!(identity.email().as_str(), "a@b.com");
        }
    }

    #[test]
    fn test_sign_in_overwrites_existing_identity() {
        let mut session = SessionStore::load(MemoryStore::new());
        session.sign_in(email("a@b.com"), Role::User, Utc::now()).unwrap();
        session
            .sign_in(email("boss@b.com"), Role::Admin, Utc::now())
            .unwrap();

        let reloaded = SessionStore::load(session.store().clone());
        assert_eq!(reloaded.role(), Some(Role::Admin));
        assert_eq!(
            reloaded.identity().unwrap().email().as_str(),
            "boss@b.com"
        );
    }

    #[test]
    fn test_sign_out_removes_everything() {
        let mut session = SessionStore::load(MemoryStore::new());
        session.sign_in(email("a@b.com"), Role::User, Utc::now()).unwrap();
        session
            .record_scent_dna(ScentDna::new("Obsidian Nomad — test"))
            .unwrap();

        session.sign_out().unwrap();
        assert!(!session.is_signed_in());
        assert!(session.scent_dna().is_none());
        assert!(session.store().is_empty());

        // Signing out of an empty session is fine too.
        session.sign_out().unwrap();
        assert!(session.store().is_empty());
    }

    /// Memory store whose identity entry cannot be removed.
    #[derive(Debug, Default)]
    struct StuckIdentityStore(MemoryStore);

    impl KeyValueStore for StuckIdentityStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            if key == keys::IDENTITY {
                return Err(StorageError::InvalidKey(key.to_owned()));
            }
            self.0.remove(key)
        }
    }

    #[test]
    fn test_sign_out_clears_dna_when_identity_removal_fails() {
        let mut session = SessionStore::load(StuckIdentityStore::default());
        session.sign_in(email("a@b.com"), Role::User, Utc::now()).unwrap();
        session
            .record_scent_dna(ScentDna::new("Obsidian Nomad — test"))
            .unwrap();

        assert!(matches!(session.sign_out(), Err(SessionError::Storage(_))));
        assert!(session.store().get(keys::SCENT_DNA).unwrap().is_none());
        assert!(session.store().get(keys::IDENTITY).unwrap().is_some());
        assert!(!session.is_signed_in());
    }

    #[test]
    fn test_consent_change_is_persisted() {
        let mut session = SessionStore::load(MemoryStore::new());
        assert!(!session.set_sensor_consent(false).unwrap());

        session.sign_in(email("a@b.com"), Role::User, Utc::now()).unwrap();
        assert!(session.identity().unwrap().sensor_consent());
        assert!(session.set_sensor_consent(false).unwrap());

        let reloaded = SessionStore::load(session.store().clone());
        assert!(!reloaded.identity().unwrap().sensor_consent());
    }

    #[test]
    fn test_malformed_identity_yields_empty_session() {
        let mut store = MemoryStore::new();
        store.set(keys::IDENTITY, "{not json").unwrap();
        store.set(keys::SCENT_DNA, "Solar Alchemist — x").unwrap();

        let session = SessionStore::load(store);
        assert!(!session.is_signed_in());
        assert_eq!(session.scent_dna().unwrap().headline(), "Solar Alchemist");
    }

    #[test]
    fn test_unknown_schema_version_is_malformed() {
        let mut seeded = SessionStore::load(MemoryStore::new());
        seeded.sign_in(email("a@b.com"), Role::User, Utc::now()).unwrap();
        let raw = seeded.store().get(keys::IDENTITY).unwrap().unwrap();
        let bumped = raw.replacen("\"schema_version\":1", "\"schema_version\":99", 1);

        let mut store = MemoryStore::new();
        store.set(keys::IDENTITY, &bumped).unwrap();
        assert!(matches!(
            read_identity(&store),
            Err(SessionError::MalformedState { .. })
        ));
        assert!(!SessionStore::load(store).is_signed_in());
    }

    #[test]
    fn test_record_scent_dna_persists_plain_string() {
        let mut session = SessionStore::load(MemoryStore::new());
        session
            .record_scent_dna(ScentDna::new("Solar Alchemist — UV"))
            .unwrap();
        assert_eq!(
            session.store().get(keys::SCENT_DNA).unwrap().as_deref(),
            Some("Solar Alchemist — UV")
        );
    }
}
