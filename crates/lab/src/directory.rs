//! Admin user directory.
//!
//! A fixed set of seeded users with per-session suspension flags. Nothing
//! here is persisted; suspensions reset with the process.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use pulse_core::{AccountStatus, Archetype, BiometricProfile, Email, Identity, Role, UserId};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::contains_ignore_case;

/// Error returned for an archetype filter that names no archetype.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown archetype: {0}")]
pub struct UnknownArchetype(pub String);

/// Archetype restriction for [`Directory::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchetypeFilter {
    #[default]
    All,
    Only(Archetype),
}

impl ArchetypeFilter {
    /// Whether a user's biometric summary passes the filter.
    ///
    /// Users without a recorded archetype only pass `All`.
    #[must_use]
    pub fn matches(self, profile: Option<&BiometricProfile>) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => {
                profile.and_then(|p| p.personality_archetype) == Some(wanted)
            }
        }
    }
}

impl FromStr for ArchetypeFilter {
    type Err = UnknownArchetype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Archetype::from_name(s)
            .map(Self::Only)
            .ok_or_else(|| UnknownArchetype(s.to_owned()))
    }
}

struct Seed {
    id: &'static str,
    email: &'static str,
    name: &'static str,
    joined: (i32, u32, u32),
    geometry: &'static str,
    expression: &'static str,
    skin: &'static str,
    archetype: Archetype,
}

const SEEDS: [Seed; 5] = [
    Seed {
        id: "usr_101",
        email: "clara.v@luxe.fr",
        name: "Clara Valmont",
        joined: (2024, 1, 12),
        geometry: "Diamond",
        expression: "Harmonious",
        skin: "Dewy",
        archetype: Archetype::SolarAlchemist,
    },
    Seed {
        id: "usr_102",
        email: "marcus.k@berlin.de",
        name: "Marcus Kessler",
        joined: (2024, 2, 5),
        geometry: "Square",
        expression: "Stoic",
        skin: "Matte",
        archetype: Archetype::ObsidianNomad,
    },
    Seed {
        id: "usr_103",
        email: "yuki.s@tokyo.jp",
        name: "Yuki Sato",
        joined: (2024, 2, 18),
        geometry: "Oval",
        expression: "Dynamic",
        skin: "Balanced",
        archetype: Archetype::CyberOud,
    },
    Seed {
        id: "usr_104",
        email: "elena.r@milan.it",
        name: "Elena Rossi",
        joined: (2024, 3, 1),
        geometry: "Heart",
        expression: "Warm",
        skin: "Radiant",
        archetype: Archetype::VelvetMinimalist,
    },
    Seed {
        id: "usr_105",
        email: "jean.p@luxe.fr",
        name: "Jean Pierre",
        joined: (2024, 3, 10),
        geometry: "Square",
        expression: "Controlled",
        skin: "Rugged",
        archetype: Archetype::ObsidianNomad,
    },
];

impl Seed {
    fn identity(&self) -> Option<Identity> {
        let (year, month, day) = self.joined;
        let created_at = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(0, 0, 0)?
            .and_utc();
        let email = Email::parse(self.email).ok()?;
        let avatar_key = self.name.split(' ').next().unwrap_or(self.id).to_lowercase();

        let identity = Identity::new(
            UserId::new(self.id),
            email,
            self.name,
            format!("https://i.pravatar.cc/150?u={avatar_key}"),
            Role::User,
            true,
            created_at,
        )
        .with_biometric_profile(BiometricProfile {
            facial_geometry: Some(self.geometry.to_owned()),
            micro_expressions: Some(self.expression.to_owned()),
            skin_texture: Some(self.skin.to_owned()),
            personality_archetype: Some(self.archetype),
        });
        Some(identity)
    }
}

/// Users visible from the admin dashboard.
#[derive(Debug, Clone)]
pub struct Directory {
    users: Vec<Identity>,
    suspended: HashSet<UserId>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Directory {
    #[must_use]
    pub fn new(users: Vec<Identity>) -> Self {
        Self {
            users,
            suspended: HashSet::new(),
        }
    }

    /// The five seeded lab users.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(SEEDS.iter().filter_map(Seed::identity).collect())
    }

    #[must_use]
    pub fn all(&self) -> &[Identity] {
        &self.users
    }

    /// Users whose name, email or id contains `query` (ignoring case) and
    /// whose archetype passes `filter`, in seed order.
    #[must_use]
    pub fn search(&self, query: &str, filter: ArchetypeFilter) -> Vec<&Identity> {
        let query = query.trim();
        let results: Vec<&Identity> = self
            .users
            .iter()
            .filter(|user| {
                contains_ignore_case(user.name(), query)
                    || contains_ignore_case(user.email().as_str(), query)
                    || contains_ignore_case(user.id().as_str(), query)
            })
            .filter(|user| filter.matches(user.biometric_profile()))
            .collect();
        debug!(query, ?filter, results = results.len(), "Directory search");
        results
    }

    /// Flip a user between active and suspended.
    ///
    /// Returns the new status, or `None` for an id not in the directory.
    pub fn toggle_suspension(&mut self, id: &UserId) -> Option<AccountStatus> {
        if !self.users.iter().any(|user| user.id() == id) {
            return None;
        }
        let status = self.status(id).toggled();
        match status {
            AccountStatus::Suspended => self.suspended.insert(id.clone()),
            AccountStatus::Active => self.suspended.remove(id),
        };
        info!(user_id = %id, ?status, "Account status changed");
        Some(status)
    }

    #[must_use]
    pub fn status(&self, id: &UserId) -> AccountStatus {
        if self.suspended.contains(id) {
            AccountStatus::Suspended
        } else {
            AccountStatus::Active
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ids(results: &[&Identity]) -> Vec<String> {
        results.iter().map(|u| u.id().to_string()).collect()
    }

    #[test]
    fn test_seeded_directory() {
        let directory = Directory::seeded();
        assert_eq!(directory.all().len(), 5);
        let clara = directory.all().first().unwrap();
        assert_eq!(clara.name(), "Clara Valmont");
        assert_eq!(clara.image(), "https://i.pravatar.cc/150?u=clara");
        assert_eq!(clara.created_at().to_rfc3339(), "2024-01-12T00:00:00+00:00");
    }

    #[test]
    fn test_search_by_name_email_and_id() {
        let directory = Directory::seeded();
        assert_eq!(ids(&directory.search("luxe.fr", ArchetypeFilter::All)), ["usr_101", "usr_105"]);
        assert_eq!(ids(&directory.search("YUKI", ArchetypeFilter::All)), ["usr_103"]);
        assert_eq!(ids(&directory.search("usr_104", ArchetypeFilter::All)), ["usr_104"]);
        assert_eq!(directory.search("", ArchetypeFilter::All).len(), 5);
    }

    #[test]
    fn test_archetype_filter_combines_with_query() {
        let directory = Directory::seeded();
        let nomads = ArchetypeFilter::Only(Archetype::ObsidianNomad);
        assert_eq!(ids(&directory.search("", nomads)), ["usr_102", "usr_105"]);
        assert_eq!(ids(&directory.search("jean", nomads)), ["usr_105"]);
        assert!(directory.search("clara", nomads).is_empty());
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("All".parse::<ArchetypeFilter>().unwrap(), ArchetypeFilter::All);
        assert_eq!(
            "cyber oud".parse::<ArchetypeFilter>().unwrap(),
            ArchetypeFilter::Only(Archetype::CyberOud)
        );
        assert!("Aquatic".parse::<ArchetypeFilter>().is_err());
    }

    #[test]
    fn test_toggle_suspension() {
        let mut directory = Directory::seeded();
        let marcus = UserId::new("usr_102");

        assert_eq!(directory.status(&marcus), AccountStatus::Active);
        assert_eq!(directory.toggle_suspension(&marcus), Some(AccountStatus::Suspended));
        assert_eq!(directory.status(&marcus), AccountStatus::Suspended);
        assert_eq!(directory.toggle_suspension(&marcus), Some(AccountStatus::Active));

        assert_eq!(directory.toggle_suspension(&UserId::new("usr_999")), None);
    }
}
