//! Role and account status enums.

use serde::{Deserialize, Serialize};

/// Error returned when a role tag cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0} (expected USER or ADMIN)")]
pub struct RoleParseError(pub String);

/// Identity role.
///
/// Persisted with the same upper-case tags the lab has always written
/// (`"USER"`, `"ADMIN"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A client running scans and browsing the catalog.
    #[default]
    User,
    /// Access to the command center and market insights.
    Admin,
}

impl Role {
    /// Whether this role may open admin-only pages.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "USER"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" | "CLIENT" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// Account status as managed from the admin directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

impl AccountStatus {
    /// The opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Suspended,
            Self::Suspended => Self::Active,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!("client".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_tags() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(AccountStatus::Active.toggled(), AccountStatus::Suspended);
        assert_eq!(AccountStatus::Suspended.toggled(), AccountStatus::Active);
    }
}
