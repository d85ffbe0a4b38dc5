//! Page routing gated by identity role.

use core::fmt;
use std::str::FromStr;

use pulse_core::Role;
use thiserror::Error;
use tracing::debug;

/// Error returned for an unknown page identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page: {0}")]
pub struct PageParseError(pub String);

/// The closed set of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Landing,
    Login,
    Discover,
    Scanner,
    Profile,
    Recommendations,
    AdminDashboard,
    MarketInsights,
}

impl Page {
    pub const ALL: [Self; 8] = [
        Self::Landing,
        Self::Login,
        Self::Discover,
        Self::Scanner,
        Self::Profile,
        Self::Recommendations,
        Self::AdminDashboard,
        Self::MarketInsights,
    ];

    /// String identifier of the page.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Login => "login",
            Self::Discover => "discover",
            Self::Scanner => "scanner",
            Self::Profile => "profile",
            Self::Recommendations => "recommendations",
            Self::AdminDashboard => "admin-dashboard",
            Self::MarketInsights => "market-insights",
        }
    }

    /// Whether only admins may open this page.
    #[must_use]
    pub const fn is_admin_only(self) -> bool {
        matches!(self, Self::AdminDashboard | Self::MarketInsights)
    }

    /// Access predicate for the signed-in role (`None` when signed out).
    #[must_use]
    pub fn is_accessible(self, role: Option<Role>) -> bool {
        !self.is_admin_only() || role.is_some_and(Role::is_admin)
    }

    /// Pages belonging to the DNA section of the menu.
    #[must_use]
    pub const fn is_dna_section(self) -> bool {
        matches!(self, Self::Profile | Self::Recommendations)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = PageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| PageParseError(s.to_owned()))
    }
}

/// A header menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub page: Page,
    pub label: &'static str,
}

impl NavItem {
    /// Whether the entry is highlighted while `current` is open.
    ///
    /// The DNA entry covers both the profile and recommendations pages.
    #[must_use]
    pub fn is_active(&self, current: Page) -> bool {
        if self.page.is_dna_section() {
            current.is_dna_section()
        } else {
            self.page == current
        }
    }
}

/// Holds the current page.
///
/// Navigation is a free graph: any accessible page can be reached from any
/// other page.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Page,
}

impl Navigator {
    /// Start on the landing page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> Page {
        self.current
    }

    /// Move to `page` if `role` may open it.
    ///
    /// Returns `false` and leaves the current page unchanged otherwise.
    pub fn navigate(&mut self, page: Page, role: Option<Role>) -> bool {
        if !page.is_accessible(role) {
            debug!(page = %page, from = %self.current, "Navigation refused");
            return false;
        }
        if self.current != page {
            debug!(page = %page, from = %self.current, "Navigated");
        }
        self.current = page;
        true
    }
}

/// Destination of the landing page's call to action.
#[must_use]
pub const fn landing_target(role: Option<Role>, has_scent_dna: bool) -> Page {
    match role {
        None => Page::Login,
        Some(Role::Admin) => Page::AdminDashboard,
        Some(Role::User) if has_scent_dna => Page::Recommendations,
        Some(Role::User) => Page::Profile,
    }
}

/// Header menu for the signed-in role.
#[must_use]
pub fn nav_items(role: Option<Role>, has_scent_dna: bool) -> Vec<NavItem> {
    if role.is_some_and(Role::is_admin) {
        return vec![
            NavItem {
                page: Page::AdminDashboard,
                label: "COMMAND",
            },
            NavItem {
                page: Page::MarketInsights,
                label: "INSIGHTS",
            },
        ];
    }
    vec![
        NavItem {
            page: Page::Discover,
            label: "DISCOVER",
        },
        NavItem {
            page: Page::Scanner,
            label: "SCANNER",
        },
        NavItem {
            page: if has_scent_dna {
                Page::Recommendations
            } else {
                Page::Profile
            },
            label: "DNA",
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_ids_round_trip() {
        for page in Page::ALL {
            assert_eq!(page.as_str().parse::<Page>().unwrap(), page);
        }
        assert!("premium".parse::<Page>().is_err());
    }

    #[test]
    fn test_dna_entry_active_on_both_dna_pages() {
        let items = nav_items(Some(Role::User), false);
        let dna = items.iter().find(|item| item.label == "DNA").unwrap();
        assert_eq!(dna.page, Page::Profile);
        assert!(dna.is_active(Page::Profile));
        assert!(dna.is_active(Page::Recommendations));
        assert!(!dna.is_active(Page::Scanner));

        let active: Vec<&str> = items
            .iter()
            .filter(|item| item.is_active(Page::Scanner))
            .map(|item| item.label)
            .collect();
        assert_eq!(active, ["SCANNER"]);
    }

    #[test]
    fn test_admin_pages_refused_for_non_admins() {
        let mut nav = Navigator::new();
        assert!(nav.navigate(Page::Discover, Some(Role::User)));

        assert!(!nav.navigate(Page::AdminDashboard, Some(Role::User)));
        assert!(!nav.navigate(Page::MarketInsights, None));
        assert_eq!(nav.current(), Page::Discover);

        assert!(nav.navigate(Page::MarketInsights, Some(Role::Admin)));
        assert_eq!(nav.current(), Page::MarketInsights);
    }

    #[test]
    fn test_landing_target() {
        assert_eq!(landing_target(None, true), Page::Login);
        assert_eq!(landing_target(Some(Role::Admin), false), Page::AdminDashboard);
        assert_eq!(landing_target(Some(Role::User), false), Page::Profile);
        assert_eq!(landing_target(Some(Role::User), true), Page::Recommendations);
    }

    #[test]
    fn test_nav_items_follow_role() {
        let admin: Vec<_> = nav_items(Some(Role::Admin), false)
            .into_iter()
            .map(|item| item.page)
            .collect();
        assert_eq!(admin, [Page::AdminDashboard, Page::MarketInsights]);

        let user = nav_items(Some(Role::User), true);
        assert_eq!(user.last().unwrap().page, Page::Recommendations);
    }
}
