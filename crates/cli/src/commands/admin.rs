//! Admin directory commands.
//!
//! Suspensions are not persisted; they only affect the listing printed by
//! the same invocation.

use pulse_core::{AccountStatus, UserId};
use pulse_lab::directory::ArchetypeFilter;
use pulse_lab::navigation::Page;
use pulse_lab::storage::KeyValueStore;
use pulse_lab::{Lab, LabError};
use tracing::{info, warn};

/// Search the directory, optionally toggling suspensions first.
///
/// # Errors
///
/// Returns [`LabError::AccessDenied`] unless an admin is signed in.
pub fn users<S: KeyValueStore>(
    lab: &mut Lab<S>,
    query: &str,
    filter: ArchetypeFilter,
    suspend: &[String],
) -> Result<(), LabError> {
    if !lab.navigate(Page::AdminDashboard) {
        return Err(LabError::AccessDenied(Page::AdminDashboard));
    }

    for id in suspend {
        let id = UserId::new(id.as_str());
        match lab.directory_mut().toggle_suspension(&id) {
            Some(status) => info!(user_id = %id, ?status, "Toggled suspension"),
            None => warn!(user_id = %id, "No such user"),
        }
    }

    let directory = lab.directory();
    let results = directory.search(query, filter);
    info!(results = results.len(), "Directory");
    for user in results {
        let archetype = user
            .biometric_profile()
            .and_then(|profile| profile.personality_archetype)
            .map_or("Unclassified", |archetype| archetype.name());
        let status = match directory.status(user.id()) {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "SUSPENDED",
        };
        info!(
            id = %user.id(),
            email = %user.email(),
            archetype,
            status,
            "{}",
            user.name()
        );
    }
    Ok(())
}
