//! Session commands.

use pulse_core::Role;
use pulse_lab::navigation::Page;
use pulse_lab::storage::KeyValueStore;
use pulse_lab::{Lab, LabError};
use tracing::{info, warn};

/// Sign in and report the fabricated identity.
///
/// # Errors
///
/// Returns an error if the email is malformed or the identity cannot be stored.
pub fn sign_in<S: KeyValueStore>(lab: &mut Lab<S>, email: &str, role: Role) -> Result<(), LabError> {
    let identity = lab.sign_in(email, role)?;
    info!(
        id = %identity.id(),
        name = identity.name(),
        email = %identity.email(),
        role = %identity.role(),
        "Signed in"
    );
    Ok(())
}

/// Clear the stored session.
///
/// # Errors
///
/// Returns an error if the stored entries cannot be removed.
pub fn sign_out<S: KeyValueStore>(lab: &mut Lab<S>) -> Result<(), LabError> {
    lab.sign_out()
}

/// Report the stored identity, scent DNA and menu.
pub fn status<S: KeyValueStore>(lab: &Lab<S>) {
    match lab.identity() {
        Some(identity) => info!(
            id = %identity.id(),
            name = identity.name(),
            role = %identity.role(),
            consent = identity.sensor_consent(),
            since = %identity.created_at().format("%Y-%m-%d"),
            "Signed in"
        ),
        None => info!("Not signed in"),
    }

    match lab.scent_dna() {
        Some(dna) => info!(archetype = dna.headline(), dna = dna.as_str(), "Scent DNA"),
        None => info!("No scent DNA yet"),
    }

    report_menu(lab);
}

/// Grant or withdraw sensor consent.
///
/// # Errors
///
/// Returns an error without a session or if the change cannot be stored.
pub fn consent<S: KeyValueStore>(lab: &mut Lab<S>, granted: bool) -> Result<(), LabError> {
    lab.set_sensor_consent(granted)?;
    info!(consent = granted, can_scan = lab.can_scan(), "Sensor consent");
    Ok(())
}

fn report_menu<S: KeyValueStore>(lab: &Lab<S>) {
    let current = lab.current_page();
    let menu: Vec<String> = lab
        .nav_items()
        .iter()
        .map(|item| {
            if item.is_active(current) {
                format!("[{}]", item.label)
            } else {
                item.label.to_owned()
            }
        })
        .collect();
    info!(page = %current, menu = %menu.join(" | "), "Navigation");
}

/// Try to open `page` with the stored role.
///
/// # Errors
///
/// Returns [`LabError::AccessDenied`] if the role may not open the page.
pub fn navigate<S: KeyValueStore>(lab: &mut Lab<S>, page: Page) -> Result<(), LabError> {
    if !lab.navigate(page) {
        warn!(%page, "Page requires an admin session");
        return Err(LabError::AccessDenied(page));
    }
    info!(%page, "Opened");
    report_menu(lab);
    Ok(())
}
