//! Unified error type for lab operations.

use pulse_core::{EmailError, FragranceId};
use thiserror::Error;

use crate::navigation::Page;
use crate::scan::ScanError;
use crate::session::SessionError;

/// Errors returned by [`crate::Lab`] and the operations it wraps.
#[derive(Debug, Error)]
pub enum LabError {
    /// Session persistence failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The scan could not be started or driven.
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// The sign-in email was rejected.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// The operation needs a signed-in identity.
    #[error("Not signed in")]
    NotSignedIn,

    /// The role may not open the page.
    #[error("Access to {0} refused")]
    AccessDenied(Page),

    /// No catalog entry has this id.
    #[error("Unknown fragrance: {0}")]
    UnknownFragrance(FragranceId),

    /// There is no identified or selected fragrance to act on.
    #[error("No fragrance has been identified")]
    NothingScanned,
}
