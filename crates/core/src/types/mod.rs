//! Core types for the Pulse scent lab.
//!
//! This module provides type-safe wrappers and records for the lab's domain.

pub mod archetype;
pub mod email;
pub mod fragrance;
pub mod id;
pub mod identity;
pub mod price;
pub mod profile;
pub mod role;

pub use archetype::{Archetype, ScentDna};
pub use email::{Email, EmailError};
pub use fragrance::Fragrance;
pub use id::*;
pub use identity::Identity;
pub use price::{CurrencyCode, Price};
pub use profile::{
    ActivityLevel, BehavioralProfile, BiometricProfile, DayNightBehavior, VoicePitch,
    VoiceProfile,
};
pub use role::{AccountStatus, Role, RoleParseError};
