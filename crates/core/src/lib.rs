//! Pulse Core - Shared domain types for the scent lab.
//!
//! This crate provides the types used across all Pulse components:
//! - `lab` - Session store, navigation, scan state machine and services
//! - `cli` - Terminal front end driving the lab
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no timers, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identity, fragrance and profile records plus newtype wrappers
//!   for ids, emails and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
