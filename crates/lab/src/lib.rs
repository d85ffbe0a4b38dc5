//! Pulse Lab engine.
//!
//! Session persistence, page routing, the biometric scan state machine and
//! the simulated synthesis and recognition services behind the lab front
//! ends. [`Lab`] ties them together; the modules can also be used on their
//! own.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod media;
pub mod navigation;
pub mod scan;
pub mod session;
pub mod state;
pub mod storage;
pub mod synthesis;
pub mod vision;

pub use config::LabConfig;
pub use error::LabError;
pub use state::{Applied, Lab, SessionTicket};
