//! Camera and microphone capability.
//!
//! A [`MediaDevice`] hands out a capability handle; the handle is released
//! by dropping it. The scan state machine is the only owner of a handle, so
//! "release exactly once" falls out of ownership.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

/// Why a capability could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The user (or platform policy) declined camera/microphone access.
    #[error("media permission denied")]
    PermissionDenied,

    /// The device could not be initialised.
    #[error("media device error: {0}")]
    Device(String),
}

impl AcquisitionError {
    /// Whether the failure is a permission refusal rather than a device fault.
    #[must_use]
    pub const fn is_permission_related(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }

    /// Message shown next to the retry action.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Access denied. Please enable camera/mic in browser settings."
            }
            Self::Device(_) => "Sensor initialization failed. Please try again.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// What the scan asks the device for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for MediaConstraints {
    /// Front camera at 1280x720 with audio.
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            ideal_width: 1280,
            ideal_height: 720,
            audio: true,
        }
    }
}

/// Source of camera/microphone capabilities.
pub trait MediaDevice {
    /// Open capability. Dropping it stops every track.
    type Capability: Send;

    /// Request access matching `constraints`.
    fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> impl Future<Output = Result<Self::Capability, AcquisitionError>> + Send;
}

/// Scripted outcome for a [`SimulatedDevice`] acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOutcome {
    Grant,
    Deny,
    Fail(String),
}

#[derive(Debug, Default)]
struct DeviceCounters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// In-process device that grants or refuses according to a script.
///
/// Once the script is exhausted every request is granted. Clones share the
/// script and the acquire/release counters.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    script: Arc<Mutex<VecDeque<DeviceOutcome>>>,
    counters: Arc<DeviceCounters>,
}

impl SimulatedDevice {
    /// A device that always grants access.
    #[must_use]
    pub fn granting() -> Self {
        Self::default()
    }

    /// A device that plays `outcomes` in order before granting.
    #[must_use]
    pub fn scripted(outcomes: impl IntoIterator<Item = DeviceOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            counters: Arc::default(),
        }
    }

    /// Number of capabilities handed out.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    /// Number of capabilities released.
    #[must_use]
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Capabilities currently open.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    fn next_outcome(&self) -> DeviceOutcome {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(DeviceOutcome::Grant)
    }
}

impl MediaDevice for SimulatedDevice {
    type Capability = SimulatedCapability;

    fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> impl Future<Output = Result<Self::Capability, AcquisitionError>> + Send {
        let outcome = self.next_outcome();
        let counters = Arc::clone(&self.counters);
        let audio = constraints.audio;
        async move {
            match outcome {
                DeviceOutcome::Grant => {
                    counters.acquired.fetch_add(1, Ordering::SeqCst);
                    let mut tracks = vec![TrackKind::Video];
                    if audio {
                        tracks.push(TrackKind::Audio);
                    }
                    Ok(SimulatedCapability { tracks, counters })
                }
                DeviceOutcome::Deny => Err(AcquisitionError::PermissionDenied),
                DeviceOutcome::Fail(reason) => Err(AcquisitionError::Device(reason)),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Capability handed out by [`SimulatedDevice`].
#[derive(Debug)]
pub struct SimulatedCapability {
    tracks: Vec<TrackKind>,
    counters: Arc<DeviceCounters>,
}

impl SimulatedCapability {
    #[must_use]
    pub fn tracks(&self) -> &[TrackKind] {
        &self.tracks
    }
}

impl Drop for SimulatedCapability {
    fn drop(&mut self) {
        for track in &self.tracks {
            debug!(?track, "Stopped track");
        }
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}
