//! Biometric scan state machine.
//!
//! ```text
//! Idle --start--> Face --100%--> Sensor --100%--> Voice --100%--> Completing --settle--> Done
//!   \               |
//!    \-- acquisition fails --> Error --retry--> Face
//! ```
//!
//! The machine is passive: [`ScanMachine::tick`] advances progress by one
//! step and [`ScanMachine::complete`] hands out the payload once the settle
//! delay has elapsed. [`ScanDriver`] supplies the clock.
//!
//! The media capability is held only in `Face`, `Sensor` and `Voice`. It is
//! dropped on the tick that leaves `Voice`, before a retry re-acquires, and
//! when the machine itself is dropped.

mod driver;

use core::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulse_core::{
    ActivityLevel, BehavioralProfile, BiometricProfile, DayNightBehavior, VoicePitch,
    VoiceProfile,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::media::{AcquisitionError, MediaConstraints, MediaDevice};

pub use driver::ScanDriver;

/// Upper bound of the per-phase progress counter.
pub const PROGRESS_MAX: u8 = 100;

/// Timer settings for a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    /// Interval between progress ticks.
    pub tick: Duration,
    /// Delay between entering `Completing` and delivering the payload.
    pub settle: Duration,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(80),
            settle: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Face,
    Sensor,
    Voice,
    Completing,
    Done,
    Error,
}

impl ScanPhase {
    /// Progress added per tick, for the capture phases.
    #[must_use]
    pub const fn step(self) -> Option<u8> {
        match self {
            Self::Face => Some(2),
            Self::Sensor => Some(3),
            Self::Voice => Some(5),
            _ => None,
        }
    }

    /// Whether the phase requires an open media capability.
    #[must_use]
    pub const fn is_capturing(self) -> bool {
        matches!(self, Self::Face | Self::Sensor | Self::Voice)
    }

    /// Whether `start` is allowed from this phase.
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Face => "FACE",
            Self::Sensor => "SENSOR",
            Self::Voice => "VOICE",
            Self::Completing => "COMPLETING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Observable result of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    Progressed { phase: ScanPhase, progress: u8 },
    PhaseChanged { from: ScanPhase, to: ScanPhase },
}

/// Summaries delivered when a scan completes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPayload {
    pub biometrics: BiometricProfile,
    pub behavior: BehavioralProfile,
    pub voice: VoiceProfile,
}

impl ScanPayload {
    /// The fixed payload produced by the simulated capture.
    #[must_use]
    pub fn synthetic(now: DateTime<Utc>) -> Self {
        Self {
            biometrics: BiometricProfile {
                facial_geometry: Some("Symmetrical".to_owned()),
                micro_expressions: Some("Confident".to_owned()),
                skin_texture: Some("Hydrated".to_owned()),
                personality_archetype: None,
            },
            behavior: BehavioralProfile {
                usage_habits: None,
                activity_level: Some(ActivityLevel::Medium),
                day_night_behavior: Some(DayNightBehavior::Diurnal),
                timestamp: now,
            },
            voice: VoiceProfile {
                mood: Some("Enthusiastic".to_owned()),
                pitch: Some(VoicePitch::MidRange),
                tempo: None,
            },
        }
    }
}

/// Errors returned by scan operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The identity has not granted sensor consent.
    #[error("sensor consent is required before scanning")]
    ConsentRequired,

    /// The requested action does not apply to the current phase.
    #[error("cannot {action} while in phase {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: ScanPhase,
    },

    /// The camera/microphone could not be opened.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}

/// One scan run over a media device.
pub struct ScanMachine<D: MediaDevice> {
    device: D,
    constraints: MediaConstraints,
    phase: ScanPhase,
    progress: u8,
    capability: Option<D::Capability>,
    error: Option<AcquisitionError>,
    run_id: Uuid,
}

impl<D: MediaDevice> ScanMachine<D> {
    /// A machine in `Idle` using the default camera+microphone constraints.
    #[must_use]
    pub fn new(device: D) -> Self {
        Self::with_constraints(device, MediaConstraints::default())
    }

    #[must_use]
    pub fn with_constraints(device: D, constraints: MediaConstraints) -> Self {
        Self {
            device,
            constraints,
            phase: ScanPhase::Idle,
            progress: 0,
            capability: None,
            error: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Begin a run: enter `Face` and acquire the capability.
    ///
    /// Allowed from `Idle` and `Error`. The machine is borrowed mutably for
    /// the whole acquisition, so a second acquisition cannot overlap it.
    /// Dropping the returned future before the device answers puts the
    /// machine back in `Idle`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::InvalidPhase`] when a run is already in progress or done
    /// - [`ScanError::ConsentRequired`] when `consent` is false
    /// - [`ScanError::Acquisition`] when the device refuses; the machine is
    ///   then in `Error` and can be retried
    #[instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn start(&mut self, consent: bool) -> Result<(), ScanError> {
        if !self.phase.can_start() {
            return Err(ScanError::InvalidPhase {
                action: "start",
                phase: self.phase,
            });
        }
        if !consent {
            return Err(ScanError::ConsentRequired);
        }

        self.release();
        self.run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(self.run_id));
        self.enter(ScanPhase::Face, 0);
        self.error = None;

        let acquired = {
            let mut pending = PendingAcquisition {
                phase: &mut self.phase,
                progress: &mut self.progress,
                run_id: self.run_id,
                armed: true,
            };
            let acquired = self.device.acquire(&self.constraints).await;
            pending.armed = false;
            acquired
        };
        match acquired {
            Ok(capability) => {
                info!("Media capability acquired");
                self.capability = Some(capability);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, permission = e.is_permission_related(), "Media acquisition failed");
                self.enter(ScanPhase::Error, 0);
                self.error = Some(e.clone());
                Err(ScanError::Acquisition(e))
            }
        }
    }

    /// Re-attempt acquisition after a failure.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidPhase`] unless the machine is in `Error`,
    /// otherwise the same errors as [`ScanMachine::start`].
    pub async fn retry(&mut self, consent: bool) -> Result<(), ScanError> {
        if self.phase != ScanPhase::Error {
            return Err(ScanError::InvalidPhase {
                action: "retry",
                phase: self.phase,
            });
        }
        self.start(consent).await
    }

    /// Advance by one timer tick.
    ///
    /// In a capture phase, progress grows by the phase step (clamped at
    /// 100). A tick that finds progress already at 100 moves to the next
    /// phase; leaving `Voice` releases the capability and pins progress at
    /// 100 for `Completing`. Returns `None` outside capture phases.
    pub fn tick(&mut self) -> Option<ScanEvent> {
        let step = self.phase.step()?;
        if self.capability.is_none() {
            return None;
        }

        if self.progress < PROGRESS_MAX {
            self.progress = self.progress.saturating_add(step).min(PROGRESS_MAX);
            return Some(ScanEvent::Progressed {
                phase: self.phase,
                progress: self.progress,
            });
        }

        let from = self.phase;
        let to = match from {
            ScanPhase::Face => ScanPhase::Sensor,
            ScanPhase::Sensor => ScanPhase::Voice,
            _ => ScanPhase::Completing,
        };
        if to == ScanPhase::Completing {
            self.release();
            self.enter(to, PROGRESS_MAX);
        } else {
            self.enter(to, 0);
        }
        Some(ScanEvent::PhaseChanged { from, to })
    }

    /// Deliver the payload after the settle delay.
    ///
    /// Returns `Some` exactly once per successful run, moving to `Done`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Option<ScanPayload> {
        if self.phase != ScanPhase::Completing {
            return None;
        }
        self.enter(ScanPhase::Done, PROGRESS_MAX);
        info!(run_id = %self.run_id, "Scan complete");
        Some(ScanPayload::synthetic(now))
    }

    /// Release the capability if one is held. Returns whether one was.
    pub fn release(&mut self) -> bool {
        match self.capability.take() {
            Some(capability) => {
                drop(capability);
                debug!(run_id = %self.run_id, phase = %self.phase, "Media capability released");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Progress within the current phase, `0..=100`.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// The acquisition failure while in `Error`.
    #[must_use]
    pub const fn error(&self) -> Option<&AcquisitionError> {
        self.error.as_ref()
    }

    #[must_use]
    pub const fn holds_capability(&self) -> bool {
        self.capability.is_some()
    }

    /// Identifier of the current run, for log correlation.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn enter(&mut self, phase: ScanPhase, progress: u8) {
        if self.phase != phase {
            debug!(run_id = %self.run_id, from = %self.phase, to = %phase, "Scan phase");
        }
        self.phase = phase;
        self.progress = progress;
    }
}

/// Rolls an interrupted acquisition back to `Idle`.
struct PendingAcquisition<'a> {
    phase: &'a mut ScanPhase,
    progress: &'a mut u8,
    run_id: Uuid,
    armed: bool,
}

impl Drop for PendingAcquisition<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(run_id = %self.run_id, "Media acquisition cancelled");
            *self.phase = ScanPhase::Idle;
            *self.progress = 0;
        }
    }
}

impl<D: MediaDevice> fmt::Debug for ScanMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanMachine")
            .field("run_id", &self.run_id)
            .field("phase", &self.phase)
            .field("progress", &self.progress)
            .field("holds_capability", &self.capability.is_some())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<D: MediaDevice> Drop for ScanMachine<D> {
    fn drop(&mut self) {
        if self.release() {
            debug!(run_id = %self.run_id, "Released capability on teardown");
        }
    }
}
