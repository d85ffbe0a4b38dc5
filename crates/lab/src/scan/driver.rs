//! Clock for a scan run.

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, instrument};

use super::{ScanError, ScanEvent, ScanMachine, ScanPayload, ScanPhase, ScanTiming};
use crate::media::MediaDevice;

/// Drives a [`ScanMachine`] with `tokio::time`.
///
/// Under a paused runtime clock (`#[tokio::test(start_paused = true)]`) a
/// whole run completes instantly and deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanDriver {
    timing: ScanTiming,
}

impl ScanDriver {
    #[must_use]
    pub const fn new(timing: ScanTiming) -> Self {
        Self { timing }
    }

    #[must_use]
    pub const fn timing(&self) -> ScanTiming {
        self.timing
    }

    /// Start (or retry) the machine and run it to completion.
    ///
    /// `observe` sees every tick event. `on_complete` receives the payload
    /// after the settle delay; taking it by `FnOnce` means it cannot fire
    /// twice. Dropping the returned future stops the run, and the capability
    /// stays with the machine until it is dropped or released.
    ///
    /// # Errors
    ///
    /// Returns the error from [`ScanMachine::start`]; the machine is left in
    /// `Error` after an acquisition failure and may be driven again.
    #[instrument(skip_all)]
    pub async fn run<D, O, F>(
        &self,
        machine: &mut ScanMachine<D>,
        consent: bool,
        mut observe: O,
        on_complete: F,
    ) -> Result<(), ScanError>
    where
        D: MediaDevice,
        O: FnMut(&ScanEvent),
        F: FnOnce(ScanPayload),
    {
        machine.start(consent).await?;

        let mut interval = time::interval(self.timing.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        while machine.phase() != ScanPhase::Completing {
            interval.tick().await;
            match machine.tick() {
                Some(event) => observe(&event),
                None => {
                    return Err(ScanError::InvalidPhase {
                        action: "tick",
                        phase: machine.phase(),
                    });
                }
            }
        }

        debug!(settle_ms = self.timing.settle.as_millis(), "Settling");
        time::sleep(self.timing.settle).await;

        if let Some(payload) = machine.complete(Utc::now()) {
            on_complete(payload);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::media::{AcquisitionError, DeviceOutcome, SimulatedDevice};

    #[tokio::test(start_paused = true)]
    async fn test_run_takes_ticks_plus_settle() {
        let device = SimulatedDevice::granting();
        let mut machine = ScanMachine::new(device.clone());
        let driver = ScanDriver::default();

        let started = time::Instant::now();
        let mut events = 0;
        let mut payloads = Vec::new();
        driver
            .run(&mut machine, true, |_| events += 1, |p| payloads.push(p))
            .await
            .unwrap();

        assert_eq!(events, 107);
        assert_eq!(payloads.len(), 1);
        assert_eq!(machine.phase(), ScanPhase::Done);
        assert_eq!(device.outstanding(), 0);
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(80 * 107 + 1000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_acquisition_failure() {
        let device = SimulatedDevice::scripted([DeviceOutcome::Fail("busy".to_owned())]);
        let mut machine = ScanMachine::new(device.clone());
        let driver = ScanDriver::default();

        let mut completed = false;
        let err = driver
            .run(&mut machine, true, |_| {}, |_| completed = true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Acquisition(AcquisitionError::Device(_))
        ));
        assert!(!completed);

        // Driving again retries from Error.
        driver
            .run(&mut machine, true, |_| {}, |_| completed = true)
            .await
            .unwrap();
        assert!(completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_run_releases_on_drop() {
        let device = SimulatedDevice::granting();
        let mut machine = ScanMachine::new(device.clone());
        let driver = ScanDriver::default();

        let run = driver.run(&mut machine, true, |_| {}, |_| {});
        assert!(
            time::timeout(Duration::from_millis(2000), run)
                .await
                .is_err()
        );
        assert!(machine.phase().is_capturing());
        assert_eq!(device.outstanding(), 1);

        drop(machine);
        assert_eq!(device.outstanding(), 0);
    }
}
