//! Scan, catalog and wardrobe commands.

use std::path::Path;

use pulse_core::FragranceId;
use pulse_lab::media::{DeviceOutcome, SimulatedDevice};
use pulse_lab::scan::{ScanDriver, ScanError, ScanEvent, ScanMachine};
use pulse_lab::storage::KeyValueStore;
use pulse_lab::synthesis::LocalSynthesizer;
use pulse_lab::vision::FixedRecognizer;
use pulse_lab::{Applied, Lab, LabConfig, LabError};
use tracing::{info, warn};

/// Run a profiling scan against a simulated camera and microphone.
///
/// `deny` or `fail` script the first acquisition; `retry` allows one more
/// attempt after it.
///
/// # Errors
///
/// Returns an error if no one is signed in, the scan cannot start, or the
/// result cannot be stored.
pub async fn scan<S: KeyValueStore>(
    lab: &mut Lab<S>,
    config: &LabConfig,
    deny: bool,
    fail: Option<String>,
    retry: bool,
) -> Result<(), LabError> {
    let script = match (deny, fail) {
        (true, _) => vec![DeviceOutcome::Deny],
        (false, Some(reason)) => vec![DeviceOutcome::Fail(reason)],
        (false, None) => Vec::new(),
    };
    let device = SimulatedDevice::scripted(script);
    let mut machine = ScanMachine::new(device);
    let driver = ScanDriver::new(config.scan);
    let synthesizer = LocalSynthesizer::new(config.synthesis_delay);

    let mut attempts_left = if retry { 2 } else { 1 };
    let applied = loop {
        attempts_left -= 1;
        match lab
            .run_profile_scan(&driver, &mut machine, &synthesizer, report_progress)
            .await
        {
            Err(LabError::Scan(ScanError::Acquisition(e))) if attempts_left > 0 => {
                warn!(error = %e, "{}", e.user_message());
                info!("Retrying sensor access");
            }
            Err(LabError::Scan(ScanError::Acquisition(e))) => {
                warn!("{}", e.user_message());
                return Err(ScanError::Acquisition(e).into());
            }
            other => break other?,
        }
    };

    match (applied, lab.scent_dna()) {
        (Applied::Applied, Some(dna)) => {
            info!(archetype = dna.headline(), page = %lab.current_page(), "Scent DNA synthesized");
            info!("{}", dna.as_str());
        }
        _ => warn!("Scan result discarded"),
    }
    Ok(())
}

fn report_progress(event: &ScanEvent) {
    match *event {
        ScanEvent::PhaseChanged { from, to } => info!(%from, %to, "Phase complete"),
        ScanEvent::Progressed { phase, progress } if progress % 25 == 0 => {
            info!(%phase, progress, "Scanning");
        }
        ScanEvent::Progressed { .. } => {}
    }
}

/// List catalog entries matching `query`.
pub fn catalog<S: KeyValueStore>(lab: &Lab<S>, query: &str) {
    let results = lab.catalog().search(query);
    if results.is_empty() {
        info!(query, "No fragrances found");
        return;
    }
    for fragrance in results {
        info!(
            id = %fragrance.id,
            brand = %fragrance.brand,
            family = %fragrance.family,
            price = %fragrance.price,
            notes = %fragrance.headline_notes(3).join(", "),
            "{}",
            fragrance.name
        );
    }
}

/// Identify a bottle photo and optionally add it to the wardrobe.
///
/// # Errors
///
/// Returns an error if the image cannot be read.
pub async fn identify<S: KeyValueStore>(
    lab: &mut Lab<S>,
    config: &LabConfig,
    path: &Path,
    add: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = tokio::fs::read(path).await?;
    info!(path = %path.display(), bytes = image.len(), "Analyzing bottle");

    let recognizer = FixedRecognizer::new(config.vision_delay);
    if lab.identify_bottle(&recognizer, &image).await == Applied::Stale {
        warn!("Identification discarded");
        return Ok(());
    }

    if let Some(fragrance) = lab.scanned() {
        info!(
            id = %fragrance.id,
            brand = %fragrance.brand,
            price = %fragrance.price,
            "Identified {}",
            fragrance.name
        );
    }
    if add {
        let added = lab.add_to_wardrobe()?;
        info!(id = %added.id, "Added to wardrobe");
    }
    Ok(())
}

/// Place catalog entries in the wardrobe and print the blend for the
/// stored scent DNA.
///
/// # Errors
///
/// Returns [`LabError::UnknownFragrance`] for an id not in the catalog.
pub fn blend<S: KeyValueStore>(lab: &mut Lab<S>, ids: &[String]) -> Result<(), LabError> {
    for id in ids {
        lab.select_catalog_entry(&FragranceId::new(id.as_str()))?;
        lab.add_to_wardrobe()?;
    }

    let Some(recipe) = lab.recommendation() else {
        warn!("Run `pulse scan` first to synthesize a scent DNA");
        return Ok(());
    };
    info!(analysis = %recipe.analysis, "{}", recipe.name);
    for ratio in &recipe.ratios {
        info!(id = %ratio.fragrance_id, "{:>3}% {}", ratio.percentage, ratio.name);
    }
    Ok(())
}
