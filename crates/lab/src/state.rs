//! Lab state shared by every front end.
//!
//! [`Lab`] owns the session, the current page, the catalog, the admin
//! directory and the wardrobe. Long-running work (synthesis, bottle
//! recognition) is started against a [`SessionTicket`] and its result is
//! handed back through an `apply_*` method, which drops it if the session
//! moved on in the meantime.

use chrono::Utc;
use pulse_core::{Email, Fragrance, FragranceId, Identity, Role, ScentDna};
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::directory::Directory;
use crate::error::LabError;
use crate::media::MediaDevice;
use crate::navigation::{NavItem, Navigator, Page, landing_target, nav_items};
use crate::scan::{ScanDriver, ScanEvent, ScanMachine, ScanPayload};
use crate::session::SessionStore;
use crate::storage::KeyValueStore;
use crate::synthesis::{BlendRecipe, ScentSynthesizer, recommend_blend};
use crate::vision::{BottleRecognizer, Detection};

/// Snapshot of the session taken before an await.
///
/// The epoch changes on sign-in, sign-out and every page change, so a
/// ticket only stays current while the user remains where the work began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    epoch: u64,
    page: Page,
}

impl SessionTicket {
    /// Page the work was started from.
    #[must_use]
    pub const fn page(&self) -> Page {
        self.page
    }
}

/// Whether an asynchronous result was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Applied {
    Applied,
    Stale,
}

/// Application state.
#[derive(Debug)]
pub struct Lab<S> {
    session: SessionStore<S>,
    navigator: Navigator,
    catalog: Catalog,
    directory: Directory,
    wardrobe: Vec<Fragrance>,
    scanned: Option<Fragrance>,
    epoch: u64,
}

impl<S: KeyValueStore> Lab<S> {
    /// Restore the persisted session from `store` and start on the landing
    /// page with the seeded catalog and directory.
    pub fn load(store: S) -> Self {
        Self::with_catalog(store, Catalog::luxe())
    }

    pub fn with_catalog(store: S, catalog: Catalog) -> Self {
        Self {
            session: SessionStore::load(store),
            navigator: Navigator::new(),
            catalog,
            directory: Directory::seeded(),
            wardrobe: Vec::new(),
            scanned: None,
            epoch: 0,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    #[must_use]
    pub const fn scent_dna(&self) -> Option<&ScentDna> {
        self.session.scent_dna()
    }

    #[must_use]
    pub const fn current_page(&self) -> Page {
        self.navigator.current()
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn directory(&self) -> &Directory {
        &self.directory
    }

    pub const fn directory_mut(&mut self) -> &mut Directory {
        &mut self.directory
    }

    #[must_use]
    pub fn wardrobe(&self) -> &[Fragrance] {
        &self.wardrobe
    }

    /// The last identified or selected fragrance, not yet in the wardrobe.
    #[must_use]
    pub const fn scanned(&self) -> Option<&Fragrance> {
        self.scanned.as_ref()
    }

    /// Sign in as `role`, replacing any current identity.
    ///
    /// A blank `email` falls back to [`Email::FALLBACK`].
    /// Pending results from before the sign-in become stale and the lab
    /// returns to the landing page.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Email`] for a malformed address and
    /// [`LabError::Session`] if the identity cannot be persisted.
    pub fn sign_in(&mut self, email: &str, role: Role) -> Result<&Identity, LabError> {
        let email = Email::parse_or_fallback(email)?;
        self.session.sign_in(email, role, Utc::now())?;
        self.bump_epoch();
        self.navigator.navigate(Page::Landing, Some(role));
        self.session.identity().ok_or(LabError::NotSignedIn)
    }

    /// Clear the session and return to the landing page.
    ///
    /// Pending results become stale even if storage fails.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Session`] if a persisted entry cannot be removed.
    pub fn sign_out(&mut self) -> Result<(), LabError> {
        self.bump_epoch();
        self.navigator.navigate(Page::Landing, None);
        self.scanned = None;
        self.session.sign_out()?;
        Ok(())
    }

    /// Move to `page` if the current role may open it.
    pub fn navigate(&mut self, page: Page) -> bool {
        let from = self.navigator.current();
        let moved = self.navigator.navigate(page, self.session.role());
        if moved && from != page {
            self.bump_epoch();
        }
        moved
    }

    /// Follow the landing page's call to action.
    pub fn enter_lab(&mut self) -> Page {
        let target = landing_target(self.session.role(), self.scent_dna().is_some());
        self.navigate(target);
        self.current_page()
    }

    /// Header menu for the current session.
    #[must_use]
    pub fn nav_items(&self) -> Vec<NavItem> {
        nav_items(self.session.role(), self.scent_dna().is_some())
    }

    #[must_use]
    pub const fn ticket(&self) -> SessionTicket {
        SessionTicket {
            epoch: self.epoch,
            page: self.navigator.current(),
        }
    }

    /// Whether `ticket` still describes the current session.
    #[must_use]
    pub const fn is_current(&self, ticket: SessionTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Grant or withdraw sensor consent for the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::NotSignedIn`] without a session and
    /// [`LabError::Session`] if the change cannot be persisted.
    pub fn set_sensor_consent(&mut self, consent: bool) -> Result<(), LabError> {
        if self.session.set_sensor_consent(consent)? {
            Ok(())
        } else {
            Err(LabError::NotSignedIn)
        }
    }

    /// Whether a scan may start: signed in with sensor consent.
    #[must_use]
    pub fn can_scan(&self) -> bool {
        self.identity().is_some_and(Identity::sensor_consent)
    }

    /// Record a synthesized result and open the recommendations page.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Session`] if the result cannot be persisted.
    #[instrument(skip_all, fields(page = %ticket.page))]
    pub fn apply_scent_dna(
        &mut self,
        ticket: SessionTicket,
        dna: ScentDna,
        payload: ScanPayload,
    ) -> Result<Applied, LabError> {
        if !self.is_current(ticket) {
            debug!(headline = dna.headline(), "Discarding stale synthesis result");
            return Ok(Applied::Stale);
        }
        self.session.record_scent_dna(dna)?;
        self.session
            .attach_profiles(payload.biometrics, payload.behavior, payload.voice)?;
        self.navigate(Page::Recommendations);
        Ok(Applied::Applied)
    }

    /// Resolve a bottle detection against the catalog and hold it as the
    /// scanned fragrance.
    #[instrument(skip_all, fields(page = %ticket.page))]
    pub fn apply_detection(&mut self, ticket: SessionTicket, detection: &Detection) -> Applied {
        if !self.is_current(ticket) {
            debug!(name = %detection.name, "Discarding stale detection");
            return Applied::Stale;
        }
        let fragrance = self.catalog.resolve_detection(detection);
        info!(
            fragrance_id = %fragrance.id,
            confidence = detection.confidence,
            "Bottle identified"
        );
        self.scanned = Some(fragrance);
        Applied::Applied
    }

    /// Pick a catalog entry as the scanned fragrance and open the scanner.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::UnknownFragrance`] if no entry has `id`.
    pub fn select_catalog_entry(&mut self, id: &FragranceId) -> Result<&Fragrance, LabError> {
        let fragrance = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| LabError::UnknownFragrance(id.clone()))?;
        self.navigate(Page::Scanner);
        Ok(self.scanned.insert(fragrance))
    }

    /// Move the scanned fragrance into the wardrobe.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::NothingScanned`] if nothing is held.
    pub fn add_to_wardrobe(&mut self) -> Result<&Fragrance, LabError> {
        let fragrance = self.scanned.take().ok_or(LabError::NothingScanned)?;
        info!(fragrance_id = %fragrance.id, "Added to wardrobe");
        self.wardrobe.push(fragrance);
        self.wardrobe.last().ok_or(LabError::NothingScanned)
    }

    /// Layering recipe for the current result and wardrobe.
    #[must_use]
    pub fn recommendation(&self) -> Option<BlendRecipe> {
        recommend_blend(self.scent_dna()?, &self.wardrobe)
    }

    /// Identify a bottle photo from the scanner page.
    pub async fn identify_bottle<R: BottleRecognizer>(
        &mut self,
        recognizer: &R,
        image: &[u8],
    ) -> Applied {
        self.navigate(Page::Scanner);
        let ticket = self.ticket();
        let detection = recognizer.identify(image).await;
        self.apply_detection(ticket, &detection)
    }

    /// Run a full profiling scan, synthesize the result and apply it.
    ///
    /// Opens the profile page first. The lab stays borrowed for the whole
    /// run, so the result can only be stale if the run itself navigated.
    ///
    /// # Errors
    ///
    /// - [`LabError::NotSignedIn`] without a session
    /// - [`LabError::Scan`] if the scan cannot start, including missing consent
    /// - [`LabError::Session`] if the result cannot be persisted
    #[instrument(skip_all)]
    pub async fn run_profile_scan<D, Y, O>(
        &mut self,
        driver: &ScanDriver,
        machine: &mut ScanMachine<D>,
        synthesizer: &Y,
        observe: O,
    ) -> Result<Applied, LabError>
    where
        D: MediaDevice,
        Y: ScentSynthesizer,
        O: FnMut(&ScanEvent),
    {
        let consent = self
            .identity()
            .map(Identity::sensor_consent)
            .ok_or(LabError::NotSignedIn)?;
        self.navigate(Page::Profile);
        let ticket = self.ticket();

        let mut delivered = None;
        driver
            .run(machine, consent, observe, |payload| delivered = Some(payload))
            .await?;
        let Some(payload) = delivered else {
            return Ok(Applied::Stale);
        };

        let dna = synthesizer
            .synthesize(&payload.biometrics, &payload.behavior, &payload.voice)
            .await;
        self.apply_scent_dna(ticket, dna, payload)
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pulse_core::{Archetype, VoicePitch};

    use super::*;
    use crate::media::{DeviceOutcome, SimulatedDevice};
    use crate::scan::{ScanError, ScanPhase};
    use crate::storage::MemoryStore;
    use crate::synthesis::LocalSynthesizer;

    fn lab() -> Lab<MemoryStore> {
        Lab::load(MemoryStore::new())
    }

    fn libre_detection() -> Detection {
        Detection {
            brand: "YSL Beauty".to_owned(),
            name: "Libre Eau de Parfum".to_owned(),
            confidence: 0.98,
        }
    }

    #[test]
    fn test_sign_in_lands_on_landing() {
        let mut lab = lab();
        lab.navigate(Page::Discover);

        let identity = lab.sign_in("a@b.com", Role::User).unwrap();
        assert_eq!(identity.id().as_str(), "usr_123");
        assert_eq!(identity.name(), "Julian de Luxe");
        assert_eq!(lab.current_page(), Page::Landing);
    }

    #[test]
    fn test_blank_email_falls_back() {
        let mut lab = lab();
        let identity = lab.sign_in("   ", Role::Admin).unwrap();
        assert_eq!(identity.email().as_str(), "innovator@loreal.com");
        assert!(lab.sign_in("not-an-email", Role::User).is_err());
    }

    #[test]
    fn test_admin_pages_need_admin() {
        let mut lab = lab();
        assert!(!lab.navigate(Page::AdminDashboard));
        lab.sign_in("a@b.com", Role::User).unwrap();
        assert!(!lab.navigate(Page::MarketInsights));
        assert_eq!(lab.current_page(), Page::Landing);

        lab.sign_in("a@b.com", Role::Admin).unwrap();
        assert!(lab.navigate(Page::AdminDashboard));
    }

    #[test]
    fn test_enter_lab_targets() {
        let mut lab = lab();
        assert_eq!(lab.enter_lab(), Page::Login);

        lab.sign_in("a@b.com", Role::User).unwrap();
        assert_eq!(lab.enter_lab(), Page::Profile);

        let ticket = lab.ticket();
        let payload = ScanPayload::synthetic(Utc::now());
        let applied = lab
            .apply_scent_dna(ticket, ScentDna::from_archetype(Archetype::ObsidianNomad), payload)
            .unwrap();
        assert_eq!(applied, Applied::Applied);
        lab.navigate(Page::Landing);
        assert_eq!(lab.enter_lab(), Page::Recommendations);
    }

    #[test]
    fn test_results_after_sign_out_are_stale() {
        let mut lab = lab();
        lab.sign_in("a@b.com", Role::User).unwrap();
        let ticket = lab.ticket();
        lab.sign_out().unwrap();

        let applied = lab
            .apply_scent_dna(
                ticket,
                ScentDna::from_archetype(Archetype::SolarAlchemist),
                ScanPayload::synthetic(Utc::now()),
            )
            .unwrap();
        assert_eq!(applied, Applied::Stale);
        assert!(lab.scent_dna().is_none());
        assert!(lab.session().store().is_empty());
        assert_eq!(lab.current_page(), Page::Landing);
    }

    #[test]
    fn test_detection_after_navigating_away_is_stale() {
        let mut lab = lab();
        lab.navigate(Page::Scanner);
        let ticket = lab.ticket();
        assert_eq!(ticket.page(), Page::Scanner);

        // Re-navigating to the same page keeps the ticket.
        lab.navigate(Page::Scanner);
        assert!(lab.is_current(ticket));

        lab.navigate(Page::Discover);
        assert_eq!(lab.apply_detection(ticket, &libre_detection()), Applied::Stale);
        assert!(lab.scanned().is_none());
    }

    #[test]
    fn test_refused_navigation_keeps_ticket() {
        let mut lab = lab();
        let ticket = lab.ticket();
        assert!(!lab.navigate(Page::AdminDashboard));
        assert!(lab.is_current(ticket));
    }

    #[test]
    fn test_detection_then_wardrobe_then_blend() {
        let mut lab = lab();
        lab.sign_in("a@b.com", Role::User).unwrap();
        assert!(lab.add_to_wardrobe().is_err());

        let ticket = lab.ticket();
        assert_eq!(lab.apply_detection(ticket, &libre_detection()), Applied::Applied);
        assert_eq!(lab.scanned().unwrap().id.as_str(), "ysl-libre");
        lab.add_to_wardrobe().unwrap();
        assert!(lab.scanned().is_none());

        lab.select_catalog_entry(&FragranceId::new("mugler-alien")).unwrap();
        assert_eq!(lab.current_page(), Page::Scanner);
        lab.add_to_wardrobe().unwrap();

        // No result yet, so no blend.
        assert!(lab.recommendation().is_none());
        lab.session
            .record_scent_dna(ScentDna::from_archetype(Archetype::ObsidianNomad))
            .unwrap();
        let recipe = lab.recommendation().unwrap();
        assert_eq!(recipe.ratios.len(), 2);
        assert_eq!(recipe.ratios.first().unwrap().name, "Libre");
    }

    #[test]
    fn test_select_unknown_entry() {
        let mut lab = lab();
        assert!(matches!(
            lab.select_catalog_entry(&FragranceId::new("chanel-5")),
            Err(LabError::UnknownFragrance(_))
        ));
        assert_eq!(lab.current_page(), Page::Landing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_scan_applies_result() {
        let mut lab = lab();
        lab.sign_in("a@b.com", Role::User).unwrap();
        let device = SimulatedDevice::granting();
        let mut machine = ScanMachine::new(device.clone());

        let applied = lab
            .run_profile_scan(
                &ScanDriver::default(),
                &mut machine,
                &LocalSynthesizer::new(Duration::from_millis(10)),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(applied, Applied::Applied);
        assert_eq!(machine.phase(), ScanPhase::Done);
        assert_eq!(device.outstanding(), 0);
        assert_eq!(lab.current_page(), Page::Recommendations);
        assert_eq!(lab.scent_dna().unwrap().headline(), "Obsidian Nomad");
        let voice = lab.identity().unwrap().voice_profile().unwrap();
        assert_eq!(voice.pitch, Some(VoicePitch::MidRange));
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_scan_refused_without_consent() {
        let mut lab = lab();
        assert!(matches!(lab.set_sensor_consent(false), Err(LabError::NotSignedIn)));
        lab.sign_in("a@b.com", Role::User).unwrap();
        lab.set_sensor_consent(false).unwrap();
        assert!(!lab.can_scan());

        let device = SimulatedDevice::granting();
        let mut machine = ScanMachine::new(device.clone());
        let result = lab
            .run_profile_scan(
                &ScanDriver::default(),
                &mut machine,
                &LocalSynthesizer::default(),
                |_| {},
            )
            .await;
        assert!(matches!(
            result,
            Err(LabError::Scan(ScanError::ConsentRequired))
        ));
        assert_eq!(device.acquired(), 0);
        assert_eq!(machine.phase(), ScanPhase::Idle);
        assert_eq!(lab.current_page(), Page::Profile);

        lab.set_sensor_consent(true).unwrap();
        assert!(lab.can_scan());
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_scan_requires_session() {
        let mut lab = lab();
        let device = SimulatedDevice::scripted([DeviceOutcome::Grant]);
        let mut machine = ScanMachine::new(device.clone());
        let result = lab
            .run_profile_scan(
                &ScanDriver::default(),
                &mut machine,
                &LocalSynthesizer::default(),
                |_| {},
            )
            .await;
        assert!(matches!(result, Err(LabError::NotSignedIn)));
        assert_eq!(device.acquired(), 0);
    }
}
