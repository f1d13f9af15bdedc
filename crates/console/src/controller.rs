//! Composition root for the geozone console engine.
//!
//! Wires the fetch orchestrator, overlay registry, and edit session together
//! so that the record listing, the rendered overlays, and the in-progress
//! draft stay mutually consistent across fetches and mutations.

use std::sync::{Arc, Mutex};

use tracing::warn;

use client::{GeozoneApi, UserApi};
use domain::geometry::LatLng;
use domain::models::{DraftError, Geozone, GeozoneDraft, User, UserSearchRequest};
use shared::pagination::PageQuery;

use crate::fetch::{FetchError, FetchOrchestrator, RecordsObserver};
use crate::map::overlays::{geometry_from_overlay, OverlayRegistry};
use crate::map::surface::{MapSurface, Overlay, OverlayStyle};
use crate::notify::Notifier;
use crate::session::{EditSession, MutationError, SessionPhase, EDIT_ZOOM};

/// Users loaded for the owner picker at startup.
const USER_DIRECTORY_LIMIT: u32 = 100;

/// Applies fetched record sets to the overlay registry.
///
/// Single writer of the overlay collection: only fetch application and
/// delete handling mutate it, so the rendered overlays always reflect the
/// most recently completed fetch.
pub struct OverlayPresenter {
    registry: Mutex<OverlayRegistry>,
    style: OverlayStyle,
}

impl OverlayPresenter {
    pub fn new(surface: Arc<dyn MapSurface>, style: OverlayStyle) -> Self {
        Self {
            registry: Mutex::new(OverlayRegistry::new(surface)),
            style,
        }
    }

    pub fn overlay_count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, record_id: &str) -> bool {
        self.lock().contains(record_id)
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.lock().record_ids()
    }

    pub fn remove_record(&self, record_id: &str) -> bool {
        self.lock().remove_record(record_id)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OverlayRegistry> {
        self.registry.lock().expect("overlay registry poisoned")
    }
}

impl RecordsObserver for OverlayPresenter {
    fn records_applied(&self, records: &[Geozone]) {
        self.lock().sync(records, &self.style);
    }
}

/// The engine facade the presentation layer drives.
pub struct GeozoneController {
    orchestrator: FetchOrchestrator,
    presenter: Arc<OverlayPresenter>,
    session: tokio::sync::Mutex<EditSession>,
    user_api: Arc<dyn UserApi>,
    users: Mutex<Vec<User>>,
    surface: Arc<dyn MapSurface>,
}

impl GeozoneController {
    pub fn new(
        api: Arc<dyn GeozoneApi>,
        user_api: Arc<dyn UserApi>,
        surface: Arc<dyn MapSurface>,
        notifier: Arc<dyn Notifier>,
        style: OverlayStyle,
    ) -> Arc<Self> {
        let presenter = Arc::new(OverlayPresenter::new(Arc::clone(&surface), style));
        let orchestrator = FetchOrchestrator::new(
            Arc::clone(&api),
            Arc::clone(&presenter) as Arc<dyn RecordsObserver>,
            Arc::clone(&notifier),
        );
        let session = tokio::sync::Mutex::new(EditSession::new(
            api,
            Arc::clone(&surface),
            notifier,
        ));
        Arc::new(Self {
            orchestrator,
            presenter,
            session,
            user_api,
            users: Mutex::new(Vec::new()),
            surface,
        })
    }

    /// Loads the user directory and performs the initial fetch.
    pub async fn start(&self) {
        self.load_users().await;
        let _ = self.orchestrator.refresh().await;
    }

    /// Loads the owner picker's user list. A directory failure degrades to
    /// an empty list without failing startup.
    pub async fn load_users(&self) {
        let request = UserSearchRequest::unfiltered(1, USER_DIRECTORY_LIMIT);
        match self.user_api.search_users(&request).await {
            Ok(page) => {
                *self.users.lock().expect("user list poisoned") = page.data;
            }
            Err(err) => {
                warn!(error = %err, "User directory unavailable");
                self.users.lock().expect("user list poisoned").clear();
            }
        }
    }

    pub async fn refresh(&self) -> Result<(), FetchError> {
        self.orchestrator.refresh().await
    }

    pub async fn set_page(&self, page: u32) -> Result<(), FetchError> {
        self.orchestrator.set_page(page).await
    }

    pub async fn set_limit(&self, limit: u32) -> Result<(), FetchError> {
        self.orchestrator.set_limit(limit).await
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        self.orchestrator.set_search_text(text);
    }

    /// Hands a freshly drawn overlay to a new create session.
    pub async fn begin_create(&self, overlay: Box<dyn Overlay>) {
        self.session.lock().await.begin_create(overlay);
    }

    /// Opens an edit session for a listed record.
    pub async fn begin_edit(&self, record: &Geozone) {
        let mut session = self.session.lock().await;
        if let Err(err) = session.begin_edit(record) {
            warn!(id = %record.id, error = %err, "Cannot edit geozone with malformed geometry");
        }
    }

    /// Commits the active draft and refreshes the listing on success.
    pub async fn commit(&self) -> Result<(), MutationError> {
        self.session.lock().await.commit().await?;
        let _ = self.orchestrator.refresh().await;
        Ok(())
    }

    /// Cancels the active draft and disposes its overlay.
    pub async fn cancel(&self) {
        self.session.lock().await.cancel();
    }

    /// Deletes a record; on success its overlay leaves the live set and the
    /// listing refreshes. On failure both remain untouched.
    pub async fn delete(&self, record_id: &str) -> Result<(), MutationError> {
        self.session.lock().await.delete_record(record_id).await?;
        self.presenter.remove_record(record_id);
        let _ = self.orchestrator.refresh().await;
        Ok(())
    }

    /// Persists the new boundary of a dragged overlay, then refreshes.
    pub async fn overlay_dragged(
        &self,
        record_id: &str,
        overlay: &dyn Overlay,
    ) -> Result<(), MutationError> {
        let geometry = geometry_from_overlay(overlay).map_err(DraftError::Decode)?;
        self.session
            .lock()
            .await
            .update_shape(record_id, &geometry)
            .await?;
        let _ = self.orchestrator.refresh().await;
        Ok(())
    }

    /// Applies an autocomplete place selection: seeds the draft's address
    /// fields and recentres the viewport.
    pub async fn place_selected(&self, formatted_address: &str, location: LatLng) {
        self.session.lock().await.seed_place(formatted_address);
        self.surface.set_viewport(location, EDIT_ZOOM);
    }

    /// Assigns the owning user on the active draft.
    pub async fn select_user(&self, user_id: &str) {
        let mut session = self.session.lock().await;
        if let Some(draft) = session.draft_mut() {
            draft.user_id = user_id.to_string();
        }
    }

    /// Edits the active draft's form fields.
    pub async fn update_draft(&self, apply: impl FnOnce(&mut GeozoneDraft)) {
        let mut session = self.session.lock().await;
        if let Some(draft) = session.draft_mut() {
            apply(draft);
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().expect("user list poisoned").clone()
    }

    pub fn records(&self) -> Vec<Geozone> {
        self.orchestrator.records()
    }

    pub fn total(&self) -> u64 {
        self.orchestrator.total()
    }

    pub fn total_pages(&self) -> u32 {
        self.orchestrator.total_pages()
    }

    pub fn query(&self) -> PageQuery {
        self.orchestrator.query()
    }

    pub fn overlay_count(&self) -> usize {
        self.presenter.overlay_count()
    }

    pub fn overlay_record_ids(&self) -> Vec<String> {
        self.presenter.record_ids()
    }

    pub async fn session_phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    pub async fn draft(&self) -> GeozoneDraft {
        self.session.lock().await.draft().clone()
    }

    /// Tears the engine down: cancels the pending debounce, discards any
    /// in-flight responses, cancels the session, and disposes every overlay.
    pub async fn shutdown(&self) {
        self.orchestrator.shutdown();
        self.session.lock().await.cancel();
        self.presenter.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::headless::HeadlessSurface;
    use crate::map::surface::OverlaySpec;
    use crate::notify::CapturingNotifier;
    use crate::session::SessionMode;
    use async_trait::async_trait;
    use client::{
        ApiError, InMemoryGeozoneApi, MutationAck, StaticUserApi,
    };
    use domain::geometry::Geometry;
    use domain::models::{CreateGeozoneRequest, GeozonePage, UpdateGeozoneRequest};
    use fake::faker::address::en::StreetName;
    use fake::Fake;
    use serde_json::json;

    fn circle_record(id: usize) -> Geozone {
        let street: String = StreetName().fake();
        serde_json::from_value(json!({
            "_id": format!("gz-{id}"),
            "name": format!("Zone {id}"),
            "finalAddress": street,
            "geoCodeData": {"geometry": {
                "type": "Circle",
                "coordinates": [12.0 + id as f64 * 0.01, 77.0],
                "radius": 100,
            }},
        }))
        .unwrap()
    }

    fn address_only_record(id: usize) -> Geozone {
        serde_json::from_value(json!({
            "_id": format!("gz-{id}"),
            "name": format!("Zone {id}"),
            "finalAddress": "address only",
        }))
        .unwrap()
    }

    fn malformed_record(id: usize) -> Geozone {
        serde_json::from_value(json!({
            "_id": format!("gz-{id}"),
            "name": format!("Zone {id}"),
            "finalAddress": "broken",
            "geoCodeData": {"geometry": {"type": "Blob", "coordinates": [[0, 0]]}},
        }))
        .unwrap()
    }

    struct Fixture {
        controller: Arc<GeozoneController>,
        surface: Arc<HeadlessSurface>,
        notifier: Arc<CapturingNotifier>,
    }

    fn fixture_with_api(api: Arc<dyn GeozoneApi>) -> Fixture {
        let surface = Arc::new(HeadlessSurface::new());
        let notifier = Arc::new(CapturingNotifier::new());
        let controller = GeozoneController::new(
            api,
            Arc::new(StaticUserApi::new(vec![User {
                id: "u-1".to_string(),
                name: "Asha".to_string(),
                email: None,
                role: None,
            }])),
            Arc::clone(&surface) as Arc<dyn MapSurface>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            OverlayStyle::default(),
        );
        Fixture {
            controller,
            surface,
            notifier,
        }
    }

    fn fixture(records: Vec<Geozone>) -> Fixture {
        fixture_with_api(Arc::new(InMemoryGeozoneApi::with_records(records)))
    }

    /// Backend whose mutations always fail while reads keep working.
    struct ReadOnlyApi {
        inner: InMemoryGeozoneApi,
    }

    impl ReadOnlyApi {
        fn denied() -> ApiError {
            ApiError::Service {
                status: 403,
                message: "Mutations are disabled".to_string(),
            }
        }
    }

    #[async_trait]
    impl GeozoneApi for ReadOnlyApi {
        async fn list(&self, page: u32, limit: u32) -> Result<GeozonePage, ApiError> {
            self.inner.list(page, limit).await
        }

        async fn search(
            &self,
            page: u32,
            limit: u32,
            search_text: &str,
        ) -> Result<GeozonePage, ApiError> {
            self.inner.search(page, limit, search_text).await
        }

        async fn create(&self, _request: &CreateGeozoneRequest) -> Result<MutationAck, ApiError> {
            Err(Self::denied())
        }

        async fn update(
            &self,
            _id: &str,
            _request: &UpdateGeozoneRequest,
        ) -> Result<MutationAck, ApiError> {
            Err(Self::denied())
        }

        async fn delete(&self, _id: &str) -> Result<MutationAck, ApiError> {
            Err(Self::denied())
        }
    }

    #[tokio::test]
    async fn test_start_renders_first_page_of_overlays() {
        let fx = fixture((0..25).map(circle_record).collect());
        fx.controller.start().await;

        assert_eq!(fx.controller.records().len(), 10);
        assert_eq!(fx.controller.total(), 25);
        assert_eq!(fx.controller.total_pages(), 3);
        assert_eq!(fx.controller.overlay_count(), 10);
        assert_eq!(fx.surface.live_overlays(), 10);
        assert_eq!(fx.controller.users().len(), 1);
    }

    #[tokio::test]
    async fn test_overlay_count_matches_decodable_records() {
        let fx = fixture(vec![
            circle_record(0),
            address_only_record(1),
            malformed_record(2),
            circle_record(3),
        ]);
        fx.controller.start().await;

        // All four records are listed; only the two decodable ones render.
        assert_eq!(fx.controller.records().len(), 4);
        assert_eq!(fx.controller.overlay_count(), 2);

        // A second refresh neither leaks nor duplicates.
        fx.controller.refresh().await.unwrap();
        assert_eq!(fx.controller.overlay_count(), 2);
        assert_eq!(fx.surface.live_overlays(), 2);
    }

    #[tokio::test]
    async fn test_page_change_resyncs_overlays() {
        let fx = fixture((0..12).map(circle_record).collect());
        fx.controller.start().await;
        assert_eq!(fx.controller.overlay_count(), 10);

        fx.controller.set_page(2).await.unwrap();
        assert_eq!(fx.controller.records().len(), 2);
        assert_eq!(fx.controller.overlay_count(), 2);
        assert_eq!(fx.surface.live_overlays(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_its_overlay_only() {
        let fx = fixture((0..3).map(circle_record).collect());
        fx.controller.start().await;

        fx.controller.delete("gz-1").await.unwrap();

        assert_eq!(fx.controller.total(), 2);
        let ids = fx.controller.overlay_record_ids();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"gz-1".to_string()));
        assert!(ids.contains(&"gz-0".to_string()));
        assert!(ids.contains(&"gz-2".to_string()));
        assert!(!fx.notifier.successes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_record_and_overlay_untouched() {
        let api = Arc::new(ReadOnlyApi {
            inner: InMemoryGeozoneApi::with_records((0..3).map(circle_record).collect()),
        });
        let fx = fixture_with_api(api);
        fx.controller.start().await;

        let result = fx.controller.delete("gz-1").await;

        assert!(result.is_err());
        assert_eq!(fx.controller.total(), 3);
        assert!(fx.controller.overlay_record_ids().contains(&"gz-1".to_string()));
        assert_eq!(fx.notifier.errors(), vec!["Mutations are disabled".to_string()]);
    }

    #[tokio::test]
    async fn test_begin_edit_then_cancel_leaves_overlays_unchanged() {
        let fx = fixture((0..3).map(circle_record).collect());
        fx.controller.start().await;

        let overlays_before = fx.surface.live_overlays();
        let ids_before = fx.controller.overlay_record_ids();

        let record = fx.controller.records()[0].clone();
        fx.controller.begin_edit(&record).await;
        fx.controller.cancel().await;

        assert_eq!(fx.surface.live_overlays(), overlays_before);
        assert_eq!(fx.controller.overlay_record_ids(), ids_before);
        assert_eq!(fx.controller.session_phase().await, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_draw_and_commit_creates_record_and_rerenders() {
        let fx = fixture(Vec::new());
        fx.controller.start().await;
        assert_eq!(fx.controller.overlay_count(), 0);

        let overlay = fx.surface.render(&OverlaySpec::new(Geometry::Circle {
            center: LatLng::new(12.9, 77.6),
            radius_meters: 200.0,
        }));
        fx.controller.begin_create(overlay).await;
        fx.controller
            .update_draft(|draft| {
                draft.name = "New Depot".to_string();
                draft.final_address = "1 Ring Road".to_string();
            })
            .await;
        fx.controller.select_user("u-1").await;

        fx.controller.commit().await.unwrap();

        assert_eq!(fx.controller.total(), 1);
        assert_eq!(fx.controller.overlay_count(), 1);
        // The drawn overlay was handed off: only the registry's copy remains.
        assert_eq!(fx.surface.live_overlays(), 1);
        assert_eq!(fx.controller.session_phase().await, SessionPhase::Idle);
        assert_eq!(fx.controller.records()[0].user_id.as_deref(), Some("u-1"));
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_session_drafting() {
        let api = Arc::new(ReadOnlyApi {
            inner: InMemoryGeozoneApi::new(),
        });
        let fx = fixture_with_api(api);
        fx.controller.start().await;

        let overlay = fx.surface.render(&OverlaySpec::new(Geometry::Circle {
            center: LatLng::new(12.9, 77.6),
            radius_meters: 200.0,
        }));
        fx.controller.begin_create(overlay).await;
        fx.controller
            .update_draft(|draft| draft.name = "New Depot".to_string())
            .await;

        let result = fx.controller.commit().await;

        assert!(result.is_err());
        assert_eq!(
            fx.controller.session_phase().await,
            SessionPhase::Drafting(SessionMode::Create)
        );
        assert_eq!(fx.controller.draft().await.name, "New Depot");
    }

    #[tokio::test]
    async fn test_overlay_dragged_persists_new_shape() {
        let fx = fixture(vec![circle_record(0)]);
        fx.controller.start().await;

        let dragged = fx.surface.render(&OverlaySpec::new(Geometry::Circle {
            center: LatLng::new(13.5, 78.5),
            radius_meters: 400.0,
        }));
        fx.controller
            .overlay_dragged("gz-0", dragged.as_ref())
            .await
            .unwrap();

        let stored = fx.controller.records()[0].geometry().unwrap().unwrap();
        assert_eq!(
            stored,
            Geometry::Circle {
                center: LatLng::new(13.5, 78.5),
                radius_meters: 400.0,
            }
        );
    }

    #[tokio::test]
    async fn test_place_selection_seeds_draft_and_viewport() {
        let fx = fixture(Vec::new());
        fx.controller.start().await;

        fx.controller
            .place_selected("77 Cross Street", LatLng::new(12.5, 77.5))
            .await;

        let draft = fx.controller.draft().await;
        assert_eq!(draft.address, "77 Cross Street");
        assert_eq!(draft.final_address, "77 Cross Street");
        assert_eq!(
            fx.controller.session_phase().await,
            SessionPhase::Drafting(SessionMode::Create)
        );
        let events = fx.surface.events();
        assert!(events
            .iter()
            .any(|e| matches!(e, crate::map::headless::SurfaceEvent::Viewport { zoom: 15, .. })));
    }

    #[tokio::test]
    async fn test_user_directory_failure_degrades_to_empty() {
        let surface = Arc::new(HeadlessSurface::new());
        let controller = GeozoneController::new(
            Arc::new(InMemoryGeozoneApi::new()),
            Arc::new(StaticUserApi::failing()),
            Arc::clone(&surface) as Arc<dyn MapSurface>,
            Arc::new(CapturingNotifier::new()),
            OverlayStyle::default(),
        );
        controller.start().await;
        assert!(controller.users().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_disposes_all_overlays() {
        let fx = fixture((0..5).map(circle_record).collect());
        fx.controller.start().await;
        assert_eq!(fx.surface.live_overlays(), 5);

        fx.controller.shutdown().await;

        assert_eq!(fx.controller.overlay_count(), 0);
        assert_eq!(fx.surface.live_overlays(), 0);
        assert_eq!(fx.surface.attached_listeners(), 0);
    }
}
