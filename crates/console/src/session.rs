//! Edit/create session for a single geozone.
//!
//! Owns the transient form draft and the overlay currently being drawn or
//! edited, and mediates the create, update, and delete transactions. The
//! session exclusively owns its overlay until commit or cancel; on commit the
//! shape's lifetime moves to the next overlay refresh, on cancel it is
//! disposed.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use validator::Validate;

use client::{ApiError, GeozoneApi, MutationAck};
use domain::geometry::{self, DecodeError, Geometry};
use domain::models::{
    DraftError, GeoCodeData, Geozone, GeozoneDraft, UpdateGeozoneRequest,
};

use crate::map::overlays::{dispose_overlay, geometry_from_overlay};
use crate::map::surface::{MapSurface, Overlay};
use crate::notify::Notifier;

/// Zoom level applied when centering on a record under edit.
pub const EDIT_ZOOM: u8 = 15;

/// Whether the session is creating a new record or editing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Create,
    Edit,
}

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Drafting(SessionMode),
    Committing,
}

/// Errors from create/update/delete transactions.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    InvalidDraft(#[from] DraftError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No geozone is being edited")]
    NotDrafting,
}

impl MutationError {
    /// Message surfaced to the operator, preferring server-provided text.
    pub fn user_message(&self) -> String {
        match self {
            MutationError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// The edit/create session state machine.
pub struct EditSession {
    api: Arc<dyn GeozoneApi>,
    surface: Arc<dyn MapSurface>,
    notifier: Arc<dyn Notifier>,
    phase: SessionPhase,
    draft: GeozoneDraft,
    selected: Option<Geozone>,
    overlay: Option<Box<dyn Overlay>>,
}

impl EditSession {
    pub fn new(
        api: Arc<dyn GeozoneApi>,
        surface: Arc<dyn MapSurface>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            surface,
            notifier,
            phase: SessionPhase::Idle,
            draft: GeozoneDraft::new(),
            selected: None,
            overlay: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> Option<SessionMode> {
        match self.phase {
            SessionPhase::Drafting(mode) => Some(mode),
            _ => None,
        }
    }

    pub fn draft(&self) -> &GeozoneDraft {
        &self.draft
    }

    /// Mutable access to the draft while a session is active.
    pub fn draft_mut(&mut self) -> Option<&mut GeozoneDraft> {
        match self.phase {
            SessionPhase::Drafting(_) => Some(&mut self.draft),
            _ => None,
        }
    }

    pub fn holds_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|r| r.id.as_str())
    }

    /// Enters `Drafting(Create)` with an empty form bound to the freshly
    /// drawn overlay. The form is seeded from the overlay's live geometry.
    pub fn begin_create(&mut self, overlay: Box<dyn Overlay>) {
        // A draft abandoned mid-flight still owns its shape; release it first.
        self.dispose_held_overlay();
        self.draft = GeozoneDraft::new();
        self.selected = None;

        match geometry_from_overlay(overlay.as_ref()) {
            Ok(geometry) => {
                if let Geometry::Circle { radius_meters, .. } = &geometry {
                    self.draft.radius = radius_meters.to_string();
                }
                self.draft.geometry = Some(geometry);
            }
            Err(err) => {
                debug!(error = %err, "Drawn overlay has no readable geometry yet");
            }
        }

        self.overlay = Some(overlay);
        self.phase = SessionPhase::Drafting(SessionMode::Create);
    }

    /// Enters `Drafting(Edit)` for an existing record: populates the form
    /// from its decoded geometry and fields and centers the viewport on its
    /// representative coordinate.
    ///
    /// On a decode failure the session is left untouched.
    pub fn begin_edit(&mut self, record: &Geozone) -> Result<(), DecodeError> {
        let draft = GeozoneDraft::from_record(record)?;
        self.dispose_held_overlay();

        if let Some(point) = draft
            .geometry
            .as_ref()
            .and_then(Geometry::representative_point)
        {
            self.surface.set_viewport(point, EDIT_ZOOM);
        }

        self.draft = draft;
        self.selected = Some(record.clone());
        self.phase = SessionPhase::Drafting(SessionMode::Edit);
        Ok(())
    }

    /// Seeds the draft's address fields from an autocomplete place
    /// selection, starting a create draft if none is active.
    pub fn seed_place(&mut self, formatted_address: &str) {
        if self.phase == SessionPhase::Idle {
            self.draft = GeozoneDraft::new();
            self.selected = None;
            self.phase = SessionPhase::Drafting(SessionMode::Create);
        }
        self.draft.address = formatted_address.to_string();
        self.draft.final_address = formatted_address.to_string();
    }

    /// Commits the draft: encodes its geometry and issues the create or
    /// update request for the current mode.
    ///
    /// On success the held overlay is disposed (the post-commit data refresh
    /// re-renders the record), the draft is cleared, and the session returns
    /// to idle. On failure the session stays in `Drafting` with the draft
    /// intact so the operator can retry without redrawing.
    pub async fn commit(&mut self) -> Result<MutationAck, MutationError> {
        let SessionPhase::Drafting(mode) = self.phase else {
            return Err(MutationError::NotDrafting);
        };
        if self.draft.is_empty() {
            let err = MutationError::InvalidDraft(DraftError::Empty);
            self.notifier.error(&err.user_message());
            return Err(err);
        }

        self.phase = SessionPhase::Committing;
        match self.perform_commit(mode).await {
            Ok(ack) => {
                self.dispose_held_overlay();
                self.draft = GeozoneDraft::new();
                self.selected = None;
                self.phase = SessionPhase::Idle;
                let message = ack
                    .message
                    .clone()
                    .unwrap_or_else(|| "Geozone saved".to_string());
                self.notifier.success(&message);
                Ok(ack)
            }
            Err(err) => {
                self.phase = SessionPhase::Drafting(mode);
                self.notifier.error(&err.user_message());
                Err(err)
            }
        }
    }

    /// Cancels the session from any drafting state, disposing the held
    /// overlay and clearing the draft.
    pub fn cancel(&mut self) {
        self.dispose_held_overlay();
        self.draft = GeozoneDraft::new();
        self.selected = None;
        self.phase = SessionPhase::Idle;
    }

    /// Issues the delete request for a record. The caller removes the
    /// record's overlay and refreshes the listing on success; on failure
    /// the record and its overlay remain untouched.
    pub async fn delete_record(&self, id: &str) -> Result<MutationAck, MutationError> {
        match self.api.delete(id).await {
            Ok(ack) => {
                let message = ack
                    .message
                    .clone()
                    .unwrap_or_else(|| "Geozone deleted".to_string());
                self.notifier.success(&message);
                Ok(ack)
            }
            Err(err) => {
                let err = MutationError::from(err);
                self.notifier.error(&err.user_message());
                Err(err)
            }
        }
    }

    /// Persists a new boundary for an existing record, as read off a
    /// dragged overlay.
    pub async fn update_shape(
        &self,
        id: &str,
        geometry: &Geometry,
    ) -> Result<MutationAck, MutationError> {
        let request = UpdateGeozoneRequest {
            geo_code_data: Some(GeoCodeData {
                geometry: geometry::encode(geometry),
            }),
            ..Default::default()
        };
        match self.api.update(id, &request).await {
            Ok(ack) => {
                let message = ack
                    .message
                    .clone()
                    .unwrap_or_else(|| "Geozone shape updated".to_string());
                self.notifier.success(&message);
                Ok(ack)
            }
            Err(err) => {
                let err = MutationError::from(err);
                self.notifier.error(&err.user_message());
                Err(err)
            }
        }
    }

    async fn perform_commit(&self, mode: SessionMode) -> Result<MutationAck, MutationError> {
        match mode {
            SessionMode::Create => {
                let request = self.draft.to_create_request()?;
                request
                    .validate()
                    .map_err(|e| MutationError::Validation(validation_message(&e)))?;
                Ok(self.api.create(&request).await?)
            }
            SessionMode::Edit => {
                let record = self.selected.as_ref().ok_or(MutationError::NotDrafting)?;
                let request = self.draft.to_update_request()?;
                request
                    .validate()
                    .map_err(|e| MutationError::Validation(validation_message(&e)))?;
                Ok(self.api.update(&record.id, &request).await?)
            }
        }
    }

    fn dispose_held_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            dispose_overlay(overlay.as_mut());
        }
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.dispose_held_overlay();
    }
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    let details: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect();

    if details.len() == 1 {
        details[0].clone()
    } else {
        format!("{} validation errors", details.len())
    }
}
