//! Geozone console engine.
//!
//! Keeps three things mutually consistent against a remote geofence backend:
//! the paginated/searchable record listing, the live interactive map
//! overlays, and the edit/create form bound to the overlay being drawn or
//! modified.

pub mod config;
pub mod controller;
pub mod fetch;
pub mod logging;
pub mod map;
pub mod notify;
pub mod session;

pub use controller::{GeozoneController, OverlayPresenter};
pub use fetch::{FetchError, FetchOrchestrator, FetchPhase, RecordsObserver};
pub use notify::{Notifier, TracingNotifier};
pub use session::{EditSession, MutationError, SessionMode, SessionPhase};
