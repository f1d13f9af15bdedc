//! REST collaborator for the Geozone console.
//!
//! This crate owns everything that talks to the geofence backend and the
//! user directory service:
//! - [`api::GeozoneApi`] / [`api::UserApi`] traits the engine depends on
//! - HTTP implementations over `reqwest`
//! - An in-memory implementation for tests and offline runs

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use api::{GeozoneApi, MutationAck, UserApi};
pub use config::BackendConfig;
pub use error::ApiError;
pub use http::{HttpGeozoneClient, HttpUserClient};
pub use mock::{InMemoryGeozoneApi, StaticUserApi};
