//! Domain layer for the Geozone console.
//!
//! This crate contains:
//! - Domain models (Geozone, User, GeozoneDraft)
//! - The normalized [`geometry::Geometry`] shape descriptor
//! - The geometry codec for the backend's heterogeneous encodings

pub mod geometry;
pub mod models;
