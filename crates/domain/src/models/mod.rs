//! Domain models for the Geozone console.

pub mod draft;
pub mod geozone;
pub mod user;

pub use draft::{DraftError, GeozoneDraft};
pub use geozone::{
    CreateGeozoneRequest, GeoCodeData, Geozone, GeozonePage, UpdateGeozoneRequest,
};
pub use user::{User, UserPage, UserSearchRequest};
