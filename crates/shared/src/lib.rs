//! Shared utilities and common types for the Geozone console.
//!
//! This crate provides common functionality used across all other crates:
//! - Pagination and search-query state
//! - Common coordinate validation logic

pub mod pagination;
pub mod validation;
