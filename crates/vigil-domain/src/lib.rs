//! Domain types shared across Vigil services.
//!
//! This crate contains only pure types with no framework dependencies.

pub mod id;
pub mod purpose;
pub mod user;
