//! Test utilities for Vigil services.
//!
//! Provides `MockAuth` for gateway identity headers and `TestApp` for driving a
//! router in-process. Use from dev-dependencies only.

pub mod app;
pub mod auth;
