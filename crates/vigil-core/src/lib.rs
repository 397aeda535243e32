//! Cross-cutting plumbing shared by Vigil services: env config helpers,
//! tracing setup, health probes, and HTTP middleware.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
