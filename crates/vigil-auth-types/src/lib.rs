//! Identity types shared between the gateway and Vigil services.

pub mod identity;
