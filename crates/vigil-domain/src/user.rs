//! Caller roles as asserted by the gateway.

use serde::{Deserialize, Serialize};

/// Privilege level of the caller.
///
/// Wire format: `u8` (0 = Service, 1 = Operator, 2 = Admin).
/// Sweep and purge endpoints require `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Service = 0,
    Operator = 1,
    Admin = 2,
}

impl CallerRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Service),
            1 => Some(Self::Operator),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl PartialOrd for CallerRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CallerRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_u8().cmp(&other.as_u8())
    }
}
