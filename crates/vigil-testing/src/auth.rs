//! Mock auth helpers for integration tests.
//!
//! Services behind the gateway receive `x-vigil-user-id` + `x-vigil-user-role` headers
//! injected by the gateway. In tests, `MockAuth` produces these headers directly
//! so no real gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use vigil_auth_types::identity::{X_VIGIL_USER_ID, X_VIGIL_USER_ROLE};
use vigil_domain::user::CallerRole;

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: CallerRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: CallerRole) -> Self {
        Self { user_id, role }
    }

    pub fn admin() -> Self {
        Self::new(Uuid::new_v4(), CallerRole::Admin)
    }

    pub fn service() -> Self {
        Self::new(Uuid::new_v4(), CallerRole::Service)
    }

    /// Return headers as if the gateway injected them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(X_VIGIL_USER_ID),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(X_VIGIL_USER_ROLE),
            HeaderValue::from_str(&self.role.as_u8().to_string()).unwrap(),
        );
        map
    }
}
