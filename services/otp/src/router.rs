use axum::{
    Router,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use vigil_core::health::healthz;
use vigil_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    admin::{purge_user_otps, sweep_otps},
    health::readyz,
    otp::{issue_otp, verify_otp},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Lifecycle
        .route("/otp/codes", post(issue_otp))
        .route("/otp/verifications", post(verify_otp))
        // Admin
        .route("/otp/sweeps", post(sweep_otps))
        .route("/otp/users/{user_id}", delete(purge_user_otps))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
