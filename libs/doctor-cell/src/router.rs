// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Public read surface: the doctor directory.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .with_state(state)
}

/// Administrative availability-ledger surface. All routes authenticated; the
/// admin role is checked per handler.
pub fn admin_doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{doctor_id}/availability", put(handlers::set_availability))
        .route("/{doctor_id}/toggle-status", put(handlers::toggle_active))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
