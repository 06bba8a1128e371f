use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::core::{AppConfig, AppState};

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    protocol_version: u16,
    system_roles: usize,
    locale: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        protocol_version: ensemble_protocol::PROTOCOL_VERSION,
        system_roles: state.system_role_count().await,
        locale: state.catalog().locale(),
    })
}

/// Build the axum router over a freshly seeded engine.
///
/// # Errors
/// Returns an error if the configuration is invalid.
pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let app_state = AppState::new(config)?;
    Ok(router_with_state(config, app_state))
}

/// Build the axum router over an existing engine state.
pub fn router_with_state(config: &AppConfig, app_state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::new(
                    request_id_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(PropagateRequestIdLayer::new(request_id_header))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                )),
        )
}
