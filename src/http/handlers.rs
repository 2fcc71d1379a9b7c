//! Registry endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::http::response::{
    ApiError, DiscoverResponse, HealthResponse, ListResponse, MessageResponse, RegisterResponse,
    SERVICE_NAME,
};
use crate::http::server::AppState;
use crate::registry::Registration;

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(registration) = payload?;
    let record = state.registry.register(&registration)?;

    Ok(Json(RegisterResponse {
        success: true,
        message: format!("Service '{}' registered successfully", record.name),
        service_id: record.id,
    }))
}

/// `POST /heartbeat/{id}`
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.registry.heartbeat(&id)?;
    Ok(Json(MessageResponse::ok("Heartbeat received")))
}

/// `DELETE /deregister/{id}`
pub async fn deregister(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.registry.deregister(&id)?;
    Ok(Json(MessageResponse::ok("Service deregistered")))
}

/// `GET /discover/{name}`
pub async fn discover(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    let instance = state.registry.discover(&name)?;
    Ok(Json(instance.into()))
}

/// `GET /services`
pub async fn list_services(State(state): State<AppState>) -> Json<ListResponse> {
    let services = state.registry.list();
    Json(ListResponse {
        success: true,
        count: services.len(),
        services,
    })
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        registered_services: state.registry.count(),
    })
}
