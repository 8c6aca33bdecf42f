use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::analytics::{resolve_client_ip, GeoLocator, UNKNOWN_IP};
use crate::models::EventRecord;
use crate::storage::EventStore;

pub struct AppState {
    pub store: Arc<dyn EventStore>,
    /// None when geolocation is switched off
    pub geo: Option<Arc<dyn GeoLocator>>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Socket peer address, if the server was started with connect info
pub struct PeerAddr(pub Option<String>);

impl<S> FromRequestParts<S> for PeerAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string());
        Ok(PeerAddr(addr))
    }
}

/// Current UTC time as RFC 3339 with second precision, e.g. `2024-05-01T10:00:00Z`
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Record a click/visit event
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let mut record = EventRecord::from_body(&body).map_err(|e| {
        debug!(error = %e, "rejecting malformed event payload");
        api_error(StatusCode::BAD_REQUEST, "Invalid JSON")
    })?;

    if record.timestamp.is_empty() {
        record.timestamp = now_timestamp();
    }

    let client_ip = resolve_client_ip(&headers, peer.as_deref());
    if client_ip != UNKNOWN_IP {
        record.ip_address = client_ip;
    }

    if record.has_known_ip() {
        if let Some(geo) = &state.geo {
            match geo.locate(&record.ip_address).await {
                Ok(info) => record.merge_geo(&info),
                Err(e) => {
                    warn!(ip = %record.ip_address, error = %e, "failed to get geo info");
                }
            }
        }
    }

    if let Err(e) = state.store.append(&record).await {
        error!(error = %e, "failed to save event");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save log",
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse {
            status: "ok".to_string(),
        }),
    ))
}

/// Return every recorded event
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EventRecord>>, ApiError> {
    match state.store.read_all().await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            error!(error = %e, "failed to read events");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read logs",
            ))
        }
    }
}

/// Download the event log file as stored
pub async fn download_raw_log(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match state.store.read_raw().await {
        Ok(Some(contents)) => Ok((
            [
                (header::CONTENT_TYPE, "application/x-ndjson"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"logs.json\"",
                ),
            ],
            contents,
        )
            .into_response()),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Log file not found")),
        Err(e) => {
            error!(error = %e, "failed to read raw event log");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read logs",
            ))
        }
    }
}

/// CORS preflight: 200 with an empty body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Health check endpoint
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}
