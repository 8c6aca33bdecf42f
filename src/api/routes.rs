use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analytics::GeoLocator;
use crate::storage::EventStore;

use super::handlers::{
    download_raw_log, health_check, ingest_event, list_events, preflight, AppState,
};

/// CORS for one endpoint: any origin, `method` plus OPTIONS, Content-Type
fn cors_for(method: Method) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([method, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn create_api_router(
    store: Arc<dyn EventStore>,
    geo: Option<Arc<dyn GeoLocator>>,
) -> Router {
    let state = Arc::new(AppState { store, geo });

    Router::new()
        .route(
            "/api/log",
            post(ingest_event)
                .options(preflight)
                .layer(cors_for(Method::POST)),
        )
        .route(
            "/logs",
            get(list_events)
                .options(preflight)
                .layer(cors_for(Method::GET)),
        )
        .route(
            "/api/logs/raw",
            get(download_raw_log)
                .options(preflight)
                .layer(cors_for(Method::GET)),
        )
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
