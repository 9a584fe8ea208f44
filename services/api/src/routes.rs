use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use mariner_qhse::workflows::compatibility::compatibility_router;
use mariner_qhse::workflows::documents::{
    document_router, DocumentRepository, DocumentService, ObjectStore,
};
use mariner_qhse::workflows::kpi::{kpi_router, KpiRepository, KpiService};
use serde_json::json;
use std::sync::Arc;

/// Every workflow router plus the operational endpoints.
pub(crate) fn application_routes<R, S, K>(
    documents: Arc<DocumentService<R, S>>,
    kpi: Arc<KpiService<K>>,
) -> Router
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
    K: KpiRepository + 'static,
{
    document_router(documents)
        .merge(kpi_router(kpi))
        .merge(compatibility_router())
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
