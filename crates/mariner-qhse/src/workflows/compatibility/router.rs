use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Response, routing::post};
use axum::{Json, Router};
use tracing::debug;

use super::{assess, CompatibilityRequest};
use crate::envelope;

pub fn compatibility_router() -> Router {
    Router::new().route("/api/v1/compatibility", post(compatibility_handler))
}

async fn compatibility_handler(
    payload: Result<Json<CompatibilityRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    let report = assess(&request);
    debug!(
        hose_length = ?report.hose_length,
        design_energy = ?report.design_energy,
        "compatibility assessed"
    );
    envelope::success(StatusCode::OK, report)
}
