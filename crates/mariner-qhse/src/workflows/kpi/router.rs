use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::domain::{QuarterValue, SeedRequest};
use super::repository::{KpiRepository, KpiRepositoryError};
use super::service::{KpiError, KpiService};
use crate::envelope;

pub fn kpi_router<R>(service: Arc<KpiService<R>>) -> Router
where
    R: KpiRepository + 'static,
{
    Router::new()
        .route("/api/v1/kpi", get(years_handler::<R>))
        .route("/api/v1/kpi/:year", get(sheet_handler::<R>))
        .route("/api/v1/kpi/:year/seed", post(seed_handler::<R>))
        .route(
            "/api/v1/kpi/:year/indicators/:code/quarters/:quarter",
            put(quarter_handler::<R>),
        )
        .route("/api/v1/kpi/:year/export", get(export_handler::<R>))
        .with_state(service)
}

async fn years_handler<R>(State(service): State<Arc<KpiService<R>>>) -> Response
where
    R: KpiRepository + 'static,
{
    match service.years() {
        Ok(years) => envelope::success(StatusCode::OK, years),
        Err(err) => error_response(err),
    }
}

async fn sheet_handler<R>(
    State(service): State<Arc<KpiService<R>>>,
    year: Result<Path<i32>, PathRejection>,
) -> Response
where
    R: KpiRepository + 'static,
{
    let Path(year) = match year {
        Ok(year) => year,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.sheet(year) {
        Ok(sheet) => envelope::success(StatusCode::OK, sheet.view()),
        Err(err) => error_response(err),
    }
}

async fn seed_handler<R>(
    State(service): State<Arc<KpiService<R>>>,
    year: Result<Path<i32>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    R: KpiRepository + 'static,
{
    let Path(year) = match year {
        Ok(year) => year,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };
    // An empty body seeds the standard set without targets.
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SeedRequest::default()
    } else {
        match Json::<SeedRequest>::from_bytes(&body) {
            Ok(Json(request)) => request,
            Err(rejection) => {
                return envelope::failure(rejection.status(), rejection.body_text())
            }
        }
    };

    match service.seed(year, request) {
        Ok(sheet) => envelope::success(StatusCode::CREATED, sheet.view()),
        Err(err) => error_response(err),
    }
}

async fn quarter_handler<R>(
    State(service): State<Arc<KpiService<R>>>,
    path: Result<Path<(i32, String, u8)>, PathRejection>,
    payload: Result<Json<QuarterValue>, JsonRejection>,
) -> Response
where
    R: KpiRepository + 'static,
{
    let Path((year, code, quarter)) = match path {
        Ok(path) => path,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };
    let Json(body) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.record_quarter(year, &code, quarter, body.value) {
        Ok(sheet) => envelope::success(StatusCode::OK, sheet.view()),
        Err(err) => error_response(err),
    }
}

async fn export_handler<R>(
    State(service): State<Arc<KpiService<R>>>,
    year: Result<Path<i32>, PathRejection>,
) -> Response
where
    R: KpiRepository + 'static,
{
    let Path(year) = match year {
        Ok(year) => year,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.export_csv(year) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"kpi-{year}.csv\""),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: KpiError) -> Response {
    let status = match &err {
        KpiError::Validation(_) | KpiError::InvalidQuarter(_) => StatusCode::BAD_REQUEST,
        KpiError::NotSeeded(_)
        | KpiError::UnknownIndicator(_)
        | KpiError::Repository(KpiRepositoryError::NotFound) => StatusCode::NOT_FOUND,
        KpiError::AlreadySeeded(_) | KpiError::Repository(KpiRepositoryError::Conflict) => {
            StatusCode::CONFLICT
        }
        KpiError::Csv(_)
        | KpiError::Export(_)
        | KpiError::Repository(KpiRepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "kpi request failed");
    }
    envelope::failure(status, err.to_string())
}
