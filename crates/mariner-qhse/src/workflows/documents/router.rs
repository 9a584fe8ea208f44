use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::catalog::{catalog, DocumentKind};
use super::domain::{
    DocumentId, DocumentPatch, DocumentRecord, DocumentView, NewDocument, RevisionRequest,
    StatusRequest,
};
use super::form_code::FormCode;
use super::repository::{DocumentFilter, DocumentRepository, ListQuery, RepositoryError};
use super::service::{DocumentService, DocumentServiceError};
use super::status::TransitionPolicy;
use super::storage::{ObjectStore, StorageError};
use super::upload::FileUpload;
use crate::envelope;

/// Room for multipart boundaries and the metadata part on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Router builder exposing the document register, review queue, and file endpoints.
pub fn document_router<R, S>(service: Arc<DocumentService<R, S>>) -> Router
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let body_limit = service
        .settings()
        .upload_ceiling
        .saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/v1/document-kinds", get(kinds_handler))
        .route(
            "/api/v1/documents",
            get(list_handler::<R, S>).post(create_handler::<R, S>),
        )
        .route(
            "/api/v1/documents/:document_id",
            get(detail_handler::<R, S>)
                .patch(update_handler::<R, S>)
                .delete(delete_handler::<R, S>),
        )
        .route(
            "/api/v1/documents/:document_id/status",
            axum::routing::patch(status_handler::<R, S>),
        )
        .route(
            "/api/v1/documents/:document_id/revisions",
            get(revisions_handler::<R, S>).post(reupload_handler::<R, S>),
        )
        .route(
            "/api/v1/documents/:document_id/download",
            get(download_handler::<R, S>),
        )
        .route("/api/v1/review-queue", get(review_queue_handler::<R, S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DownloadQuery {
    #[serde(default)]
    section: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueQuery {
    #[serde(default)]
    kind: Option<DocumentKind>,
}

#[derive(Debug, Serialize)]
struct DeletionSummary {
    form_code: Option<FormCode>,
    deleted: Vec<DocumentId>,
}

pub(crate) async fn kinds_handler() -> Response {
    envelope::success(StatusCode::OK, catalog())
}

pub(crate) async fn list_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.list(&DocumentFilter::from(query)) {
        Ok(records) => envelope::success(StatusCode::OK, views(&records, policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };
    let (request, file) = match read_form::<NewDocument>(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    match service.create(request, file) {
        Ok(record) => envelope::success(StatusCode::CREATED, record.view(policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.get(&DocumentId(document_id)) {
        Ok(record) => envelope::success(StatusCode::OK, record.view(policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
    payload: Result<Json<DocumentPatch>, JsonRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let Json(patch) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.update_metadata(&DocumentId(document_id), patch) {
        Ok(record) => envelope::success(StatusCode::OK, record.view(policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.delete(&DocumentId(document_id)) {
        Ok(removed) => {
            let summary = DeletionSummary {
                form_code: removed.first().map(|record| record.form_code.clone()),
                deleted: removed.into_iter().map(|record| record.id).collect(),
            };
            envelope::success(StatusCode::OK, summary)
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.transition(&DocumentId(document_id), request) {
        Ok(record) => envelope::success(StatusCode::OK, record.view(policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reupload_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };
    let (request, file) = match read_form::<RevisionRequest>(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = file else {
        return envelope::failure(StatusCode::BAD_REQUEST, "missing 'file' form field");
    };

    match service.reupload(&DocumentId(document_id), request, file) {
        Ok(record) => envelope::success(StatusCode::CREATED, record.view(policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn revisions_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    match service.revisions(&DocumentId(document_id)) {
        Ok(records) => envelope::success(StatusCode::OK, views(&records, policy_of(&service))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn download_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    Path(document_id): Path<String>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.download(&DocumentId(document_id), query.section.as_deref()) {
        Ok((attachment, bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, attachment.content_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(&attachment.original_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn review_queue_handler<R, S>(
    State(service): State<Arc<DocumentService<R, S>>>,
    query: Result<Query<QueueQuery>, QueryRejection>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return envelope::failure(rejection.status(), rejection.body_text()),
    };

    match service.review_queue(query.kind) {
        Ok(records) => envelope::success(StatusCode::OK, views(&records, policy_of(&service))),
        Err(err) => error_response(err),
    }
}

fn policy_of<R, S>(service: &DocumentService<R, S>) -> TransitionPolicy
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    service.settings().transition_policy
}

fn views(records: &[DocumentRecord], policy: TransitionPolicy) -> Vec<DocumentView> {
    records.iter().map(|record| record.view(policy)).collect()
}

/// Map service failures onto status codes: 400 for bad input, 404 for missing records or files,
/// 409 for revision and storage-key conflicts, 500 for everything else.
pub(crate) fn error_response(err: DocumentServiceError) -> Response {
    let status = match &err {
        DocumentServiceError::Validation(_)
        | DocumentServiceError::Upload(_)
        | DocumentServiceError::Transition(_) => StatusCode::BAD_REQUEST,
        DocumentServiceError::NotFound(_)
        | DocumentServiceError::MissingAttachment { .. }
        | DocumentServiceError::MissingObject(_)
        | DocumentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DocumentServiceError::Superseded(_)
        | DocumentServiceError::StaleRevision { .. }
        | DocumentServiceError::Repository(RepositoryError::Conflict)
        | DocumentServiceError::Storage(StorageError::AlreadyExists(_)) => StatusCode::CONFLICT,
        DocumentServiceError::Repository(RepositoryError::Unavailable(_))
        | DocumentServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "document request failed");
    }
    envelope::failure(status, err.to_string())
}

/// Collect the `metadata` JSON part, the optional `file` part, and an optional `section` part.
async fn read_form<M: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<(M, Option<FileUpload>), Response> {
    let mut metadata = None;
    let mut file = None;
    let mut section = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "metadata" => {
                let text = field.text().await.map_err(multipart_failure)?;
                let parsed = serde_json::from_str::<M>(&text).map_err(|err| {
                    envelope::failure(StatusCode::BAD_REQUEST, format!("invalid metadata: {err}"))
                })?;
                metadata = Some(parsed);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_failure)?;
                file = Some(FileUpload {
                    file_name,
                    content_type,
                    section: None,
                    bytes: bytes.to_vec(),
                });
            }
            "section" => section = Some(field.text().await.map_err(multipart_failure)?),
            _ => {}
        }
    }

    let metadata = metadata.ok_or_else(|| {
        envelope::failure(StatusCode::BAD_REQUEST, "missing 'metadata' form field")
    })?;
    let file = file.map(|mut upload| {
        upload.section = section;
        upload
    });
    Ok((metadata, file))
}

fn multipart_failure(err: MultipartError) -> Response {
    envelope::failure(err.status(), err.body_text())
}

fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii() && !ch.is_ascii_control() && ch != '"' && ch != '\\' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
