use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};

use crate::workflows::documents::domain::{Attribution, DocumentId, DocumentRecord, NewDocument};
use crate::workflows::documents::form_code::SequenceKey;
use crate::workflows::documents::repository::{
    DocumentFilter, DocumentRepository, RepositoryError,
};
use crate::workflows::documents::storage::InMemoryObjectStore;
use crate::workflows::documents::upload::FileUpload;
use crate::workflows::documents::{
    document_router, DocumentKind, DocumentService, TransitionPolicy, WorkflowSettings,
};

pub(super) const BOUNDARY: &str = "mariner-test-boundary";

pub(super) type TestService = DocumentService<MemoryRepository, InMemoryObjectStore>;

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<DocumentId, DocumentRecord>>>,
    sequences: Arc<Mutex<BTreeMap<SequenceKey, u32>>>,
    documents: Arc<Mutex<u64>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl DocumentRepository for MemoryRepository {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: DocumentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(id))
    }

    fn mark_superseded(
        &self,
        id: &DocumentId,
        successor: &DocumentId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if record.superseded_by.is_some() {
            return Err(RepositoryError::Conflict);
        }
        record.superseded_by = Some(successor.clone());
        record.updated_at = at;
        Ok(())
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn next_sequence(&self, key: SequenceKey) -> Result<u32, RepositoryError> {
        let mut guard = self.sequences.lock().expect("sequence mutex poisoned");
        let next = guard.entry(key).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    fn next_document_number(&self) -> Result<u64, RepositoryError> {
        let mut guard = self.documents.lock().expect("document counter poisoned");
        *guard += 1;
        Ok(*guard)
    }
}

/// Accepts sequence allocation but refuses to persist anything.
pub(super) struct UnavailableRepository;

impl DocumentRepository for UnavailableRepository {
    fn insert(&self, _record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: DocumentRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_superseded(
        &self,
        _id: &DocumentId,
        _successor: &DocumentId,
        _at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn next_sequence(&self, _key: SequenceKey) -> Result<u32, RepositoryError> {
        Ok(1)
    }

    fn next_document_number(&self) -> Result<u64, RepositoryError> {
        Ok(1)
    }
}

/// Loses every supersession race: another writer always linked the revision first.
#[derive(Default, Clone)]
pub(super) struct OutpacedRepository {
    pub(super) inner: MemoryRepository,
}

impl DocumentRepository for OutpacedRepository {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: DocumentRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn remove(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError> {
        self.inner.remove(id)
    }

    fn mark_superseded(
        &self,
        _id: &DocumentId,
        _successor: &DocumentId,
        _at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RepositoryError> {
        self.inner.list(filter)
    }

    fn next_sequence(&self, key: SequenceKey) -> Result<u32, RepositoryError> {
        self.inner.next_sequence(key)
    }

    fn next_document_number(&self) -> Result<u64, RepositoryError> {
        self.inner.next_document_number()
    }
}

pub(super) fn build_service() -> (TestService, MemoryRepository, InMemoryObjectStore) {
    build_service_with(TransitionPolicy::Strict)
}

pub(super) fn build_service_with(
    policy: TransitionPolicy,
) -> (TestService, MemoryRepository, InMemoryObjectStore) {
    let repository = MemoryRepository::default();
    let store = InMemoryObjectStore::default();
    let service = DocumentService::with_settings(
        Arc::new(repository.clone()),
        Arc::new(store.clone()),
        WorkflowSettings {
            transition_policy: policy,
            ..WorkflowSettings::default()
        },
    );
    (service, repository, store)
}

pub(super) fn drill_plan(year: i32) -> NewDocument {
    let mut details = Map::new();
    details.insert("vessel".to_string(), json!("MT Aurora"));
    details.insert("drill_type".to_string(), json!("Abandon ship"));

    NewDocument {
        kind: DocumentKind::DrillPlan,
        year,
        title: format!("{year} drill plan"),
        uploaded_by: Attribution::named("Chief Officer Lindqvist"),
        as_draft: false,
        details,
        effective_date: None,
        due_date: None,
        planned_date: NaiveDate::from_ymd_opt(year, 3, 15),
    }
}

pub(super) fn near_miss(year: i32) -> NewDocument {
    NewDocument {
        kind: DocumentKind::NearMissReport,
        title: "Gangway net missing at pilot ladder".to_string(),
        as_draft: false,
        planned_date: None,
        ..drill_plan(year)
    }
}

pub(super) fn audit(year: i32) -> NewDocument {
    NewDocument {
        kind: DocumentKind::InternalAudit,
        title: format!("{year} internal audit"),
        ..drill_plan(year)
    }
}

pub(super) fn pdf(name: &str) -> FileUpload {
    FileUpload::new(name, b"%PDF-1.7 sample".to_vec())
}

pub(super) fn multipart_body(metadata: &Value, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn multipart_request(uri: &str, body: Vec<u8>) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .expect("request builds")
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    payload: &Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn assert_failure(response: Response, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    payload["error"].as_str().unwrap_or_default().to_string()
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    document_router(Arc::new(service))
}
