use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::catalog::DocumentKind;
use super::domain::{DocumentId, DocumentRecord};
use super::form_code::SequenceKey;
use super::status::ApprovalStatus;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait DocumentRepository: Send + Sync {
    fn insert(&self, record: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;
    fn update(&self, record: DocumentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError>;
    fn remove(&self, id: &DocumentId) -> Result<Option<DocumentRecord>, RepositoryError>;
    /// Link `id` to its successor. Fails with `Conflict` when `id` already has one, so two
    /// racing re-uploads cannot both extend the same revision.
    fn mark_superseded(
        &self,
        id: &DocumentId,
        successor: &DocumentId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RepositoryError>;
    /// Allocate the next form-code sequence number (starting at 1) for the key.
    fn next_sequence(&self, key: SequenceKey) -> Result<u32, RepositoryError>;
    /// Allocate the next document number (starting at 1). Numbers are never handed out twice.
    fn next_document_number(&self) -> Result<u64, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Query parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub kind: Option<DocumentKind>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "filter")]
    pub status: Option<ApprovalStatus>,
    #[serde(default)]
    pub include_superseded: bool,
}

/// Selection criteria applied by repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub kind: Option<DocumentKind>,
    pub year: Option<i32>,
    /// Empty means any status.
    pub statuses: Vec<ApprovalStatus>,
    pub include_superseded: bool,
}

impl DocumentFilter {
    /// Current revisions waiting on a reviewer.
    pub fn review_queue(kind: Option<DocumentKind>) -> Self {
        Self {
            kind,
            year: None,
            statuses: vec![ApprovalStatus::Pending, ApprovalStatus::UnderReview],
            include_superseded: false,
        }
    }

    pub fn matches(&self, record: &DocumentRecord) -> bool {
        self.kind.map_or(true, |kind| record.kind == kind)
            && self.year.map_or(true, |year| record.year == year)
            && (self.statuses.is_empty() || self.statuses.contains(&record.status))
            && (self.include_superseded || record.is_current())
    }
}

impl From<ListQuery> for DocumentFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            kind: query.kind,
            year: query.year,
            statuses: query.status.into_iter().collect(),
            include_superseded: query.include_superseded,
        }
    }
}
