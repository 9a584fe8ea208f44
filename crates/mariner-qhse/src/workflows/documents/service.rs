use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::catalog::DocumentKind;
use super::domain::{
    validate_attribution, validate_year, Attachment, DocumentId, DocumentPatch, DocumentRecord,
    NewDocument, RevisionRequest, StatusRequest,
};
use super::form_code::{FormCode, SequenceKey};
use super::repository::{DocumentFilter, DocumentRepository, RepositoryError};
use super::revision::Revision;
use super::status::{ApprovalStatus, TransitionError, TransitionPolicy};
use super::storage::{storage_key, ObjectStore, StorageError};
use super::upload::{FileUpload, UploadError, UploadPolicy};

pub const DEFAULT_UPLOAD_CEILING: u64 = 25 * 1024 * 1024;

/// Service-wide workflow knobs, usually sourced from `AppConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub transition_policy: TransitionPolicy,
    pub upload_ceiling: u64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Strict,
            upload_ceiling: DEFAULT_UPLOAD_CEILING,
        }
    }
}

/// Service composing the repository, object store, and approval rules for every document kind.
pub struct DocumentService<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
    settings: WorkflowSettings,
}

impl<R, S> DocumentService<R, S>
where
    R: DocumentRepository + 'static,
    S: ObjectStore + 'static,
{
    pub fn new(repository: Arc<R>, store: Arc<S>) -> Self {
        Self::with_settings(repository, store, WorkflowSettings::default())
    }

    pub fn with_settings(repository: Arc<R>, store: Arc<S>, settings: WorkflowSettings) -> Self {
        Self {
            repository,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.settings
    }

    pub fn upload_policy(&self, kind: DocumentKind) -> UploadPolicy {
        kind.spec()
            .upload_policy()
            .with_ceiling(self.settings.upload_ceiling)
    }

    fn next_document_id(&self) -> Result<DocumentId, RepositoryError> {
        let number = self.repository.next_document_number()?;
        Ok(DocumentId(format!("doc-{number:06}")))
    }

    /// Register a new document, storing the optional attachment first.
    pub fn create(
        &self,
        request: NewDocument,
        file: Option<FileUpload>,
    ) -> Result<DocumentRecord, DocumentServiceError> {
        validate_year(request.year).map_err(DocumentServiceError::Validation)?;
        validate_attribution("uploader", &request.uploaded_by)
            .map_err(DocumentServiceError::Validation)?;
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(DocumentServiceError::Validation(
                "title is required".to_string(),
            ));
        }
        if let Some(file) = &file {
            self.upload_policy(request.kind).validate(file)?;
        }

        let id = self.next_document_id()?;
        let sequence = self
            .repository
            .next_sequence(SequenceKey::for_document(request.kind, request.year))?;
        let form_code = FormCode::compose(request.kind, request.year, sequence);

        let attachments = match &file {
            Some(file) => vec![self.store_upload(request.kind, &id, file)?],
            None => Vec::new(),
        };

        let now = Utc::now();
        let record = DocumentRecord {
            id,
            kind: request.kind,
            form_code,
            revision: Revision::INITIAL,
            year: request.year,
            title,
            status: request.kind.spec().initial_status(request.as_draft),
            rejection_reason: None,
            uploaded_by: request.uploaded_by,
            reviewed_by: None,
            attachments,
            details: request.details,
            effective_date: request.effective_date,
            due_date: request.due_date,
            planned_date: request.planned_date,
            created_at: now,
            updated_at: now,
            supersedes: None,
            superseded_by: None,
        };

        let pending_objects = record.attachments.clone();
        match self.repository.insert(record) {
            Ok(stored) => {
                info!(
                    document_id = %stored.id,
                    form_code = %stored.form_code,
                    kind = stored.kind.slug(),
                    "document registered"
                );
                Ok(stored)
            }
            Err(err) => {
                self.discard(&pending_objects);
                Err(err.into())
            }
        }
    }

    pub fn get(&self, id: &DocumentId) -> Result<DocumentRecord, DocumentServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| DocumentServiceError::NotFound(id.clone()))
    }

    /// Matching documents ordered by registration time, then numerically by id.
    pub fn list(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<DocumentRecord>, DocumentServiceError> {
        let mut records = self.repository.list(filter)?;
        records.retain(|record| filter.matches(record));
        records.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.0.len().cmp(&right.id.0.len()))
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    pub fn review_queue(
        &self,
        kind: Option<DocumentKind>,
    ) -> Result<Vec<DocumentRecord>, DocumentServiceError> {
        self.list(&DocumentFilter::review_queue(kind))
    }

    /// Edit metadata in place; attachments and revision are untouched.
    pub fn update_metadata(
        &self,
        id: &DocumentId,
        patch: DocumentPatch,
    ) -> Result<DocumentRecord, DocumentServiceError> {
        let mut record = self.current(id)?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DocumentServiceError::Validation(
                    "title is required".to_string(),
                ));
            }
            record.title = title;
        }
        if let Some(details) = patch.details {
            for (key, value) in details {
                if value.is_null() {
                    record.details.remove(&key);
                } else {
                    record.details.insert(key, value);
                }
            }
        }
        if let Some(effective_date) = patch.effective_date {
            record.effective_date = effective_date;
        }
        if let Some(due_date) = patch.due_date {
            record.due_date = due_date;
        }
        if let Some(planned_date) = patch.planned_date {
            record.planned_date = planned_date;
        }
        record.updated_at = Utc::now();

        self.repository.update(record.clone())?;
        Ok(record)
    }

    /// Apply a reviewer's status change. Requesting the current status changes nothing.
    pub fn transition(
        &self,
        id: &DocumentId,
        request: StatusRequest,
    ) -> Result<DocumentRecord, DocumentServiceError> {
        let mut record = self.current(id)?;
        let from = record.status;
        let to = request.status;
        let reviewer = request.reviewed_by.as_ref().map(|who| who.name.as_str());

        let changed = self
            .settings
            .transition_policy
            .check(record.kind, from, to, reviewer)?;
        if !changed {
            return Ok(record);
        }

        record.status = to;
        record.reviewed_by = if to.is_decision() {
            request.reviewed_by
        } else {
            None
        };
        record.rejection_reason = if to == ApprovalStatus::Rejected {
            request
                .reason
                .map(|reason| reason.trim().to_string())
                .filter(|reason| !reason.is_empty())
        } else {
            None
        };
        record.updated_at = Utc::now();

        self.repository.update(record.clone())?;
        info!(
            document_id = %record.id,
            from = from.label(),
            to = to.label(),
            "document status changed"
        );
        Ok(record)
    }

    /// Replace (or add) an attachment by creating the next revision of the document.
    ///
    /// The new record carries the form code, details, and dates forward; attachments from other
    /// sections are kept, the one in the uploaded section is replaced. The superseded revision is
    /// retained.
    pub fn reupload(
        &self,
        id: &DocumentId,
        request: RevisionRequest,
        file: FileUpload,
    ) -> Result<DocumentRecord, DocumentServiceError> {
        validate_attribution("uploader", &request.uploaded_by)
            .map_err(DocumentServiceError::Validation)?;
        let previous = self.current(id)?;
        if let Some(expected) = request.expected_revision {
            if expected != previous.revision {
                return Err(DocumentServiceError::StaleRevision {
                    expected,
                    current: previous.revision,
                });
            }
        }
        let spec = previous.kind.spec();
        let status = spec.initial_status(previous.status == ApprovalStatus::Draft);
        if self.settings.transition_policy == TransitionPolicy::Strict
            && previous.status == ApprovalStatus::Rejected
            && !spec.allows_resubmission
        {
            return Err(TransitionError::NotAllowed {
                from: previous.status.label(),
                to: status.label(),
            }
            .into());
        }
        self.upload_policy(previous.kind).validate(&file)?;

        let new_id = self.next_document_id()?;
        let attachment = self.store_upload(previous.kind, &new_id, &file)?;
        let mut attachments: Vec<Attachment> = previous
            .attachments
            .iter()
            .filter(|existing| existing.section != attachment.section)
            .cloned()
            .collect();
        attachments.push(attachment.clone());

        let now = Utc::now();
        let record = DocumentRecord {
            id: new_id.clone(),
            kind: previous.kind,
            form_code: previous.form_code.clone(),
            revision: previous.revision.next(),
            year: previous.year,
            title: previous.title.clone(),
            status,
            rejection_reason: None,
            uploaded_by: request.uploaded_by,
            reviewed_by: None,
            attachments,
            details: previous.details.clone(),
            effective_date: previous.effective_date,
            due_date: previous.due_date,
            planned_date: previous.planned_date,
            created_at: now,
            updated_at: now,
            supersedes: Some(previous.id.clone()),
            superseded_by: None,
        };

        let stored = match self.repository.insert(record) {
            Ok(stored) => stored,
            Err(err) => {
                self.discard(std::slice::from_ref(&attachment));
                return Err(err.into());
            }
        };

        if let Err(err) = self.repository.mark_superseded(&previous.id, &new_id, now) {
            if let Err(cleanup) = self.repository.remove(&new_id) {
                warn!(document_id = %new_id, error = %cleanup, "failed to roll back revision");
            }
            self.discard(std::slice::from_ref(&attachment));
            return Err(match err {
                RepositoryError::Conflict => DocumentServiceError::Superseded(previous.id),
                other => other.into(),
            });
        }

        info!(
            document_id = %stored.id,
            supersedes = %previous.id,
            form_code = %stored.form_code,
            revision = %stored.revision,
            "document revised"
        );
        Ok(stored)
    }

    /// Every revision of the document containing `id`, oldest first.
    pub fn revisions(&self, id: &DocumentId) -> Result<Vec<DocumentRecord>, DocumentServiceError> {
        let record = self.get(id)?;
        let mut seen = HashSet::from([record.id.clone()]);
        let mut older = Vec::new();
        let mut cursor = record.supersedes.clone();
        while let Some(previous_id) = cursor {
            if !seen.insert(previous_id.clone()) {
                break;
            }
            match self.repository.fetch(&previous_id)? {
                Some(previous) => {
                    cursor = previous.supersedes.clone();
                    older.push(previous);
                }
                None => break,
            }
        }

        older.reverse();
        let mut chain = older;
        let mut cursor = record.superseded_by.clone();
        chain.push(record);
        while let Some(next_id) = cursor {
            if !seen.insert(next_id.clone()) {
                break;
            }
            match self.repository.fetch(&next_id)? {
                Some(next) => {
                    cursor = next.superseded_by.clone();
                    chain.push(next);
                }
                None => break,
            }
        }

        Ok(chain)
    }

    /// Fetch an attachment's bytes; without a section the main attachment is returned.
    pub fn download(
        &self,
        id: &DocumentId,
        section: Option<&str>,
    ) -> Result<(Attachment, Vec<u8>), DocumentServiceError> {
        let record = self.get(id)?;
        let attachment = record.attachment(section).cloned().ok_or_else(|| {
            DocumentServiceError::MissingAttachment {
                id: id.clone(),
                section: section.unwrap_or("main").to_string(),
            }
        })?;
        let bytes = self.store.get(&attachment.storage_key)?.ok_or_else(|| {
            DocumentServiceError::MissingObject(attachment.storage_key.clone())
        })?;
        Ok((attachment, bytes))
    }

    /// Remove every revision of the document together with its stored files.
    pub fn delete(&self, id: &DocumentId) -> Result<Vec<DocumentRecord>, DocumentServiceError> {
        let chain = self.revisions(id)?;
        let mut removed = Vec::with_capacity(chain.len());
        for record in &chain {
            if let Some(record) = self.repository.remove(&record.id)? {
                removed.push(record);
            }
        }

        let keys: BTreeSet<&str> = chain
            .iter()
            .flat_map(|record| record.attachments.iter())
            .map(|attachment| attachment.storage_key.as_str())
            .collect();
        for key in keys {
            if let Err(err) = self.store.delete(key) {
                warn!(storage_key = key, error = %err, "failed to delete stored object");
            }
        }

        info!(document_id = %id, revisions = removed.len(), "document deleted");
        Ok(removed)
    }

    fn current(&self, id: &DocumentId) -> Result<DocumentRecord, DocumentServiceError> {
        let record = self.get(id)?;
        if record.is_current() {
            Ok(record)
        } else {
            Err(DocumentServiceError::Superseded(record.id))
        }
    }

    fn store_upload(
        &self,
        kind: DocumentKind,
        id: &DocumentId,
        file: &FileUpload,
    ) -> Result<Attachment, StorageError> {
        let section = file.section().map(str::to_string);
        let key = storage_key(kind, id, section.as_deref(), file.file_name(), Utc::now());
        self.store.put(&key, &file.bytes)?;
        Ok(Attachment {
            section,
            storage_key: key,
            original_name: file.file_name().to_string(),
            content_type: file.content_type(),
            size_bytes: file.size(),
        })
    }

    fn discard(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(err) = self.store.delete(&attachment.storage_key) {
                warn!(
                    storage_key = %attachment.storage_key,
                    error = %err,
                    "failed to discard stored object"
                );
            }
        }
    }
}

/// Error raised by the document service.
#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("document {0} not found")]
    NotFound(DocumentId),
    #[error("document {0} has been superseded by a newer revision")]
    Superseded(DocumentId),
    #[error("revision {expected} is stale; the document is at revision {current}")]
    StaleRevision {
        expected: Revision,
        current: Revision,
    },
    #[error("document {id} has no attachment in section '{section}'")]
    MissingAttachment { id: DocumentId, section: String },
    #[error("stored file '{0}' is missing")]
    MissingObject(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
